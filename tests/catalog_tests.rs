// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketledger::core::catalog::{self, CategoryTree, NewCategory, DEFAULT_CATEGORIES};
use pocketledger::errors::LedgerError;
use pocketledger::models::CategoryKind;
use rusqlite::{params, Connection};

fn setup() -> (Connection, i64) {
    let conn = Connection::open_in_memory().unwrap();
    pocketledger::db::init_schema(&conn).unwrap();
    conn.execute("INSERT INTO owners(name) VALUES('alice')", [])
        .unwrap();
    let owner_id = conn.last_insert_rowid();
    (conn, owner_id)
}

fn new_cat(name: &str, kind: CategoryKind, parent_id: Option<i64>) -> NewCategory {
    NewCategory {
        name: name.into(),
        kind,
        icon: None,
        color: None,
        parent_id,
    }
}

#[test]
fn provisioning_creates_the_whole_seed_tree() {
    let (conn, owner) = setup();
    catalog::provision_defaults(&conn, owner).unwrap();

    let expected: usize = DEFAULT_CATEGORIES
        .iter()
        .map(|s| 1 + s.children.len())
        .sum();
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM categories WHERE owner_id=?1",
            params![owner],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(count as usize, expected);

    // Children point at their seeded parent.
    let tree = CategoryTree::load(&conn, owner).unwrap();
    let transport: i64 = conn
        .query_row(
            "SELECT id FROM categories WHERE owner_id=?1 AND name='Transport'",
            params![owner],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(tree.descendants(transport).len(), 5);
}

#[test]
fn child_kind_must_match_parent_kind() {
    let (conn, owner) = setup();
    let food = catalog::create_category(&conn, owner, &new_cat("Food", CategoryKind::Expense, None))
        .unwrap();
    let err = catalog::create_category(
        &conn,
        owner,
        &new_cat("Refund", CategoryKind::Income, Some(food.id)),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));
}

#[test]
fn missing_parent_is_not_found() {
    let (conn, owner) = setup();
    let err = catalog::create_category(
        &conn,
        owner,
        &new_cat("Food", CategoryKind::Expense, Some(404)),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[test]
fn deleting_a_category_orphans_children_and_unlinks_rows() {
    let (conn, owner) = setup();
    conn.execute(
        "INSERT INTO accounts(owner_id, name, type, balance, opening_balance, currency)
         VALUES (?1, 'Main', 'checking', '0', '0', 'USD')",
        params![owner],
    )
    .unwrap();
    let acct = conn.last_insert_rowid();

    let food =
        catalog::create_category(&conn, owner, &new_cat("Food", CategoryKind::Expense, None))
            .unwrap();
    let groceries = catalog::create_category(
        &conn,
        owner,
        &new_cat("Groceries", CategoryKind::Expense, Some(food.id)),
    )
    .unwrap();
    conn.execute(
        "INSERT INTO transactions(account_id, category_id, kind, amount, date)
         VALUES (?1, ?2, 'expense', '10', '2024-06-01')",
        params![acct, food.id],
    )
    .unwrap();

    catalog::delete_category(&conn, owner, food.id).unwrap();

    // The child survives with its parent pointer nulled.
    let parent: Option<i64> = conn
        .query_row(
            "SELECT parent_id FROM categories WHERE id=?1",
            params![groceries.id],
            |r| r.get(0),
        )
        .unwrap();
    assert!(parent.is_none());
    // The transaction survives uncategorized.
    let category: Option<i64> = conn
        .query_row("SELECT category_id FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert!(category.is_none());
}

#[test]
fn ancestors_run_self_first_up_to_the_root() {
    let (conn, owner) = setup();
    let a = catalog::create_category(&conn, owner, &new_cat("A", CategoryKind::Expense, None))
        .unwrap();
    let b = catalog::create_category(&conn, owner, &new_cat("B", CategoryKind::Expense, Some(a.id)))
        .unwrap();
    let c = catalog::create_category(&conn, owner, &new_cat("C", CategoryKind::Expense, Some(b.id)))
        .unwrap();

    let tree = CategoryTree::load(&conn, owner).unwrap();
    assert_eq!(tree.ancestors(c.id), vec![c.id, b.id, a.id]);
    assert_eq!(tree.descendants(a.id).len(), 3);
}

#[test]
fn trees_are_scoped_per_owner() {
    let (conn, alice) = setup();
    conn.execute("INSERT INTO owners(name) VALUES('bob')", [])
        .unwrap();
    let bob = conn.last_insert_rowid();
    let food =
        catalog::create_category(&conn, alice, &new_cat("Food", CategoryKind::Expense, None))
            .unwrap();

    let bob_tree = CategoryTree::load(&conn, bob).unwrap();
    assert!(!bob_tree.contains(food.id));
    assert!(bob_tree.descendants(food.id).is_empty());
}

#[test]
fn reset_restores_the_default_tree_and_drops_budgets() {
    let (mut conn, owner) = setup();
    let food =
        catalog::create_category(&conn, owner, &new_cat("Food", CategoryKind::Expense, None))
            .unwrap();
    conn.execute(
        "INSERT INTO budgets(owner_id, category_id, amount) VALUES (?1, ?2, '100')",
        params![owner, food.id],
    )
    .unwrap();

    let categories = catalog::reset_categories(&mut conn, owner).unwrap();
    let expected: usize = DEFAULT_CATEGORIES
        .iter()
        .map(|s| 1 + s.children.len())
        .sum();
    assert_eq!(categories.len(), expected);

    let budgets: i64 = conn
        .query_row("SELECT COUNT(*) FROM budgets", [], |r| r.get(0))
        .unwrap();
    assert_eq!(budgets, 0);
}
