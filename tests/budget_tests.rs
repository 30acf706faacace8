// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketledger::core::budget::{self, NewBudget};
use pocketledger::errors::LedgerError;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

fn setup() -> (Connection, i64, i64) {
    let conn = Connection::open_in_memory().unwrap();
    pocketledger::db::init_schema(&conn).unwrap();
    conn.execute("INSERT INTO owners(name) VALUES('alice')", [])
        .unwrap();
    let owner_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO accounts(owner_id, name, type, balance, opening_balance, currency)
         VALUES (?1, 'Main', 'checking', '0', '0', 'USD')",
        params![owner_id],
    )
    .unwrap();
    let account_id = conn.last_insert_rowid();
    (conn, owner_id, account_id)
}

fn add_category(conn: &Connection, owner: i64, name: &str, kind: &str, parent: Option<i64>) -> i64 {
    conn.execute(
        "INSERT INTO categories(owner_id, parent_id, name, kind) VALUES (?1, ?2, ?3, ?4)",
        params![owner, parent, name, kind],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn add_expense(conn: &Connection, account: i64, category: i64, amount: &str, date: &str) {
    conn.execute(
        "INSERT INTO transactions(account_id, category_id, kind, amount, date)
         VALUES (?1, ?2, 'expense', ?3, ?4)",
        params![account, category, amount, date],
    )
    .unwrap();
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn spend_rolls_up_category_descendants() {
    let (conn, owner, acct) = setup();
    let transport = add_category(&conn, owner, "Transport", "expense", None);
    let fuel = add_category(&conn, owner, "Fuel", "expense", Some(transport));
    let taxi = add_category(&conn, owner, "Taxi", "expense", Some(transport));

    budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: transport,
            parent_id: None,
            amount: dec("200"),
        },
    )
    .unwrap();

    // No budget exists on Fuel or Taxi, yet their expenses count.
    add_expense(&conn, acct, transport, "10", "2024-06-03");
    add_expense(&conn, acct, fuel, "20", "2024-06-10");
    add_expense(&conn, acct, taxi, "30", "2024-06-28");
    // Outside the window: ignored.
    add_expense(&conn, acct, fuel, "500", "2024-05-31");

    let statuses =
        budget::compute_status(&conn, owner, date("2024-06-01"), date("2024-06-30")).unwrap();
    assert_eq!(statuses.len(), 1);
    let s = &statuses[0];
    assert_eq!(s.spent, dec("60"));
    assert_eq!(s.remaining, dec("140"));
    assert_eq!(s.percentage, dec("30"));
    assert!(!s.exceeded);
}

#[test]
fn window_bounds_are_inclusive() {
    let (conn, owner, acct) = setup();
    let cat = add_category(&conn, owner, "Food", "expense", None);
    budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: cat,
            parent_id: None,
            amount: dec("100"),
        },
    )
    .unwrap();
    add_expense(&conn, acct, cat, "10", "2024-06-01");
    add_expense(&conn, acct, cat, "20", "2024-06-30");

    let statuses =
        budget::compute_status(&conn, owner, date("2024-06-01"), date("2024-06-30")).unwrap();
    assert_eq!(statuses[0].spent, dec("30"));
}

#[test]
fn percentage_caps_at_100_and_exceeded_is_independent() {
    let (conn, owner, acct) = setup();
    let cat = add_category(&conn, owner, "Food", "expense", None);
    budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: cat,
            parent_id: None,
            amount: dec("50"),
        },
    )
    .unwrap();
    add_expense(&conn, acct, cat, "80", "2024-06-10");

    let statuses =
        budget::compute_status(&conn, owner, date("2024-06-01"), date("2024-06-30")).unwrap();
    assert_eq!(statuses[0].percentage, dec("100"));
    assert!(statuses[0].exceeded);
}

#[test]
fn zero_target_budget_reports_zero_percent_but_can_be_exceeded() {
    let (conn, owner, acct) = setup();
    let cat = add_category(&conn, owner, "Food", "expense", None);
    budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: cat,
            parent_id: None,
            amount: dec("0"),
        },
    )
    .unwrap();
    add_expense(&conn, acct, cat, "5", "2024-06-10");

    let statuses =
        budget::compute_status(&conn, owner, date("2024-06-01"), date("2024-06-30")).unwrap();
    assert_eq!(statuses[0].percentage, Decimal::ZERO);
    assert!(statuses[0].exceeded);
}

#[test]
fn hypothetical_check_walks_up_to_the_nearest_budget() {
    let (conn, owner, acct) = setup();
    let transport = add_category(&conn, owner, "Transport", "expense", None);
    let fuel = add_category(&conn, owner, "Fuel", "expense", Some(transport));
    budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: transport,
            parent_id: None,
            amount: dec("100"),
        },
    )
    .unwrap();
    add_expense(&conn, acct, fuel, "60", "2024-06-05");

    // Fuel has no budget of its own; the Transport budget applies.
    let check = budget::check_hypothetical(&conn, owner, fuel, dec("50"), date("2024-06-15"))
        .unwrap();
    assert!(check.has_budget);
    assert!(check.would_exceed);
    assert_eq!(check.category_name.as_deref(), Some("Transport"));
    assert_eq!(check.current_spent, Some(dec("60")));
    assert_eq!(check.new_total, Some(dec("110")));
    assert_eq!(check.excess_amount, Some(dec("10")));
    assert_eq!(check.remaining_before, Some(dec("40")));
}

#[test]
fn nearest_budget_wins_over_an_ancestor_budget() {
    let (conn, owner, acct) = setup();
    let transport = add_category(&conn, owner, "Transport", "expense", None);
    let fuel = add_category(&conn, owner, "Fuel", "expense", Some(transport));
    budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: transport,
            parent_id: None,
            amount: dec("1000"),
        },
    )
    .unwrap();
    budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: fuel,
            parent_id: None,
            amount: dec("30"),
        },
    )
    .unwrap();
    add_expense(&conn, acct, fuel, "20", "2024-06-05");

    let check = budget::check_hypothetical(&conn, owner, fuel, dec("15"), date("2024-06-15"))
        .unwrap();
    assert_eq!(check.category_name.as_deref(), Some("Fuel"));
    assert!(check.would_exceed);
}

#[test]
fn category_without_any_budget_reports_none() {
    let (conn, owner, _) = setup();
    let cat = add_category(&conn, owner, "Food", "expense", None);
    let check =
        budget::check_hypothetical(&conn, owner, cat, dec("10"), date("2024-06-15")).unwrap();
    assert!(!check.has_budget);
    assert!(!check.would_exceed);
}

#[test]
fn duplicate_root_budget_is_a_conflict() {
    let (conn, owner, _) = setup();
    let cat = add_category(&conn, owner, "Food", "expense", None);
    let new = NewBudget {
        category_id: cat,
        parent_id: None,
        amount: dec("100"),
    };
    budget::create_budget(&conn, owner, &new).unwrap();
    let err = budget::create_budget(&conn, owner, &new).unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
}

#[test]
fn budgets_nest_only_one_level() {
    let (conn, owner, _) = setup();
    let food = add_category(&conn, owner, "Food", "expense", None);
    let groceries = add_category(&conn, owner, "Groceries", "expense", None);
    let snacks = add_category(&conn, owner, "Snacks", "expense", None);

    let root = budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: food,
            parent_id: None,
            amount: dec("300"),
        },
    )
    .unwrap();
    let child = budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: groceries,
            parent_id: Some(root.id),
            amount: dec("100"),
        },
    )
    .unwrap();

    // A child budget cannot itself be a parent.
    let err = budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: snacks,
            parent_id: Some(child.id),
            amount: dec("50"),
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
}

#[test]
fn a_category_hangs_under_at_most_one_parent_budget() {
    let (conn, owner, _) = setup();
    let food = add_category(&conn, owner, "Food", "expense", None);
    let leisure = add_category(&conn, owner, "Leisure", "expense", None);
    let shared = add_category(&conn, owner, "Shared", "expense", None);

    let food_budget = budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: food,
            parent_id: None,
            amount: dec("300"),
        },
    )
    .unwrap();
    let leisure_budget = budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: leisure,
            parent_id: None,
            amount: dec("200"),
        },
    )
    .unwrap();
    budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: shared,
            parent_id: Some(food_budget.id),
            amount: dec("50"),
        },
    )
    .unwrap();

    let err = budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: shared,
            parent_id: Some(leisure_budget.id),
            amount: dec("50"),
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
}

#[test]
fn income_categories_cannot_carry_budgets() {
    let (conn, owner, _) = setup();
    let salary = add_category(&conn, owner, "Salary", "income", None);
    let err = budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: salary,
            parent_id: None,
            amount: dec("100"),
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));
}

#[test]
fn deleting_a_root_budget_takes_its_children() {
    let (conn, owner, _) = setup();
    let food = add_category(&conn, owner, "Food", "expense", None);
    let groceries = add_category(&conn, owner, "Groceries", "expense", None);
    let root = budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: food,
            parent_id: None,
            amount: dec("300"),
        },
    )
    .unwrap();
    budget::create_budget(
        &conn,
        owner,
        &NewBudget {
            category_id: groceries,
            parent_id: Some(root.id),
            amount: dec("100"),
        },
    )
    .unwrap();

    budget::delete_budget(&conn, owner, root.id).unwrap();
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM budgets", [], |r| r.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}
