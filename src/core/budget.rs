// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget aggregation.
//!
//! A budget is bound to one expense category; its spend scope is that
//! category plus every descendant in the CATEGORY tree, which is
//! independent of the (two-level) budget tree. This module never writes
//! balances: it is a read path over committed transactions, plus budget
//! CRUD that touches no other table.

use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::catalog::CategoryTree;
use crate::core::stored_decimal;
use crate::errors::{LedgerError, Result};
use crate::models::{Budget, CategoryKind};
use crate::utils::month_bounds;

pub struct NewBudget {
    pub category_id: i64,
    pub parent_id: Option<i64>,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BudgetStatus {
    pub id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub parent_id: Option<i64>,
    pub target: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percentage: Decimal,
    pub exceeded: bool,
    pub display_order: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HypotheticalCheck {
    pub has_budget: bool,
    pub would_exceed: bool,
    pub category_name: Option<String>,
    pub budget_amount: Option<Decimal>,
    pub current_spent: Option<Decimal>,
    pub new_total: Option<Decimal>,
    pub excess_amount: Option<Decimal>,
    pub remaining_before: Option<Decimal>,
}

impl HypotheticalCheck {
    fn no_budget() -> HypotheticalCheck {
        HypotheticalCheck {
            has_budget: false,
            would_exceed: false,
            category_name: None,
            budget_amount: None,
            current_spent: None,
            new_total: None,
            excess_amount: None,
            remaining_before: None,
        }
    }
}

pub fn create_budget(conn: &Connection, owner_id: i64, new: &NewBudget) -> Result<Budget> {
    if let Some(parent_id) = new.parent_id {
        let parent_of_parent: Option<Option<i64>> = conn
            .query_row(
                "SELECT parent_id FROM budgets WHERE id=?1 AND owner_id=?2",
                params![parent_id, owner_id],
                |r| r.get(0),
            )
            .optional()?;
        let parent_of_parent = parent_of_parent.ok_or_else(|| {
            LedgerError::NotFound(format!("Parent budget {} not found", parent_id))
        })?;
        if parent_of_parent.is_some() {
            return Err(LedgerError::Conflict(
                "Budgets nest only one level deep".into(),
            ));
        }

        // A category may be a child under at most one parent budget.
        let already_child: Option<i64> = conn
            .query_row(
                "SELECT id FROM budgets WHERE owner_id=?1 AND category_id=?2 AND parent_id IS NOT NULL",
                params![owner_id, new.category_id],
                |r| r.get(0),
            )
            .optional()?;
        if already_child.is_some() {
            return Err(LedgerError::Conflict(
                "This category already has a budget under a parent".into(),
            ));
        }

        // Nor may a category serving as a root budget with children also
        // hang under someone else's parent.
        let is_parent: Option<i64> = conn
            .query_row(
                "SELECT b.id FROM budgets b
                 WHERE b.category_id=?1 AND b.owner_id=?2 AND b.parent_id IS NULL
                 AND EXISTS (SELECT 1 FROM budgets child WHERE child.parent_id = b.id)",
                params![new.category_id, owner_id],
                |r| r.get(0),
            )
            .optional()?;
        if is_parent.is_some() {
            return Err(LedgerError::Conflict(
                "This category is already a parent budget with children".into(),
            ));
        }
    } else {
        let existing_root: Option<i64> = conn
            .query_row(
                "SELECT id FROM budgets WHERE owner_id=?1 AND category_id=?2 AND parent_id IS NULL",
                params![owner_id, new.category_id],
                |r| r.get(0),
            )
            .optional()?;
        if existing_root.is_some() {
            return Err(LedgerError::Conflict(
                "A root budget already exists for this category".into(),
            ));
        }
    }

    let kind: Option<String> = conn
        .query_row(
            "SELECT kind FROM categories WHERE id=?1 AND owner_id=?2",
            params![new.category_id, owner_id],
            |r| r.get(0),
        )
        .optional()?;
    let kind = kind.ok_or_else(|| {
        LedgerError::NotFound(format!("Category {} not found", new.category_id))
    })?;
    if kind != CategoryKind::Expense.as_str() {
        return Err(LedgerError::InvalidArgument(
            "Budgets can only be created for expense categories".into(),
        ));
    }

    conn.execute(
        "INSERT INTO budgets(owner_id, category_id, parent_id, amount) VALUES (?1, ?2, ?3, ?4)",
        params![
            owner_id,
            new.category_id,
            new.parent_id,
            new.amount.to_string()
        ],
    )?;
    load_budget(conn, owner_id, conn.last_insert_rowid())
}

pub fn delete_budget(conn: &Connection, owner_id: i64, id: i64) -> Result<()> {
    // Child budgets go with their parent via the FK cascade.
    let deleted = conn.execute(
        "DELETE FROM budgets WHERE id=?1 AND owner_id=?2",
        params![id, owner_id],
    )?;
    if deleted == 0 {
        return Err(LedgerError::NotFound(format!("Budget {} not found", id)));
    }
    Ok(())
}

/// Rewrites the display order: listed budgets get 1..n, all others NULL.
pub fn set_order(conn: &mut Connection, owner_id: i64, ids: &[i64]) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE budgets SET display_order=NULL WHERE owner_id=?1",
        params![owner_id],
    )?;
    for (index, id) in ids.iter().enumerate() {
        tx.execute(
            "UPDATE budgets SET display_order=?1 WHERE id=?2 AND owner_id=?3",
            params![(index + 1) as i64, id, owner_id],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// One status row per budget: spend over the budget category's descendant
/// closure within the inclusive window.
pub fn compute_status(
    conn: &Connection,
    owner_id: i64,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<Vec<BudgetStatus>> {
    let tree = CategoryTree::load(conn, owner_id)?;
    let budgets = list_budgets(conn, owner_id)?;
    let rows = expense_rows(conn, owner_id, window_start, window_end)?;

    let mut out = Vec::new();
    for (budget, category_name) in budgets {
        let scope: HashSet<i64> = tree.descendants(budget.category_id).into_iter().collect();
        let spent: Decimal = rows
            .iter()
            .filter(|(category_id, _)| scope.contains(category_id))
            .map(|(_, amount)| *amount)
            .sum();
        let remaining = budget.amount - spent;
        // percentage and exceeded are independent: a zero-target budget
        // reports 0% but can still be exceeded by any positive spend.
        let percentage = if budget.amount > Decimal::ZERO {
            ((spent / budget.amount) * Decimal::ONE_HUNDRED).min(Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        };
        let exceeded = spent > budget.amount;
        out.push(BudgetStatus {
            id: budget.id,
            category_id: budget.category_id,
            category_name,
            parent_id: budget.parent_id,
            target: budget.amount,
            spent,
            remaining,
            percentage,
            exceeded,
            display_order: budget.display_order,
        });
    }
    Ok(out)
}

/// Would a hypothetical expense on `category_id` exceed the nearest
/// applicable budget? Walks the ancestor chain (self first) and uses the
/// current month as the window. An unknown category or a chain with no
/// budget reports `has_budget=false`.
pub fn check_hypothetical(
    conn: &Connection,
    owner_id: i64,
    category_id: i64,
    amount: Decimal,
    today: NaiveDate,
) -> Result<HypotheticalCheck> {
    let tree = CategoryTree::load(conn, owner_id)?;
    let budget = match resolve_applicable_budget(conn, owner_id, &tree, category_id)? {
        Some(b) => b,
        None => return Ok(HypotheticalCheck::no_budget()),
    };

    let (window_start, window_end) = month_bounds(today);
    let rows = expense_rows(conn, owner_id, window_start, window_end)?;
    let scope: HashSet<i64> = tree.descendants(budget.category_id).into_iter().collect();
    let current_spent: Decimal = rows
        .iter()
        .filter(|(cat, _)| scope.contains(cat))
        .map(|(_, a)| *a)
        .sum();

    let new_total = current_spent + amount;
    let would_exceed = new_total > budget.amount;
    let excess_amount = if would_exceed {
        new_total - budget.amount
    } else {
        Decimal::ZERO
    };

    Ok(HypotheticalCheck {
        has_budget: true,
        would_exceed,
        category_name: tree.name(budget.category_id).map(|s| s.to_string()),
        budget_amount: Some(budget.amount),
        current_spent: Some(current_spent),
        new_total: Some(new_total),
        excess_amount: Some(excess_amount),
        remaining_before: Some(budget.amount - current_spent),
    })
}

/// Nearest budget bound to the category or one of its ancestors. When a
/// category carries both a root budget and a child budget, the root wins.
pub fn resolve_applicable_budget(
    conn: &Connection,
    owner_id: i64,
    tree: &CategoryTree,
    category_id: i64,
) -> Result<Option<Budget>> {
    for ancestor in tree.ancestors(category_id) {
        let found = conn
            .query_row(
                "SELECT id, owner_id, category_id, parent_id, amount, display_order
                 FROM budgets WHERE owner_id=?1 AND category_id=?2
                 ORDER BY parent_id IS NOT NULL, id LIMIT 1",
                params![owner_id, ancestor],
                read_budget_row,
            )
            .optional()?;
        if let Some(row) = found {
            return Ok(Some(row.into_budget()?));
        }
    }
    Ok(None)
}

/// Budgets with their category names, roots first, then explicit display
/// order, then creation order.
pub fn list_budgets(conn: &Connection, owner_id: i64) -> Result<Vec<(Budget, String)>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.owner_id, b.category_id, b.parent_id, b.amount, b.display_order, c.name
         FROM budgets b JOIN categories c ON b.category_id = c.id
         WHERE b.owner_id=?1
         ORDER BY b.parent_id IS NOT NULL,
                  CASE WHEN b.display_order IS NULL THEN 1 ELSE 0 END,
                  b.display_order, b.created_at, b.id",
    )?;
    let mut rows = stmt.query(params![owner_id])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let row = read_budget_row(r)?;
        let name: String = r.get(6)?;
        out.push((row.into_budget()?, name));
    }
    Ok(out)
}

pub fn load_budget(conn: &Connection, owner_id: i64, id: i64) -> Result<Budget> {
    let row = conn
        .query_row(
            "SELECT id, owner_id, category_id, parent_id, amount, display_order
             FROM budgets WHERE id=?1 AND owner_id=?2",
            params![id, owner_id],
            read_budget_row,
        )
        .optional()?;
    row.ok_or_else(|| LedgerError::NotFound(format!("Budget {} not found", id)))?
        .into_budget()
}

fn expense_rows(
    conn: &Connection,
    owner_id: i64,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<Vec<(i64, Decimal)>> {
    let mut stmt = conn.prepare(
        "SELECT t.category_id, t.amount FROM transactions t
         JOIN accounts a ON t.account_id = a.id
         WHERE a.owner_id=?1 AND t.kind='expense' AND t.category_id IS NOT NULL
           AND t.date>=?2 AND t.date<=?3",
    )?;
    let mut rows = stmt.query(params![
        owner_id,
        window_start.to_string(),
        window_end.to_string()
    ])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let category_id: i64 = r.get(0)?;
        let amount: String = r.get(1)?;
        out.push((category_id, stored_decimal(&amount, "amount")?));
    }
    Ok(out)
}

struct BudgetRow {
    id: i64,
    owner_id: i64,
    category_id: i64,
    parent_id: Option<i64>,
    amount: String,
    display_order: Option<i64>,
}

fn read_budget_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<BudgetRow> {
    Ok(BudgetRow {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        category_id: r.get(2)?,
        parent_id: r.get(3)?,
        amount: r.get(4)?,
        display_order: r.get(5)?,
    })
}

impl BudgetRow {
    fn into_budget(self) -> Result<Budget> {
        Ok(Budget {
            id: self.id,
            owner_id: self.owner_id,
            category_id: self.category_id,
            parent_id: self.parent_id,
            amount: stored_decimal(&self.amount, "amount")?,
            display_order: self.display_order,
        })
    }
}
