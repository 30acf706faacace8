// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Interpersonal loans ("advances") and their repayment state machine.
//!
//! Status runs pending → partial → paid, driven only by the cumulative
//! amount repaid; paid is terminal. Mirrored transactions are booked
//! through the ledger engine so account balances stay consistent.

use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::ledger::{self, NewTransaction};
use crate::core::{stored_date, stored_decimal};
use crate::errors::{LedgerError, Result};
use crate::models::{Advance, AdvanceStatus, CategoryKind, Direction, TxKind};

/// Bookkeeping category used when an advance is opened.
/// Lending money out is an expense; borrowing it is income.
fn creation_entry(direction: Direction) -> (&'static str, CategoryKind, TxKind) {
    match direction {
        Direction::Given => ("Advances", CategoryKind::Expense, TxKind::Expense),
        Direction::Received => ("Borrowings", CategoryKind::Income, TxKind::Income),
    }
}

/// Bookkeeping category used when a repayment is recorded: the mirror of
/// the creation entry.
fn repayment_entry(direction: Direction) -> (&'static str, CategoryKind, TxKind) {
    match direction {
        Direction::Given => ("Repayments", CategoryKind::Income, TxKind::Income),
        Direction::Received => ("Loan repayment", CategoryKind::Expense, TxKind::Expense),
    }
}

/// Provisions the four bookkeeping categories, skipping any that exist.
/// Returns the names created.
pub fn ensure_advance_categories(conn: &Connection, owner_id: i64) -> Result<Vec<&'static str>> {
    let wanted: [(&str, CategoryKind, &str, &str); 4] = [
        ("Advances", CategoryKind::Expense, "handshake", "#f97316"),
        ("Repayments", CategoryKind::Income, "money-receive", "#22c55e"),
        ("Borrowings", CategoryKind::Income, "money-receive", "#f97316"),
        ("Loan repayment", CategoryKind::Expense, "money-send", "#dc2626"),
    ];
    let mut created = Vec::new();
    for (name, kind, icon, color) in wanted {
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE owner_id=?1 AND name=?2 AND kind=?3",
                params![owner_id, name, kind.as_str()],
                |r| r.get(0),
            )
            .optional()?;
        if existing.is_none() {
            conn.execute(
                "INSERT INTO categories(owner_id, parent_id, name, kind, icon, color, is_default)
                 VALUES (?1, NULL, ?2, ?3, ?4, ?5, 1)",
                params![owner_id, name, kind.as_str(), icon, color],
            )?;
            created.push(name);
        }
    }
    Ok(created)
}

fn find_bookkeeping_category(
    conn: &Connection,
    owner_id: i64,
    name: &'static str,
    kind: CategoryKind,
) -> Result<i64> {
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories WHERE owner_id=?1 AND name=?2 AND kind=?3",
            params![owner_id, name, kind.as_str()],
            |r| r.get(0),
        )
        .optional()?;
    id.ok_or(LedgerError::MissingCategory {
        name,
        kind: kind.as_str(),
    })
}

pub struct NewAdvance {
    pub account_id: i64,
    pub amount: Decimal,
    pub description: String,
    pub person: String,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub direction: Direction,
    pub skip_transaction: bool,
}

#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub amount: Decimal,
    pub remaining: Decimal,
    pub is_fully_paid: bool,
    pub transaction_id: Option<i64>,
}

#[derive(Debug, Default)]
pub struct AdvanceFilter {
    pub direction: Option<Direction>,
    pub status: Option<AdvanceStatus>,
    pub person: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PersonSummary {
    pub person: String,
    pub count: i64,
    pub total_amount: Decimal,
    pub total_received: Decimal,
    pub total_pending: Decimal,
}

#[derive(Debug, Default, Serialize)]
pub struct AdvanceTotals {
    pub total_advances: i64,
    pub total_amount: Decimal,
    pub total_received: Decimal,
    pub total_pending: Decimal,
    pub count_pending: i64,
    pub count_partial: i64,
    pub count_paid: i64,
}

/// Opens an advance, booking the mirrored transaction unless skipped.
pub fn create_advance(conn: &mut Connection, owner_id: i64, new: &NewAdvance) -> Result<Advance> {
    let tx = conn.transaction()?;
    ledger::ensure_account(&tx, owner_id, new.account_id)?;

    let transaction_id = if new.skip_transaction {
        None
    } else {
        let (category_name, category_kind, tx_kind) = creation_entry(new.direction);
        let category_id = find_bookkeeping_category(&tx, owner_id, category_name, category_kind)?;
        let mut description = match new.direction {
            Direction::Given => format!("Advance to {}", new.person),
            Direction::Received => format!("Borrowed from {}", new.person),
        };
        if !new.description.is_empty() {
            description.push_str(" - ");
            description.push_str(&new.description);
        }
        let txn = ledger::apply(
            &tx,
            owner_id,
            &NewTransaction {
                account_id: new.account_id,
                target_account_id: None,
                category_id: Some(category_id),
                recurring_id: None,
                kind: tx_kind,
                amount: new.amount,
                description,
                date: new.date,
            },
        )?;
        Some(txn.id)
    };

    tx.execute(
        "INSERT INTO advances(owner_id, account_id, amount, description, person, date, due_date,
                              direction, transaction_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            owner_id,
            new.account_id,
            new.amount.to_string(),
            new.description,
            new.person,
            new.date.to_string(),
            new.due_date.map(|d| d.to_string()),
            new.direction.as_str(),
            transaction_id
        ],
    )?;
    let id = tx.last_insert_rowid();
    let advance = load_advance(&tx, owner_id, id)?;
    tx.commit()?;
    Ok(advance)
}

/// Records a repayment against an advance.
///
/// Rejected outright when the advance is already paid (Conflict), the
/// amount is not positive, or it would overshoot the outstanding balance
/// (InvalidArgument); nothing is written in those cases.
pub fn record_payment(
    conn: &mut Connection,
    owner_id: i64,
    advance_id: i64,
    amount: Decimal,
    skip_transaction: bool,
    today: NaiveDate,
) -> Result<(Advance, PaymentReceipt)> {
    let tx = conn.transaction()?;
    let advance = load_advance(&tx, owner_id, advance_id)?;

    if advance.status == AdvanceStatus::Paid {
        return Err(LedgerError::Conflict(format!(
            "Advance {} is already fully repaid",
            advance_id
        )));
    }
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidArgument(
            "The payment amount must be positive".into(),
        ));
    }
    let new_received = advance.amount_received + amount;
    if new_received > advance.amount {
        return Err(LedgerError::InvalidArgument(format!(
            "The payment exceeds the outstanding amount ({})",
            (advance.amount - advance.amount_received).round_dp(2)
        )));
    }

    let transaction_id = if skip_transaction {
        None
    } else {
        let (category_name, category_kind, tx_kind) = repayment_entry(advance.direction);
        let category_id = find_bookkeeping_category(&tx, owner_id, category_name, category_kind)?;
        let mut description = match advance.direction {
            Direction::Given => format!("Repayment from {}", advance.person),
            Direction::Received => format!("Repayment to {}", advance.person),
        };
        if !advance.description.is_empty() {
            description.push_str(" - ");
            description.push_str(&advance.description);
        }
        let txn = ledger::apply(
            &tx,
            owner_id,
            &NewTransaction {
                account_id: advance.account_id,
                target_account_id: None,
                category_id: Some(category_id),
                recurring_id: None,
                kind: tx_kind,
                amount,
                description,
                date: today,
            },
        )?;
        Some(txn.id)
    };

    let status = AdvanceStatus::from_amounts(new_received, advance.amount);
    tx.execute(
        "UPDATE advances SET amount_received=?1, status=?2 WHERE id=?3",
        params![new_received.to_string(), status.as_str(), advance_id],
    )?;

    let updated = load_advance(&tx, owner_id, advance_id)?;
    tx.commit()?;
    let remaining = updated.amount - updated.amount_received;
    Ok((
        updated,
        PaymentReceipt {
            amount,
            remaining,
            is_fully_paid: remaining == Decimal::ZERO,
            transaction_id,
        },
    ))
}

pub fn delete_advance(conn: &Connection, owner_id: i64, id: i64) -> Result<()> {
    let deleted = conn.execute(
        "DELETE FROM advances WHERE id=?1 AND owner_id=?2",
        params![id, owner_id],
    )?;
    if deleted == 0 {
        return Err(LedgerError::NotFound(format!("Advance {} not found", id)));
    }
    Ok(())
}

pub fn list_advances(
    conn: &Connection,
    owner_id: i64,
    filter: &AdvanceFilter,
) -> Result<Vec<Advance>> {
    let mut sql = String::from(
        "SELECT id, owner_id, account_id, amount, description, person, date, due_date,
                direction, status, amount_received, transaction_id
         FROM advances WHERE owner_id=?",
    );
    let mut values: Vec<String> = vec![owner_id.to_string()];
    if let Some(direction) = filter.direction {
        sql.push_str(" AND direction=?");
        values.push(direction.as_str().to_string());
    }
    if let Some(status) = filter.status {
        sql.push_str(" AND status=?");
        values.push(status.as_str().to_string());
    }
    if let Some(ref person) = filter.person {
        sql.push_str(" AND person LIKE ?");
        values.push(format!("%{}%", person));
    }
    sql.push_str(" ORDER BY date DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> =
        values.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
    let rows = stmt.query_map(rusqlite::params_from_iter(params), read_advance_row)?;
    let mut advances = Vec::new();
    for row in rows {
        advances.push(row?.into_advance()?);
    }
    Ok(advances)
}

/// Per-person totals over open advances, plus global counts by status.
pub fn summarize(
    conn: &Connection,
    owner_id: i64,
    direction: Option<Direction>,
) -> Result<(Vec<PersonSummary>, AdvanceTotals)> {
    let advances = list_advances(
        conn,
        owner_id,
        &AdvanceFilter {
            direction,
            ..AdvanceFilter::default()
        },
    )?;

    let mut by_person: HashMap<String, PersonSummary> = HashMap::new();
    let mut totals = AdvanceTotals::default();
    for advance in &advances {
        let pending = advance.amount - advance.amount_received;
        totals.total_advances += 1;
        totals.total_amount += advance.amount;
        totals.total_received += advance.amount_received;
        totals.total_pending += pending;
        match advance.status {
            AdvanceStatus::Pending => totals.count_pending += 1,
            AdvanceStatus::Partial => totals.count_partial += 1,
            AdvanceStatus::Paid => totals.count_paid += 1,
        }
        if advance.status != AdvanceStatus::Paid {
            let entry =
                by_person
                    .entry(advance.person.clone())
                    .or_insert_with(|| PersonSummary {
                        person: advance.person.clone(),
                        count: 0,
                        total_amount: Decimal::ZERO,
                        total_received: Decimal::ZERO,
                        total_pending: Decimal::ZERO,
                    });
            entry.count += 1;
            entry.total_amount += advance.amount;
            entry.total_received += advance.amount_received;
            entry.total_pending += pending;
        }
    }

    let mut people: Vec<PersonSummary> = by_person.into_values().collect();
    people.sort_by(|a, b| b.total_pending.cmp(&a.total_pending));
    Ok((people, totals))
}

pub fn load_advance(conn: &Connection, owner_id: i64, id: i64) -> Result<Advance> {
    let row = conn
        .query_row(
            "SELECT id, owner_id, account_id, amount, description, person, date, due_date,
                    direction, status, amount_received, transaction_id
             FROM advances WHERE id=?1 AND owner_id=?2",
            params![id, owner_id],
            read_advance_row,
        )
        .optional()?;
    row.ok_or_else(|| LedgerError::NotFound(format!("Advance {} not found", id)))?
        .into_advance()
}

struct AdvanceRow {
    id: i64,
    owner_id: i64,
    account_id: i64,
    amount: String,
    description: String,
    person: String,
    date: String,
    due_date: Option<String>,
    direction: String,
    status: String,
    amount_received: String,
    transaction_id: Option<i64>,
}

fn read_advance_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<AdvanceRow> {
    Ok(AdvanceRow {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        account_id: r.get(2)?,
        amount: r.get(3)?,
        description: r.get(4)?,
        person: r.get(5)?,
        date: r.get(6)?,
        due_date: r.get(7)?,
        direction: r.get(8)?,
        status: r.get(9)?,
        amount_received: r.get(10)?,
        transaction_id: r.get(11)?,
    })
}

impl AdvanceRow {
    fn into_advance(self) -> Result<Advance> {
        let due_date = match self.due_date {
            Some(ref s) => Some(stored_date(s, "due_date")?),
            None => None,
        };
        Ok(Advance {
            id: self.id,
            owner_id: self.owner_id,
            account_id: self.account_id,
            amount: stored_decimal(&self.amount, "amount")?,
            description: self.description,
            person: self.person,
            date: stored_date(&self.date, "date")?,
            due_date,
            direction: self.direction.parse()?,
            status: self.status.parse()?,
            amount_received: stored_decimal(&self.amount_received, "amount_received")?,
            transaction_id: self.transaction_id,
        })
    }
}
