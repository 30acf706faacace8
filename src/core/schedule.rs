// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurrence scheduler.
//!
//! Each rule carries a cursor (`next_occurrence`); processing advances the
//! cursor through every elapsed period up to and including `today`,
//! materializing one transaction per period through the ledger engine.
//! A rule whose occurrence limit or end date is reached is deactivated and
//! never examined again.

use chrono::{Duration, Months, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::core::ledger::{self, NewTransaction};
use crate::core::{stored_date, stored_decimal};
use crate::errors::{LedgerError, Result};
use crate::models::{Frequency, RecurringRule, Transaction, TxKind};

pub struct NewRecurringRule {
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub kind: TxKind,
    pub amount: Decimal,
    pub description: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub occurrences_limit: Option<i64>,
}

/// Partial update of an active rule. Setting `start_date` also resets the
/// cursor to it.
#[derive(Default)]
pub struct RecurringPatch {
    pub category_id: Option<i64>,
    pub kind: Option<TxKind>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub occurrences_limit: Option<i64>,
}

/// Next due date after `date` for the given cadence. Calendar-month steps
/// clamp the day-of-month to the target month's length.
pub fn next_occurrence(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Daily => date + Duration::days(1),
        Frequency::Weekly => date + Duration::days(7),
        Frequency::Biweekly => date + Duration::days(14),
        Frequency::Monthly => add_months(date, 1),
        Frequency::Quarterly => add_months(date, 3),
        Frequency::SemiAnnual => add_months(date, 6),
        Frequency::Annual => add_months(date, 12),
    }
}

fn add_months(date: NaiveDate, n: u32) -> NaiveDate {
    date.checked_add_months(Months::new(n)).unwrap_or(date)
}

pub fn create_rule(
    conn: &Connection,
    owner_id: i64,
    new: &NewRecurringRule,
) -> Result<RecurringRule> {
    if new.kind == TxKind::Transfer {
        return Err(LedgerError::InvalidArgument(
            "A recurring rule cannot be a transfer".into(),
        ));
    }
    ledger::ensure_account(conn, owner_id, new.account_id)?;

    conn.execute(
        "INSERT INTO recurring(owner_id, account_id, category_id, kind, amount, description,
                               frequency, start_date, end_date, occurrences_limit, next_occurrence)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            owner_id,
            new.account_id,
            new.category_id,
            new.kind.as_str(),
            new.amount.to_string(),
            new.description,
            new.frequency.as_str(),
            new.start_date.to_string(),
            new.end_date.map(|d| d.to_string()),
            new.occurrences_limit,
            new.start_date.to_string()
        ],
    )?;
    load_rule(conn, owner_id, conn.last_insert_rowid())
}

/// Materializes every due occurrence for the owner's active rules.
///
/// Each rule's catch-up loop runs in its own transaction so the cursor,
/// counter and materialized rows commit together. Re-running with the same
/// `today` is a no-op: each materialization moves the cursor past the date
/// it covered.
pub fn process_due(
    conn: &mut Connection,
    owner_id: i64,
    today: NaiveDate,
) -> Result<Vec<Transaction>> {
    let due: Vec<i64> = {
        let mut stmt = conn.prepare(
            "SELECT id FROM recurring
             WHERE owner_id=?1 AND is_active=1 AND next_occurrence<=?2
             ORDER BY next_occurrence, id",
        )?;
        let rows = stmt.query_map(params![owner_id, today.to_string()], |r| r.get(0))?;
        rows.collect::<rusqlite::Result<Vec<i64>>>()?
    };

    let mut materialized = Vec::new();
    for rule_id in due {
        let tx = conn.transaction()?;
        let created = run_rule(&tx, owner_id, rule_id, today)?;
        tx.commit()?;
        materialized.extend(created);
    }
    Ok(materialized)
}

fn run_rule(
    conn: &Connection,
    owner_id: i64,
    rule_id: i64,
    today: NaiveDate,
) -> Result<Vec<Transaction>> {
    let rule = load_rule(conn, owner_id, rule_id)?;
    let mut cursor = rule.next_occurrence;
    let mut count = rule.occurrences_count;
    let mut active = rule.is_active;
    let mut created = Vec::new();

    while cursor <= today {
        if rule.occurrences_limit.is_some_and(|limit| count >= limit) {
            active = false;
            break;
        }
        if rule.end_date.is_some_and(|end| cursor > end) {
            active = false;
            break;
        }
        let txn = ledger::apply(
            conn,
            owner_id,
            &NewTransaction {
                account_id: rule.account_id,
                target_account_id: None,
                category_id: rule.category_id,
                recurring_id: Some(rule.id),
                kind: rule.kind,
                amount: rule.amount,
                description: rule.description.clone(),
                date: cursor,
            },
        )?;
        created.push(txn);
        count += 1;
        cursor = next_occurrence(cursor, rule.frequency);
    }

    // Final exhaustion check so a rule that just consumed its last slot,
    // or whose cursor now sits past its end date, stops here.
    if rule.occurrences_limit.is_some_and(|limit| count >= limit) {
        active = false;
    }
    if rule.end_date.is_some_and(|end| cursor > end) {
        active = false;
    }

    conn.execute(
        "UPDATE recurring SET next_occurrence=?1, occurrences_count=?2, is_active=?3 WHERE id=?4",
        params![cursor.to_string(), count, active, rule.id],
    )?;
    Ok(created)
}

pub fn update_rule(
    conn: &Connection,
    owner_id: i64,
    id: i64,
    patch: &RecurringPatch,
) -> Result<RecurringRule> {
    let rule = load_rule(conn, owner_id, id)?;
    if !rule.is_active {
        return Err(LedgerError::Conflict(format!(
            "Recurring rule {} is exhausted and can no longer be edited",
            id
        )));
    }
    if patch.kind == Some(TxKind::Transfer) {
        return Err(LedgerError::InvalidArgument(
            "A recurring rule cannot be a transfer".into(),
        ));
    }

    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<String> = Vec::new();
    if let Some(category_id) = patch.category_id {
        sets.push("category_id=?");
        values.push(category_id.to_string());
    }
    if let Some(kind) = patch.kind {
        sets.push("kind=?");
        values.push(kind.as_str().to_string());
    }
    if let Some(amount) = patch.amount {
        sets.push("amount=?");
        values.push(amount.to_string());
    }
    if let Some(ref description) = patch.description {
        sets.push("description=?");
        values.push(description.clone());
    }
    if let Some(frequency) = patch.frequency {
        sets.push("frequency=?");
        values.push(frequency.as_str().to_string());
    }
    if let Some(start_date) = patch.start_date {
        sets.push("start_date=?");
        values.push(start_date.to_string());
        // A new start date re-anchors the cursor.
        sets.push("next_occurrence=?");
        values.push(start_date.to_string());
    }
    if let Some(end_date) = patch.end_date {
        sets.push("end_date=?");
        values.push(end_date.to_string());
    }
    if let Some(limit) = patch.occurrences_limit {
        sets.push("occurrences_limit=?");
        values.push(limit.to_string());
    }

    if !sets.is_empty() {
        let mut sql = String::from("UPDATE recurring SET ");
        sql.push_str(&sets.join(", "));
        sql.push_str(" WHERE id=?");
        values.push(id.to_string());
        let params: Vec<&dyn rusqlite::ToSql> =
            values.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
        conn.execute(&sql, rusqlite::params_from_iter(params))?;
    }

    load_rule(conn, owner_id, id)
}

pub fn delete_rule(conn: &Connection, owner_id: i64, id: i64) -> Result<()> {
    let deleted = conn.execute(
        "DELETE FROM recurring WHERE id=?1 AND owner_id=?2",
        params![id, owner_id],
    )?;
    if deleted == 0 {
        return Err(LedgerError::NotFound(format!(
            "Recurring rule {} not found",
            id
        )));
    }
    Ok(())
}

pub fn list_rules(conn: &Connection, owner_id: i64) -> Result<Vec<RecurringRule>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, account_id, category_id, kind, amount, description, frequency,
                start_date, end_date, occurrences_limit, occurrences_count, next_occurrence, is_active
         FROM recurring WHERE owner_id=?1 ORDER BY next_occurrence, id",
    )?;
    let rows = stmt.query_map(params![owner_id], read_rule_row)?;
    let mut rules = Vec::new();
    for row in rows {
        rules.push(row?.into_rule()?);
    }
    Ok(rules)
}

pub fn load_rule(conn: &Connection, owner_id: i64, id: i64) -> Result<RecurringRule> {
    let row = conn
        .query_row(
            "SELECT id, owner_id, account_id, category_id, kind, amount, description, frequency,
                    start_date, end_date, occurrences_limit, occurrences_count, next_occurrence, is_active
             FROM recurring WHERE id=?1 AND owner_id=?2",
            params![id, owner_id],
            read_rule_row,
        )
        .optional()?;
    row.ok_or_else(|| LedgerError::NotFound(format!("Recurring rule {} not found", id)))?
        .into_rule()
}

struct RuleRow {
    id: i64,
    owner_id: i64,
    account_id: i64,
    category_id: Option<i64>,
    kind: String,
    amount: String,
    description: String,
    frequency: String,
    start_date: String,
    end_date: Option<String>,
    occurrences_limit: Option<i64>,
    occurrences_count: i64,
    next_occurrence: String,
    is_active: bool,
}

fn read_rule_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RuleRow> {
    Ok(RuleRow {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        account_id: r.get(2)?,
        category_id: r.get(3)?,
        kind: r.get(4)?,
        amount: r.get(5)?,
        description: r.get(6)?,
        frequency: r.get(7)?,
        start_date: r.get(8)?,
        end_date: r.get(9)?,
        occurrences_limit: r.get(10)?,
        occurrences_count: r.get(11)?,
        next_occurrence: r.get(12)?,
        is_active: r.get(13)?,
    })
}

impl RuleRow {
    fn into_rule(self) -> Result<RecurringRule> {
        let end_date = match self.end_date {
            Some(ref s) => Some(stored_date(s, "end_date")?),
            None => None,
        };
        Ok(RecurringRule {
            id: self.id,
            owner_id: self.owner_id,
            account_id: self.account_id,
            category_id: self.category_id,
            kind: self.kind.parse()?,
            amount: stored_decimal(&self.amount, "amount")?,
            description: self.description,
            frequency: Frequency::from_db(&self.frequency),
            start_date: stored_date(&self.start_date, "start_date")?,
            end_date,
            occurrences_limit: self.occurrences_limit,
            occurrences_count: self.occurrences_count,
            next_occurrence: stored_date(&self.next_occurrence, "next_occurrence")?,
            is_active: self.is_active,
        })
    }
}
