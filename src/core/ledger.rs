// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The ledger engine: the only place account balances are written.
//!
//! Creating a transaction inserts the row and adjusts the affected
//! balance(s) in one unit of work; deleting reverses the original effect
//! before removing the row. Amounts are not sign- or zero-checked here;
//! that is the caller's responsibility.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::core::{stored_date, stored_decimal};
use crate::errors::{LedgerError, Result};
use crate::models::{Account, Transaction, TxKind};

pub struct NewTransaction {
    pub account_id: i64,
    pub target_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub recurring_id: Option<i64>,
    pub kind: TxKind,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
}

/// Partial update of an existing transaction.
#[derive(Default)]
pub struct TransactionPatch {
    pub category_id: Option<i64>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Creates a transaction and applies its balance effect atomically.
pub fn create_transaction(
    conn: &mut Connection,
    owner_id: i64,
    new: &NewTransaction,
) -> Result<Transaction> {
    let tx = conn.transaction()?;
    let created = apply(&tx, owner_id, new)?;
    tx.commit()?;
    Ok(created)
}

/// Inserts the row and shifts balances on the caller's transaction scope.
/// Used directly by the scheduler and the advance flow so their whole unit
/// of work commits together.
pub(crate) fn apply(conn: &Connection, owner_id: i64, new: &NewTransaction) -> Result<Transaction> {
    ensure_account(conn, owner_id, new.account_id)?;
    match new.kind {
        TxKind::Transfer => {
            let target = new.target_account_id.ok_or_else(|| {
                LedgerError::InvalidArgument(
                    "A target account is required for a transfer".into(),
                )
            })?;
            if target == new.account_id {
                return Err(LedgerError::InvalidArgument(
                    "The target account must differ from the source account".into(),
                ));
            }
            ensure_account(conn, owner_id, target)?;
        }
        _ => {
            if new.target_account_id.is_some() {
                return Err(LedgerError::InvalidArgument(
                    "A target account is only valid for transfers".into(),
                ));
            }
        }
    }

    conn.execute(
        "INSERT INTO transactions(account_id, target_account_id, category_id, recurring_id, kind, amount, description, date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new.account_id,
            new.target_account_id,
            new.category_id,
            new.recurring_id,
            new.kind.as_str(),
            new.amount.to_string(),
            new.description,
            new.date.to_string()
        ],
    )?;
    let id = conn.last_insert_rowid();

    match new.kind {
        TxKind::Income => shift_balance(conn, new.account_id, new.amount)?,
        TxKind::Expense => shift_balance(conn, new.account_id, -new.amount)?,
        TxKind::Transfer => {
            shift_balance(conn, new.account_id, -new.amount)?;
            if let Some(target) = new.target_account_id {
                shift_balance(conn, target, new.amount)?;
            }
        }
    }

    Ok(Transaction {
        id,
        account_id: new.account_id,
        target_account_id: new.target_account_id,
        category_id: new.category_id,
        recurring_id: new.recurring_id,
        kind: new.kind,
        amount: new.amount,
        description: new.description.clone(),
        date: new.date,
    })
}

/// Deletes a transaction, reversing its balance effect first.
pub fn delete_transaction(conn: &mut Connection, owner_id: i64, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let existing = load_transaction(&tx, owner_id, id)?;
    reverse(&tx, &existing)?;
    tx.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    tx.commit()?;
    Ok(())
}

fn reverse(conn: &Connection, t: &Transaction) -> Result<()> {
    match t.kind {
        TxKind::Income => shift_balance(conn, t.account_id, -t.amount),
        TxKind::Expense => shift_balance(conn, t.account_id, t.amount),
        TxKind::Transfer => {
            shift_balance(conn, t.account_id, t.amount)?;
            if let Some(target) = t.target_account_id {
                shift_balance(conn, target, -t.amount)?;
            }
            Ok(())
        }
    }
}

/// Partial field update. Changing the amount does NOT recompute the
/// balance effect already applied at creation; `doctor` reports the
/// resulting drift.
pub fn update_transaction(
    conn: &Connection,
    owner_id: i64,
    id: i64,
    patch: &TransactionPatch,
) -> Result<Transaction> {
    load_transaction(conn, owner_id, id)?;

    let mut sql = String::from("UPDATE transactions SET ");
    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<String> = Vec::new();
    if let Some(category_id) = patch.category_id {
        sets.push("category_id=?");
        values.push(category_id.to_string());
    }
    if let Some(amount) = patch.amount {
        sets.push("amount=?");
        values.push(amount.to_string());
    }
    if let Some(ref description) = patch.description {
        sets.push("description=?");
        values.push(description.clone());
    }
    if let Some(date) = patch.date {
        sets.push("date=?");
        values.push(date.to_string());
    }
    if !sets.is_empty() {
        sql.push_str(&sets.join(", "));
        sql.push_str(" WHERE id=?");
        values.push(id.to_string());
        let params: Vec<&dyn rusqlite::ToSql> =
            values.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
        conn.execute(&sql, rusqlite::params_from_iter(params))?;
    }

    load_transaction(conn, owner_id, id)
}

struct TxRow {
    id: i64,
    account_id: i64,
    target_account_id: Option<i64>,
    category_id: Option<i64>,
    recurring_id: Option<i64>,
    kind: String,
    amount: String,
    description: String,
    date: String,
}

impl TxRow {
    fn into_transaction(self) -> Result<Transaction> {
        Ok(Transaction {
            id: self.id,
            account_id: self.account_id,
            target_account_id: self.target_account_id,
            category_id: self.category_id,
            recurring_id: self.recurring_id,
            kind: self.kind.parse()?,
            amount: stored_decimal(&self.amount, "amount")?,
            description: self.description,
            date: stored_date(&self.date, "date")?,
        })
    }
}

pub fn load_transaction(conn: &Connection, owner_id: i64, id: i64) -> Result<Transaction> {
    let row = conn
        .query_row(
            "SELECT t.id, t.account_id, t.target_account_id, t.category_id, t.recurring_id,
                    t.kind, t.amount, t.description, t.date
             FROM transactions t JOIN accounts a ON t.account_id = a.id
             WHERE t.id=?1 AND a.owner_id=?2",
            params![id, owner_id],
            |r| {
                Ok(TxRow {
                    id: r.get(0)?,
                    account_id: r.get(1)?,
                    target_account_id: r.get(2)?,
                    category_id: r.get(3)?,
                    recurring_id: r.get(4)?,
                    kind: r.get(5)?,
                    amount: r.get(6)?,
                    description: r.get(7)?,
                    date: r.get(8)?,
                })
            },
        )
        .optional()?;
    row.ok_or_else(|| LedgerError::NotFound(format!("Transaction {} not found", id)))?
        .into_transaction()
}

/// Read-modify-write of the cached balance. Callers hold a write
/// transaction, which serializes concurrent shifts on the same account.
pub(crate) fn shift_balance(conn: &Connection, account_id: i64, delta: Decimal) -> Result<()> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )
        .optional()?;
    let stored =
        stored.ok_or_else(|| LedgerError::NotFound(format!("Account {} not found", account_id)))?;
    let balance = stored_decimal(&stored, "balance")?;
    conn.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![(balance + delta).to_string(), account_id],
    )?;
    Ok(())
}

pub fn load_account(conn: &Connection, owner_id: i64, account_id: i64) -> Result<Account> {
    let row = conn
        .query_row(
            "SELECT id, owner_id, name, type, balance, opening_balance, currency
             FROM accounts WHERE id=?1 AND owner_id=?2",
            params![account_id, owner_id],
            read_account_row,
        )
        .optional()?;
    row.ok_or_else(|| LedgerError::NotFound(format!("Account {} not found", account_id)))?
        .into_account()
}

pub fn list_accounts(conn: &Connection, owner_id: i64) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, name, type, balance, opening_balance, currency
         FROM accounts WHERE owner_id=?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![owner_id], read_account_row)?;
    let mut accounts = Vec::new();
    for row in rows {
        accounts.push(row?.into_account()?);
    }
    Ok(accounts)
}

struct AccountRow {
    id: i64,
    owner_id: i64,
    name: String,
    r#type: String,
    balance: String,
    opening_balance: String,
    currency: String,
}

fn read_account_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        name: r.get(2)?,
        r#type: r.get(3)?,
        balance: r.get(4)?,
        opening_balance: r.get(5)?,
        currency: r.get(6)?,
    })
}

impl AccountRow {
    fn into_account(self) -> Result<Account> {
        Ok(Account {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            r#type: self.r#type,
            balance: stored_decimal(&self.balance, "balance")?,
            opening_balance: stored_decimal(&self.opening_balance, "opening_balance")?,
            currency: self.currency,
        })
    }
}

pub(crate) fn ensure_account(conn: &Connection, owner_id: i64, account_id: i64) -> Result<()> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT id FROM accounts WHERE id=?1 AND owner_id=?2",
            params![account_id, owner_id],
            |r| r.get(0),
        )
        .optional()?;
    if hit.is_none() {
        return Err(LedgerError::NotFound(format!(
            "Account {} not found",
            account_id
        )));
    }
    Ok(())
}
