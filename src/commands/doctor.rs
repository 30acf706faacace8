// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::core::ledger;
use crate::utils::{id_for_owner, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Cached balances vs replayed transaction effects. Editing a
    //    committed transaction's amount does not recompute balances, so
    //    drift shows up here.
    let owners: Vec<(i64, String)> = match m.get_one::<String>("owner") {
        Some(name) => vec![(id_for_owner(conn, name)?, name.clone())],
        None => {
            let mut stmt = conn.prepare("SELECT id, name FROM owners ORDER BY name")?;
            let found = stmt
                .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            found
        }
    };
    for (owner_id, owner_name) in &owners {
        for account in ledger::list_accounts(conn, *owner_id)? {
            let expected = account.opening_balance + replay_effects(conn, account.id)?;
            if expected != account.balance {
                rows.push(vec![
                    "balance_drift".into(),
                    format!(
                        "{}/{}: stored {} but replay gives {}",
                        owner_name, account.name, account.balance, expected
                    ),
                ]);
            }
        }
    }

    // 2) Malformed transfers
    let mut stmt =
        conn.prepare("SELECT id FROM transactions WHERE kind='transfer' AND target_account_id IS NULL")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec![
            "transfer_without_target".into(),
            format!("transaction {}", id),
        ]);
    }
    let mut stmt2 = conn
        .prepare("SELECT id FROM transactions WHERE kind!='transfer' AND target_account_id IS NOT NULL")?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec![
            "target_on_non_transfer".into(),
            format!("transaction {}", id),
        ]);
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// Sum of the signed effects every existing transaction has on an account:
/// income +, expense -, outgoing transfer -, incoming transfer +.
fn replay_effects(conn: &Connection, account_id: i64) -> Result<Decimal> {
    let mut total = Decimal::ZERO;

    let mut stmt =
        conn.prepare("SELECT kind, amount FROM transactions WHERE account_id=?1")?;
    let mut cur = stmt.query(params![account_id])?;
    while let Some(r) = cur.next()? {
        let kind: String = r.get(0)?;
        let amount_s: String = r.get(1)?;
        let amount = amount_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in transactions", amount_s))?;
        match kind.as_str() {
            "income" => total += amount,
            _ => total -= amount,
        }
    }

    let mut stmt2 = conn.prepare(
        "SELECT amount FROM transactions WHERE target_account_id=?1 AND kind='transfer'",
    )?;
    let mut cur2 = stmt2.query(params![account_id])?;
    while let Some(r) = cur2.next()? {
        let amount_s: String = r.get(0)?;
        let amount = amount_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in transactions", amount_s))?;
        total += amount;
    }

    Ok(total)
}
