// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::core::ledger::{self, NewTransaction, TransactionPatch};
use crate::models::TxKind;
use crate::utils::{
    id_for_account, id_for_category, id_for_owner, maybe_print_json, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let account_name = sub.get_one::<String>("account").unwrap();
    let account_id = id_for_account(conn, owner_id, account_name)?;
    let kind: TxKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let category_id = match sub.get_one::<String>("category") {
        Some(cat) => Some(id_for_category(conn, owner_id, cat)?),
        None => None,
    };
    let target_account_id = match sub.get_one::<String>("to") {
        Some(target) => Some(id_for_account(conn, owner_id, target)?),
        None => None,
    };
    let description = sub.get_one::<String>("desc").unwrap().to_string();

    let txn = ledger::create_transaction(
        conn,
        owner_id,
        &NewTransaction {
            account_id,
            target_account_id,
            category_id,
            recurring_id: None,
            kind,
            amount,
            description,
            date,
        },
    )?;
    println!(
        "Recorded {} {} of {} on {} (acct: {})",
        txn.kind, txn.id, txn.amount, txn.date, account_name
    );
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub account: String,
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub target: String,
    pub description: String,
}

pub fn query_rows(
    conn: &Connection,
    owner_id: i64,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, a.name, t.kind, t.amount, c.name, ta.name, t.description
         FROM transactions t
         JOIN accounts a ON t.account_id=a.id
         LEFT JOIN categories c ON t.category_id=c.id
         LEFT JOIN accounts ta ON t.target_account_id=ta.id
         WHERE a.owner_id=?",
    );
    let mut params_vec: Vec<String> = vec![owner_id.to_string()];

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(month.into());
    }
    if let Some(acct) = sub.get_one::<String>("account") {
        sql.push_str(" AND a.name=?");
        params_vec.push(acct.into());
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND c.name=?");
        params_vec.push(cat.into());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let date: String = r.get(1)?;
        let account: String = r.get(2)?;
        let kind: String = r.get(3)?;
        let amount: String = r.get(4)?;
        let category: Option<String> = r.get(5)?;
        let target: Option<String> = r.get(6)?;
        let description: String = r.get(7)?;
        data.push(TransactionRow {
            id,
            date,
            account,
            kind,
            amount,
            category: category.unwrap_or_default(),
            target: target.unwrap_or_default(),
            description,
        });
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, owner_id, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.account.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.target.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Account", "Kind", "Amount", "Category", "To", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let mut patch = TransactionPatch::default();
    if let Some(amount) = sub.get_one::<String>("amount") {
        patch.amount = Some(parse_decimal(amount)?);
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        patch.category_id = Some(id_for_category(conn, owner_id, cat)?);
    }
    if let Some(desc) = sub.get_one::<String>("desc") {
        patch.description = Some(desc.to_string());
    }
    if let Some(date) = sub.get_one::<String>("date") {
        patch.date = Some(parse_date(date)?);
    }
    let txn = ledger::update_transaction(conn, owner_id, id, &patch)?;
    println!("Updated transaction {} ({} on {})", txn.id, txn.amount, txn.date);
    Ok(())
}

fn rm(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    ledger::delete_transaction(conn, owner_id, id)?;
    println!("Deleted transaction {} (balance effect reversed)", id);
    Ok(())
}
