// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::core::ledger;
use crate::utils::{
    get_base_currency, id_for_owner, maybe_print_json, parse_decimal, pretty_table,
};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let name = sub.get_one::<String>("name").unwrap();
    let typ = sub.get_one::<String>("type").unwrap();
    let ccy = match sub.get_one::<String>("currency") {
        Some(c) => c.to_uppercase(),
        None => get_base_currency(conn)?,
    };
    let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
    // The opening balance is remembered separately so `doctor` can replay
    // transaction effects against it.
    conn.execute(
        "INSERT INTO accounts(owner_id, name, type, balance, opening_balance, currency)
         VALUES (?1, ?2, ?3, ?4, ?4, ?5)",
        params![owner_id, name, typ, balance.to_string(), ccy],
    )?;
    println!("Added account '{}' ({}, {})", name, typ, ccy);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let accounts = ledger::list_accounts(conn, owner_id)?;
    if !maybe_print_json(json_flag, jsonl_flag, &accounts)? {
        let rows: Vec<Vec<String>> = accounts
            .into_iter()
            .map(|a| {
                vec![
                    a.name,
                    a.r#type,
                    format!("{:.2}", a.balance),
                    a.currency,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Name", "Type", "Balance", "Currency"], rows)
        );
    }
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let name = sub.get_one::<String>("name").unwrap();
    let deleted = conn.execute(
        "DELETE FROM accounts WHERE owner_id=?1 AND name=?2",
        params![owner_id, name],
    )?;
    if deleted == 0 {
        anyhow::bail!("Account '{}' not found", name);
    }
    println!("Removed account '{}'", name);
    Ok(())
}
