// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::core::catalog;
use crate::utils::{get_base_currency, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    let ccy = get_base_currency(conn)?;

    let tx = conn.transaction()?;
    tx.execute("INSERT INTO owners(name) VALUES (?1)", params![name])?;
    let owner_id = tx.last_insert_rowid();
    catalog::provision_defaults(&tx, owner_id)?;
    tx.execute(
        "INSERT INTO accounts(owner_id, name, type, currency) VALUES (?1, 'Checking', 'checking', ?2)",
        params![owner_id, ccy],
    )?;
    tx.commit()?;

    println!(
        "Added owner '{}' with default categories and a Checking account ({})",
        name, ccy
    );
    Ok(())
}

#[derive(Serialize)]
struct OwnerRow {
    name: String,
    created: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut stmt = conn.prepare("SELECT name, created_at FROM owners ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(OwnerRow {
            name: r.get(0)?,
            created: r.get(1)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|r| vec![r.name, r.created])
            .collect();
        println!("{}", pretty_table(&["Owner", "Created"], rows));
    }
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let deleted = conn.execute("DELETE FROM owners WHERE name=?1", params![name])?;
    if deleted == 0 {
        anyhow::bail!("Owner '{}' not found", name);
    }
    println!("Removed owner '{}'", name);
    Ok(())
}
