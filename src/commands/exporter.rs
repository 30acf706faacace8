// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::id_for_owner;
use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        _ => Ok(()),
    }
}

fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut sql = String::from(
        "SELECT t.date, a.name as account, t.kind, t.amount, a.currency, c.name as category,
                ta.name as target, t.description
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
    sql.push_str(" ORDER BY t.date, t.id");

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let rows = stmt.query_map(rusqlite::params_from_iter(params), |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, Option<String>>(5)?,
            r.get::<_, Option<String>>(6)?,
            r.get::<_, String>(7)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "date",
                "account",
                "kind",
                "amount",
                "currency",
                "category",
                "target",
                "description",
            ])?;
            for row in rows {
                let (d, a, k, amt, ccy, cat, target, desc) = row?;
                wtr.write_record([
                    d,
                    a,
                    k,
                    amt,
                    ccy,
                    cat.unwrap_or_default(),
                    target.unwrap_or_default(),
                    desc,
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (d, a, k, amt, ccy, cat, target, desc) = row?;
                items.push(json!({
                    "date": d, "account": a, "kind": k, "amount": amt, "currency": ccy,
                    "category": cat, "target": target, "description": desc
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
        }
    }
    println!("Exported transactions to {}", out);
    Ok(())
}
