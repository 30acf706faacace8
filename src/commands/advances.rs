// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::core::advance::{self, AdvanceFilter, NewAdvance};
use crate::models::{AdvanceStatus, Direction};
use crate::utils::{
    id_for_account, id_for_owner, maybe_print_json, parse_date, parse_decimal, pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("pay", sub)) => pay(conn, sub)?,
        Some(("summary", sub)) => summary(conn, sub)?,
        Some(("init-categories", sub)) => init_categories(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let account_id = id_for_account(conn, owner_id, sub.get_one::<String>("account").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let person = sub.get_one::<String>("person").unwrap().to_string();
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let due_date = match sub.get_one::<String>("due") {
        Some(d) => Some(parse_date(d)?),
        None => None,
    };
    let direction: Direction = sub.get_one::<String>("direction").unwrap().parse()?;

    let created = advance::create_advance(
        conn,
        owner_id,
        &NewAdvance {
            account_id,
            amount,
            description: sub.get_one::<String>("desc").unwrap().to_string(),
            person,
            date,
            due_date,
            direction,
            skip_transaction: sub.get_flag("skip-transaction"),
        },
    )?;
    match created.direction {
        Direction::Given => println!(
            "Advance {} opened: lent {} to {}",
            created.id, created.amount, created.person
        ),
        Direction::Received => println!(
            "Advance {} opened: borrowed {} from {}",
            created.id, created.amount, created.person
        ),
    }
    Ok(())
}

#[derive(Serialize)]
struct AdvanceRow {
    id: i64,
    person: String,
    direction: String,
    amount: String,
    received: String,
    status: String,
    date: String,
    due: String,
    description: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut filter = AdvanceFilter::default();
    if let Some(direction) = sub.get_one::<String>("direction") {
        filter.direction = Some(direction.parse::<Direction>()?);
    }
    if let Some(status) = sub.get_one::<String>("status") {
        filter.status = Some(status.parse::<AdvanceStatus>()?);
    }
    filter.person = sub.get_one::<String>("person").map(|s| s.to_string());

    let advances = advance::list_advances(conn, owner_id, &filter)?;
    let data: Vec<AdvanceRow> = advances
        .iter()
        .map(|a| AdvanceRow {
            id: a.id,
            person: a.person.clone(),
            direction: a.direction.to_string(),
            amount: a.amount.to_string(),
            received: a.amount_received.to_string(),
            status: a.status.to_string(),
            date: a.date.to_string(),
            due: a.due_date.map(|d| d.to_string()).unwrap_or_default(),
            description: a.description.clone(),
        })
        .collect();

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.person,
                    r.direction,
                    r.amount,
                    r.received,
                    r.status,
                    r.date,
                    r.due,
                    r.description,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Person", "Direction", "Amount", "Received", "Status", "Date", "Due", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

fn pay(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let today = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };

    let (updated, receipt) = advance::record_payment(
        conn,
        owner_id,
        id,
        amount,
        sub.get_flag("skip-transaction"),
        today,
    )?;
    if receipt.is_fully_paid {
        println!(
            "Recorded {} against advance {}; fully repaid",
            receipt.amount, updated.id
        );
    } else {
        println!(
            "Recorded {} against advance {}; {} outstanding",
            receipt.amount,
            updated.id,
            receipt.remaining.round_dp(2)
        );
    }
    Ok(())
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let direction = match sub.get_one::<String>("direction") {
        Some(d) => Some(d.parse::<Direction>()?),
        None => None,
    };

    let (people, totals) = advance::summarize(conn, owner_id, direction)?;
    if json_flag || jsonl_flag {
        maybe_print_json(
            json_flag,
            jsonl_flag,
            &serde_json::json!({ "by_person": people, "totals": totals }),
        )?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = people
        .iter()
        .map(|p| {
            vec![
                p.person.clone(),
                p.count.to_string(),
                format!("{:.2}", p.total_amount),
                format!("{:.2}", p.total_received),
                format!("{:.2}", p.total_pending),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Person", "Open", "Amount", "Received", "Pending"], rows)
    );
    println!(
        "{} advance(s): {} pending, {} partial, {} paid; {} outstanding in total",
        totals.total_advances,
        totals.count_pending,
        totals.count_partial,
        totals.count_paid,
        totals.total_pending.round_dp(2)
    );
    Ok(())
}

fn init_categories(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let created = advance::ensure_advance_categories(conn, owner_id)?;
    if created.is_empty() {
        println!("All bookkeeping categories already exist");
    } else {
        println!("Created categories: {}", created.join(", "));
    }
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    advance::delete_advance(conn, owner_id, id)?;
    println!("Deleted advance {}", id);
    Ok(())
}
