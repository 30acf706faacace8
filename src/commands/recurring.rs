// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::core::schedule::{self, NewRecurringRule, RecurringPatch};
use crate::models::{Frequency, TxKind};
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
        Some(("process", sub)) => process(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let account_id = id_for_account(conn, owner_id, sub.get_one::<String>("account").unwrap())?;
    let kind: TxKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let frequency: Frequency = sub.get_one::<String>("frequency").unwrap().parse()?;
    let start_date = match sub.get_one::<String>("start") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let end_date = match sub.get_one::<String>("end") {
        Some(d) => Some(parse_date(d)?),
        None => None,
    };
    let category_id = match sub.get_one::<String>("category") {
        Some(cat) => Some(id_for_category(conn, owner_id, cat)?),
        None => None,
    };

    let rule = schedule::create_rule(
        conn,
        owner_id,
        &NewRecurringRule {
            account_id,
            category_id,
            kind,
            amount,
            description: sub.get_one::<String>("desc").unwrap().to_string(),
            frequency,
            start_date,
            end_date,
            occurrences_limit: sub.get_one::<i64>("limit").copied(),
        },
    )?;
    println!(
        "Added {} recurring rule {} ({} {}), first due {}",
        rule.kind, rule.id, rule.amount, rule.frequency, rule.next_occurrence
    );
    Ok(())
}

#[derive(Serialize)]
struct RuleRow {
    id: i64,
    kind: String,
    amount: String,
    frequency: String,
    next_occurrence: String,
    occurrences: String,
    end_date: String,
    active: bool,
    description: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let rules = schedule::list_rules(conn, owner_id)?;
    let data: Vec<RuleRow> = rules
        .iter()
        .map(|r| RuleRow {
            id: r.id,
            kind: r.kind.to_string(),
            amount: r.amount.to_string(),
            frequency: r.frequency.to_string(),
            next_occurrence: r.next_occurrence.to_string(),
            occurrences: match r.occurrences_limit {
                Some(limit) => format!("{}/{}", r.occurrences_count, limit),
                None => r.occurrences_count.to_string(),
            },
            end_date: r.end_date.map(|d| d.to_string()).unwrap_or_default(),
            active: r.is_active,
            description: r.description.clone(),
        })
        .collect();

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.kind,
                    r.amount,
                    r.frequency,
                    r.next_occurrence,
                    r.occurrences,
                    r.end_date,
                    if r.active { "yes".into() } else { "no".into() },
                    r.description,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Kind", "Amount", "Frequency", "Next", "Occurrences", "End", "Active", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

fn process(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let today = match sub.get_one::<String>("today") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };

    let materialized = schedule::process_due(conn, owner_id, today)?;
    if materialized.is_empty() {
        println!("No recurring transactions due");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = materialized
        .iter()
        .map(|t| {
            vec![
                t.date.to_string(),
                t.kind.to_string(),
                t.amount.to_string(),
                t.description.clone(),
            ]
        })
        .collect();
    println!("Materialized {} transaction(s)", materialized.len());
    println!(
        "{}",
        pretty_table(&["Date", "Kind", "Amount", "Description"], rows)
    );
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let mut patch = RecurringPatch::default();
    if let Some(kind) = sub.get_one::<String>("kind") {
        patch.kind = Some(kind.parse::<TxKind>()?);
    }
    if let Some(amount) = sub.get_one::<String>("amount") {
        patch.amount = Some(parse_decimal(amount)?);
    }
    if let Some(frequency) = sub.get_one::<String>("frequency") {
        patch.frequency = Some(frequency.parse::<Frequency>()?);
    }
    if let Some(start) = sub.get_one::<String>("start") {
        patch.start_date = Some(parse_date(start)?);
    }
    if let Some(end) = sub.get_one::<String>("end") {
        patch.end_date = Some(parse_date(end)?);
    }
    if let Some(limit) = sub.get_one::<i64>("limit") {
        patch.occurrences_limit = Some(*limit);
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        patch.category_id = Some(id_for_category(conn, owner_id, cat)?);
    }
    if let Some(desc) = sub.get_one::<String>("desc") {
        patch.description = Some(desc.to_string());
    }
    let rule = schedule::update_rule(conn, owner_id, id, &patch)?;
    println!(
        "Updated recurring rule {}, next due {}",
        rule.id, rule.next_occurrence
    );
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    schedule::delete_rule(conn, owner_id, id)?;
    println!("Deleted recurring rule {}", id);
    Ok(())
}
