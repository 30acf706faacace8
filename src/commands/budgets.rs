// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::core::budget::{self, NewBudget};
use crate::utils::{
    id_for_category, id_for_owner, maybe_print_json, month_bounds, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("status", sub)) => status(conn, sub)?,
        Some(("check", sub)) => check(conn, sub)?,
        Some(("order", sub)) => order(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let cat = sub.get_one::<String>("category").unwrap();
    let category_id = id_for_category(conn, owner_id, cat)?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let parent_id = sub.get_one::<i64>("parent").copied();

    let budget = budget::create_budget(
        conn,
        owner_id,
        &NewBudget {
            category_id,
            parent_id,
            amount,
        },
    )?;
    println!("Budget {} set for '{}' = {}", budget.id, cat, budget.amount);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let budgets = budget::list_budgets(conn, owner_id)?;
    if json_flag || jsonl_flag {
        let data: Vec<_> = budgets.iter().map(|(b, _)| b).collect();
        maybe_print_json(json_flag, jsonl_flag, &data)?;
        return Ok(());
    }
    let rows: Vec<Vec<String>> = budgets
        .into_iter()
        .map(|(b, category)| {
            vec![
                b.id.to_string(),
                category,
                b.parent_id.map(|p| p.to_string()).unwrap_or_default(),
                b.amount.to_string(),
                b.display_order.map(|o| o.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Id", "Category", "Parent", "Amount", "Order"], rows)
    );
    Ok(())
}

fn month_window(sub: &clap::ArgMatches) -> Result<(chrono::NaiveDate, chrono::NaiveDate)> {
    let anchor = match sub.get_one::<String>("month") {
        Some(month) => parse_date(&format!("{}-01", month))
            .with_context(|| format!("Invalid month '{}', expected YYYY-MM", month))?,
        None => chrono::Local::now().date_naive(),
    };
    Ok(month_bounds(anchor))
}

fn status(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let (window_start, window_end) = month_window(sub)?;

    let statuses = budget::compute_status(conn, owner_id, window_start, window_end)?;
    if !maybe_print_json(json_flag, jsonl_flag, &statuses)? {
        let rows: Vec<Vec<String>> = statuses
            .iter()
            .map(|s| {
                vec![
                    s.id.to_string(),
                    s.category_name.clone(),
                    s.parent_id.map(|p| p.to_string()).unwrap_or_default(),
                    format!("{:.2}", s.target),
                    format!("{:.2}", s.spent),
                    format!("{:.2}", s.remaining),
                    format!("{:.0}%", s.percentage),
                    if s.exceeded { "over".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Category", "Parent", "Target", "Spent", "Remaining", "Used", ""],
                rows,
            )
        );
    }
    Ok(())
}

fn check(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let cat = sub.get_one::<String>("category").unwrap();
    let category_id = id_for_category(conn, owner_id, cat)?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let today = chrono::Local::now().date_naive();

    let result = budget::check_hypothetical(conn, owner_id, category_id, amount, today)?;
    if !result.has_budget {
        println!("No budget applies to '{}'", cat);
        return Ok(());
    }
    let budget_name = result.category_name.unwrap_or_default();
    let budget_amount = result.budget_amount.unwrap_or_default();
    let current_spent = result.current_spent.unwrap_or_default();
    if result.would_exceed {
        println!(
            "Spending {} on '{}' would exceed the '{}' budget ({} of {} already spent, over by {})",
            amount,
            cat,
            budget_name,
            current_spent.round_dp(2),
            budget_amount.round_dp(2),
            result.excess_amount.unwrap_or_default().round_dp(2)
        );
    } else {
        println!(
            "Within budget '{}': {} of {} spent, {} remaining after this expense",
            budget_name,
            current_spent.round_dp(2),
            budget_amount.round_dp(2),
            (budget_amount - current_spent - amount).round_dp(2)
        );
    }
    Ok(())
}

fn order(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let raw = sub.get_one::<String>("ids").unwrap();
    let ids = raw
        .split(',')
        .map(|s| s.trim().parse::<i64>().with_context(|| format!("Invalid budget id '{}'", s)))
        .collect::<Result<Vec<i64>>>()?;
    budget::set_order(conn, owner_id, &ids)?;
    println!("Display order updated for {} budget(s)", ids.len());
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    budget::delete_budget(conn, owner_id, id)?;
    println!("Deleted budget {}", id);
    Ok(())
}
