// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Datelike, Months, NaiveDate};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {}", ccy, d.round_dp(2))
}

/// First and last day of the month containing `day`.
pub fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = day.with_day(1).unwrap_or(day);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(day);
    (first, last)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_owner(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM owners WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Owner '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_account(conn: &Connection, owner_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE owner_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![owner_id, name], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_category(conn: &Connection, owner_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE owner_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![owner_id, name], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name))?;
    Ok(id)
}

// Base currency settings: default currency for newly created accounts.
pub fn get_base_currency(conn: &Connection) -> Result<String> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='base_currency'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v.unwrap_or_else(|| "USD".to_string()))
}

pub fn set_base_currency(conn: &Connection, ccy: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('base_currency', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![ccy],
    )?;
    Ok(())
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
