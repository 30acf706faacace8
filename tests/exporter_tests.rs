// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketledger::{cli, commands};
use rusqlite::{params, Connection};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    pocketledger::db::init_schema(&conn).unwrap();
    conn.execute("INSERT INTO owners(name) VALUES('alice')", [])
        .unwrap();
    let owner_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO accounts(owner_id, name, type, balance, opening_balance, currency)
         VALUES (?1, 'Main', 'checking', '0', '0', 'USD')",
        params![owner_id],
    )
    .unwrap();
    let acct = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO transactions(account_id, kind, amount, description, date)
         VALUES (?1, 'expense', '12.50', 'coffee', '2024-06-01')",
        params![acct],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO transactions(account_id, kind, amount, description, date)
         VALUES (?1, 'income', '100', 'salary', '2024-07-01')",
        params![acct],
    )
    .unwrap();
    conn
}

#[test]
fn csv_export_contains_header_and_rows() {
    let conn = setup();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tx.csv");
    let out_str = out.to_str().unwrap().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "pocketledger",
        "export",
        "transactions",
        "--owner",
        "alice",
        "--out",
        out_str.as_str(),
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        commands::exporter::handle(&conn, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let content = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("date,account,kind,amount"));
    assert!(lines[1].contains("coffee"));
    assert!(lines[2].contains("salary"));
}

#[test]
fn month_filter_narrows_the_export() {
    let conn = setup();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tx.csv");
    let out_str = out.to_str().unwrap().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "pocketledger",
        "export",
        "transactions",
        "--owner",
        "alice",
        "--month",
        "2024-06",
        "--out",
        out_str.as_str(),
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        commands::exporter::handle(&conn, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let content = std::fs::read_to_string(&out).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.contains("coffee"));
    assert!(!content.contains("salary"));
}
