// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use pocketledger::{cli, commands, db};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", sub)) => {
            if let Some(ccy) = sub.get_one::<String>("currency") {
                pocketledger::utils::set_base_currency(&conn, &ccy.to_uppercase())?;
            }
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("owner", sub)) => commands::owners::handle(&mut conn, sub)?,
        Some(("account", sub)) => commands::accounts::handle(&conn, sub)?,
        Some(("category", sub)) => commands::categories::handle(&mut conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, sub)?,
        Some(("recurring", sub)) => commands::recurring::handle(&mut conn, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&mut conn, sub)?,
        Some(("advance", sub)) => commands::advances::handle(&mut conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("doctor", sub)) => commands::doctor::handle(&conn, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
