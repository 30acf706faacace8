// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::core::catalog::{self, CategoryTree, NewCategory};
use crate::models::CategoryKind;
use crate::utils::{id_for_category, id_for_owner, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("tree", sub)) => tree(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("reset", sub)) => reset(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let name = sub.get_one::<String>("name").unwrap().to_string();
    let kind: CategoryKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let parent_id = match sub.get_one::<String>("parent") {
        Some(parent) => Some(id_for_category(conn, owner_id, parent)?),
        None => None,
    };
    let category = catalog::create_category(
        conn,
        owner_id,
        &NewCategory {
            name,
            kind,
            icon: sub.get_one::<String>("icon").map(|s| s.to_string()),
            color: sub.get_one::<String>("color").map(|s| s.to_string()),
            parent_id,
        },
    )?;
    println!("Added category '{}' ({})", category.name, category.kind);
    Ok(())
}

#[derive(Serialize)]
struct CategoryRow {
    id: i64,
    name: String,
    kind: String,
    parent: String,
    default: bool,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let categories = catalog::list_categories(conn, owner_id)?;
    let tree = CategoryTree::load(conn, owner_id)?;
    let data: Vec<CategoryRow> = categories
        .iter()
        .map(|c| CategoryRow {
            id: c.id,
            name: c.name.clone(),
            kind: c.kind.to_string(),
            parent: c
                .parent_id
                .and_then(|p| tree.name(p))
                .unwrap_or_default()
                .to_string(),
            default: c.is_default,
        })
        .collect();

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.name,
                    r.kind,
                    r.parent,
                    if r.default { "yes".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Id", "Name", "Kind", "Parent", "Default"], rows)
        );
    }
    Ok(())
}

fn tree(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let categories = catalog::list_categories(conn, owner_id)?;
    let tree = CategoryTree::load(conn, owner_id)?;

    for root in categories.iter().filter(|c| c.parent_id.is_none()) {
        println!("{} ({})", root.name, root.kind);
        for id in tree.descendants(root.id) {
            if id == root.id {
                continue;
            }
            let depth = tree.ancestors(id).len().saturating_sub(1);
            if let Some(name) = tree.name(id) {
                println!("{}{}", "  ".repeat(depth), name);
            }
        }
    }
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let name = sub.get_one::<String>("name").unwrap();
    let id = id_for_category(conn, owner_id, name)?;
    catalog::delete_category(conn, owner_id, id)?;
    println!("Removed category '{}'", name);
    Ok(())
}

fn reset(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = id_for_owner(conn, sub.get_one::<String>("owner").unwrap())?;
    let categories = catalog::reset_categories(conn, owner_id)?;
    println!("Reset categories ({} created)", categories.len());
    Ok(())
}
