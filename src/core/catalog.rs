// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Category catalog: the owner-scoped category hierarchy, loaded into an
//! in-memory adjacency arena for traversal, plus the default seed tree
//! provisioned for every new owner.
//!
//! The budget tree is a separate, flatter structure; see `core::budget`.

use std::collections::{HashMap, HashSet};

use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::{LedgerError, Result};
use crate::models::{Category, CategoryKind};

pub struct CategorySeed {
    pub name: &'static str,
    pub kind: CategoryKind,
    pub icon: &'static str,
    pub color: &'static str,
    pub children: &'static [&'static str],
}

/// Default categories provisioned for each new owner. Children inherit the
/// parent's icon and color.
pub const DEFAULT_CATEGORIES: &[CategorySeed] = &[
    CategorySeed {
        name: "Food",
        kind: CategoryKind::Expense,
        icon: "cart",
        color: "#ef4444",
        children: &["Groceries", "Restaurants", "Fast food", "Delivery"],
    },
    CategorySeed {
        name: "Transport",
        kind: CategoryKind::Expense,
        icon: "car",
        color: "#f59e0b",
        children: &["Fuel", "Public transit", "Taxi", "Vehicle upkeep"],
    },
    CategorySeed {
        name: "Housing",
        kind: CategoryKind::Expense,
        icon: "home",
        color: "#eab308",
        children: &["Rent", "Utilities", "Home insurance", "Renovation"],
    },
    CategorySeed {
        name: "Health",
        kind: CategoryKind::Expense,
        icon: "pill",
        color: "#22c55e",
        children: &["Doctor", "Pharmacy", "Health insurance"],
    },
    CategorySeed {
        name: "Leisure",
        kind: CategoryKind::Expense,
        icon: "gamepad",
        color: "#14b8a6",
        children: &["Outings", "Sport", "Video games", "Culture"],
    },
    CategorySeed {
        name: "Shopping",
        kind: CategoryKind::Expense,
        icon: "bag",
        color: "#06b6d4",
        children: &["Clothing", "Electronics", "Furniture"],
    },
    CategorySeed {
        name: "Subscriptions",
        kind: CategoryKind::Expense,
        icon: "repeat",
        color: "#3b82f6",
        children: &["Streaming", "Phone", "Internet"],
    },
    CategorySeed {
        name: "Education",
        kind: CategoryKind::Expense,
        icon: "book",
        color: "#6366f1",
        children: &["Courses", "Books", "Supplies"],
    },
    CategorySeed {
        name: "Gifts",
        kind: CategoryKind::Expense,
        icon: "gift",
        color: "#8b5cf6",
        children: &[],
    },
    CategorySeed {
        name: "Travel",
        kind: CategoryKind::Expense,
        icon: "plane",
        color: "#a855f7",
        children: &["Lodging", "Tickets", "Activities"],
    },
    CategorySeed {
        name: "Other expenses",
        kind: CategoryKind::Expense,
        icon: "money",
        color: "#ec4899",
        children: &[],
    },
    CategorySeed {
        name: "Salary",
        kind: CategoryKind::Income,
        icon: "salary",
        color: "#22c55e",
        children: &[],
    },
    CategorySeed {
        name: "Freelance",
        kind: CategoryKind::Income,
        icon: "briefcase",
        color: "#10b981",
        children: &["Missions", "Consulting"],
    },
    CategorySeed {
        name: "Investments",
        kind: CategoryKind::Income,
        icon: "chart",
        color: "#14b8a6",
        children: &["Dividends", "Capital gains"],
    },
    CategorySeed {
        name: "Repayments",
        kind: CategoryKind::Income,
        icon: "refresh",
        color: "#06b6d4",
        children: &[],
    },
    CategorySeed {
        name: "Gifts received",
        kind: CategoryKind::Income,
        icon: "gift",
        color: "#0ea5e9",
        children: &[],
    },
    CategorySeed {
        name: "Other income",
        kind: CategoryKind::Income,
        icon: "plus",
        color: "#3b82f6",
        children: &[],
    },
];

/// Inserts the default category tree for an owner.
pub fn provision_defaults(conn: &Connection, owner_id: i64) -> Result<()> {
    for seed in DEFAULT_CATEGORIES {
        conn.execute(
            "INSERT INTO categories(owner_id, parent_id, name, kind, icon, color, is_default)
             VALUES (?1, NULL, ?2, ?3, ?4, ?5, 1)",
            params![owner_id, seed.name, seed.kind.as_str(), seed.icon, seed.color],
        )?;
        let parent_id = conn.last_insert_rowid();
        for child in seed.children {
            conn.execute(
                "INSERT INTO categories(owner_id, parent_id, name, kind, icon, color, is_default)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
                params![owner_id, parent_id, child, seed.kind.as_str(), seed.icon, seed.color],
            )?;
        }
    }
    Ok(())
}

pub struct NewCategory {
    pub name: String,
    pub kind: CategoryKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<i64>,
}

pub fn create_category(conn: &Connection, owner_id: i64, new: &NewCategory) -> Result<Category> {
    if let Some(parent_id) = new.parent_id {
        let parent_kind: Option<String> = conn
            .query_row(
                "SELECT kind FROM categories WHERE id=?1 AND owner_id=?2",
                params![parent_id, owner_id],
                |r| r.get(0),
            )
            .optional()?;
        let parent_kind = parent_kind.ok_or_else(|| {
            LedgerError::NotFound(format!("Parent category {} not found", parent_id))
        })?;
        if parent_kind != new.kind.as_str() {
            return Err(LedgerError::InvalidArgument(
                "A child category must have the same kind as its parent".into(),
            ));
        }
    }

    conn.execute(
        "INSERT INTO categories(owner_id, parent_id, name, kind, icon, color, is_default)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
        params![
            owner_id,
            new.parent_id,
            new.name,
            new.kind.as_str(),
            new.icon,
            new.color
        ],
    )?;
    load_category(conn, owner_id, conn.last_insert_rowid())
}

/// Deletes a category. Children are orphaned (parent pointer nulled),
/// transactions and recurring rules lose their category reference, and
/// budgets bound to the category are dropped, all via the schema's
/// referential actions.
pub fn delete_category(conn: &Connection, owner_id: i64, id: i64) -> Result<()> {
    let deleted = conn.execute(
        "DELETE FROM categories WHERE id=?1 AND owner_id=?2",
        params![id, owner_id],
    )?;
    if deleted == 0 {
        return Err(LedgerError::NotFound(format!("Category {} not found", id)));
    }
    Ok(())
}

/// Wipes the owner's categories (and with them, budgets) and re-provisions
/// the default tree. Transactions and recurrences keep their rows but lose
/// their category references.
pub fn reset_categories(conn: &mut Connection, owner_id: i64) -> Result<Vec<Category>> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM budgets WHERE owner_id=?1", params![owner_id])?;
    tx.execute("DELETE FROM categories WHERE owner_id=?1", params![owner_id])?;
    provision_defaults(&tx, owner_id)?;
    tx.commit()?;
    list_categories(conn, owner_id)
}

pub fn list_categories(conn: &Connection, owner_id: i64) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, parent_id, name, kind, icon, color, is_default
         FROM categories WHERE owner_id=?1
         ORDER BY parent_id IS NOT NULL, name",
    )?;
    let rows = stmt.query_map(params![owner_id], read_category_row)?;
    let mut categories = Vec::new();
    for row in rows {
        categories.push(row?.into_category()?);
    }
    Ok(categories)
}

pub fn load_category(conn: &Connection, owner_id: i64, id: i64) -> Result<Category> {
    let row = conn
        .query_row(
            "SELECT id, owner_id, parent_id, name, kind, icon, color, is_default
             FROM categories WHERE id=?1 AND owner_id=?2",
            params![id, owner_id],
            read_category_row,
        )
        .optional()?;
    row.ok_or_else(|| LedgerError::NotFound(format!("Category {} not found", id)))?
        .into_category()
}

struct CategoryRow {
    id: i64,
    owner_id: i64,
    parent_id: Option<i64>,
    name: String,
    kind: String,
    icon: Option<String>,
    color: Option<String>,
    is_default: bool,
}

fn read_category_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<CategoryRow> {
    Ok(CategoryRow {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        parent_id: r.get(2)?,
        name: r.get(3)?,
        kind: r.get(4)?,
        icon: r.get(5)?,
        color: r.get(6)?,
        is_default: r.get(7)?,
    })
}

impl CategoryRow {
    fn into_category(self) -> Result<Category> {
        Ok(Category {
            id: self.id,
            owner_id: self.owner_id,
            parent_id: self.parent_id,
            name: self.name,
            kind: self.kind.parse()?,
            icon: self.icon,
            color: self.color,
            is_default: self.is_default,
        })
    }
}

struct Node {
    parent_id: Option<i64>,
    children: Vec<i64>,
    name: String,
    kind: CategoryKind,
}

/// Adjacency arena over one owner's categories, built per request instead
/// of relying on recursive query support in the store.
pub struct CategoryTree {
    nodes: HashMap<i64, Node>,
}

impl CategoryTree {
    pub fn load(conn: &Connection, owner_id: i64) -> Result<CategoryTree> {
        let mut nodes: HashMap<i64, Node> = HashMap::new();
        {
            let mut stmt = conn
                .prepare("SELECT id, parent_id, name, kind FROM categories WHERE owner_id=?1")?;
            let mut rows = stmt.query(params![owner_id])?;
            while let Some(r) = rows.next()? {
                let id: i64 = r.get(0)?;
                let parent_id: Option<i64> = r.get(1)?;
                let name: String = r.get(2)?;
                let kind: String = r.get(3)?;
                nodes.insert(
                    id,
                    Node {
                        parent_id,
                        children: Vec::new(),
                        name,
                        kind: kind.parse()?,
                    },
                );
            }
        }
        let edges: Vec<(i64, i64)> = nodes
            .iter()
            .filter_map(|(id, n)| n.parent_id.map(|p| (p, *id)))
            .collect();
        for (parent, child) in edges {
            if let Some(node) = nodes.get_mut(&parent) {
                node.children.push(child);
            }
        }
        Ok(CategoryTree { nodes })
    }

    pub fn contains(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn name(&self, id: i64) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.name.as_str())
    }

    pub fn kind(&self, id: i64) -> Option<CategoryKind> {
        self.nodes.get(&id).map(|n| n.kind)
    }

    /// The category and every descendant below it, depth-first.
    /// Unknown ids yield an empty set.
    pub fn descendants(&self, id: i64) -> Vec<i64> {
        if !self.nodes.contains_key(&id) {
            return Vec::new();
        }
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        let mut out = Vec::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            out.push(current);
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().copied());
            }
        }
        out
    }

    /// The category followed by its ancestor chain, nearest first.
    pub fn ancestors(&self, id: i64) -> Vec<i64> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            if !self.nodes.contains_key(&c) || !seen.insert(c) {
                break;
            }
            out.push(c);
            current = self.nodes.get(&c).and_then(|n| n.parent_id);
        }
        out
    }
}
