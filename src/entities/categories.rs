// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};

use super::{name_taken, referenced_by_transactions, users};
use crate::error::{Error, Result};
use crate::models::{Category, CategoryId, CategoryPatch, UserId};
use crate::utils::required_name;

pub const DEFAULT_COLOR: &str = "#6366f1";

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

const CATEGORY_COLUMNS: &str = "id, user_id, name, color, created_at, updated_at";

fn map_row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn check_color(color: &str) -> Result<String> {
    let color = color.trim();
    if HEX_COLOR.is_match(color) {
        Ok(color.to_string())
    } else {
        Err(Error::Validation(format!(
            "Invalid color format '{}', expected #RRGGBB",
            color
        )))
    }
}

pub fn create_category(
    conn: &Connection,
    owner: UserId,
    name: &str,
    color: Option<&str>,
) -> Result<Category> {
    let name = required_name("Category", name)?;
    let color = check_color(color.unwrap_or(DEFAULT_COLOR))?;
    users::get_user(conn, owner)?;
    if name_taken(conn, "categories", owner, &name, None)? {
        return Err(Error::Validation(format!(
            "Category '{}' already exists",
            name
        )));
    }
    conn.execute(
        "INSERT INTO categories(user_id, name, color) VALUES (?1, ?2, ?3)",
        params![owner, name, color],
    )?;
    let category = get_category(conn, owner, conn.last_insert_rowid())?;
    tracing::info!(category_id = category.id, "created category '{}'", category.name);
    Ok(category)
}

pub fn get_category(conn: &Connection, owner: UserId, id: CategoryId) -> Result<Category> {
    let sql = format!(
        "SELECT {} FROM categories WHERE id=?1 AND user_id=?2",
        CATEGORY_COLUMNS
    );
    conn.query_row(&sql, params![id, owner], map_row_to_category)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("Category {}", id)))
}

pub fn list_categories(conn: &Connection, owner: UserId) -> Result<Vec<Category>> {
    let sql = format!(
        "SELECT {} FROM categories WHERE user_id=?1 ORDER BY name",
        CATEGORY_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let categories = stmt
        .query_map(params![owner], map_row_to_category)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(categories)
}

pub fn update_category(
    conn: &Connection,
    owner: UserId,
    id: CategoryId,
    patch: &CategoryPatch,
) -> Result<Category> {
    let current = get_category(conn, owner, id)?;
    let name = match &patch.name {
        Some(name) => {
            let name = required_name("Category", name)?;
            if name_taken(conn, "categories", owner, &name, Some(id))? {
                return Err(Error::Validation(format!(
                    "Category '{}' already exists",
                    name
                )));
            }
            name
        }
        None => current.name,
    };
    let color = match &patch.color {
        Some(color) => check_color(color)?,
        None => current.color,
    };
    conn.execute(
        "UPDATE categories SET name=?1, color=?2, updated_at=datetime('now')
         WHERE id=?3 AND user_id=?4",
        params![name, color, id, owner],
    )?;
    get_category(conn, owner, id)
}

pub fn delete_category(conn: &Connection, owner: UserId, id: CategoryId) -> Result<()> {
    let category = get_category(conn, owner, id)?;
    if referenced_by_transactions(conn, "category_id", id)? {
        return Err(Error::InvalidOperation(format!(
            "Cannot delete category '{}' with existing transactions",
            category.name
        )));
    }
    conn.execute(
        "DELETE FROM categories WHERE id=?1 AND user_id=?2",
        params![id, owner],
    )?;
    tracing::info!(category_id = id, "deleted category '{}'", category.name);
    Ok(())
}
