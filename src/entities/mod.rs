// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Owner-scoped records that transactions point at.

pub mod accounts;
pub mod categories;
pub mod payees;
pub mod users;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::models::UserId;

/// Whether another row in `table` owned by `owner` already uses `name`.
fn name_taken(
    conn: &Connection,
    table: &'static str,
    owner: UserId,
    name: &str,
    except: Option<i64>,
) -> Result<bool> {
    let sql = format!(
        "SELECT 1 FROM {} WHERE user_id=?1 AND name=?2 AND (?3 IS NULL OR id != ?3) LIMIT 1",
        table
    );
    let hit: Option<i64> = conn
        .query_row(&sql, params![owner, name, except], |r| r.get(0))
        .optional()?;
    Ok(hit.is_some())
}

/// Whether any transaction references `id` through `column`.
fn referenced_by_transactions(conn: &Connection, column: &'static str, id: i64) -> Result<bool> {
    let sql = format!("SELECT 1 FROM transactions WHERE {}=?1 LIMIT 1", column);
    let hit: Option<i64> = conn
        .query_row(&sql, params![id], |r| r.get(0))
        .optional()?;
    Ok(hit.is_some())
}
