// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Error, Result};
use crate::models::{User, UserId};
use crate::utils::{get_setting, id_for_user, required_name, set_setting};

fn map_row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

pub fn create_user(conn: &Connection, name: &str) -> Result<User> {
    let name = required_name("User", name)?;
    if find_user_by_name(conn, &name)?.is_some() {
        return Err(Error::Validation(format!(
            "User '{}' already exists",
            name
        )));
    }
    conn.execute("INSERT INTO users(name) VALUES (?1)", params![name])?;
    let user = get_user(conn, conn.last_insert_rowid())?;
    tracing::info!(user_id = user.id, "created user '{}'", user.name);
    Ok(user)
}

pub fn get_user(conn: &Connection, id: UserId) -> Result<User> {
    conn.query_row(
        "SELECT id, name, created_at FROM users WHERE id=?1",
        params![id],
        map_row_to_user,
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("User {}", id)))
}

pub fn find_user_by_name(conn: &Connection, name: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, name, created_at FROM users WHERE name=?1",
            params![name.trim()],
            map_row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, name, created_at FROM users ORDER BY name")?;
    let users = stmt
        .query_map([], map_row_to_user)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}

/// The user that commands act as when none is given explicitly.
pub fn default_user(conn: &Connection) -> Result<Option<String>> {
    get_setting(conn, "default_user")
}

pub fn set_default_user(conn: &Connection, name: &str) -> Result<()> {
    id_for_user(conn, name)?;
    set_setting(conn, "default_user", name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn names_are_unique() {
        let conn = db::open_in_memory().unwrap();
        create_user(&conn, "alice").unwrap();

        let err = create_user(&conn, " alice ").unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn default_user_must_exist() {
        let conn = db::open_in_memory().unwrap();

        assert!(matches!(
            set_default_user(&conn, "bob"),
            Err(Error::NotFound(_))
        ));

        create_user(&conn, "bob").unwrap();
        set_default_user(&conn, "bob").unwrap();
        assert_eq!(default_user(&conn).unwrap(), Some("bob".to_string()));
    }

    #[test]
    fn list_is_sorted_by_name() {
        let conn = db::open_in_memory().unwrap();
        create_user(&conn, "zoe").unwrap();
        create_user(&conn, "adam").unwrap();

        let names: Vec<String> = list_users(&conn)
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();

        assert_eq!(names, ["adam", "zoe"]);
    }
}
