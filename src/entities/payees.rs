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
use crate::models::{NewPayee, Payee, PayeeId, PayeePatch, UserId};
use crate::utils::{non_blank, required_name};

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

const PAYEE_COLUMNS: &str = "id, user_id, name, email, phone, address, created_at, updated_at";

fn map_row_to_payee(row: &rusqlite::Row) -> rusqlite::Result<Payee> {
    Ok(Payee {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn check_email(email: Option<&str>) -> Result<Option<String>> {
    match non_blank(email) {
        Some(email) if !EMAIL.is_match(&email) => Err(Error::Validation(format!(
            "Invalid email address '{}'",
            email
        ))),
        email => Ok(email),
    }
}

pub fn create_payee(conn: &Connection, owner: UserId, new: &NewPayee) -> Result<Payee> {
    let name = required_name("Payee", &new.name)?;
    let email = check_email(new.email.as_deref())?;
    users::get_user(conn, owner)?;
    if name_taken(conn, "payees", owner, &name, None)? {
        return Err(Error::Validation(format!(
            "Payee '{}' already exists",
            name
        )));
    }
    conn.execute(
        "INSERT INTO payees(user_id, name, email, phone, address) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            owner,
            name,
            email,
            non_blank(new.phone.as_deref()),
            non_blank(new.address.as_deref())
        ],
    )?;
    let payee = get_payee(conn, owner, conn.last_insert_rowid())?;
    tracing::info!(payee_id = payee.id, "created payee '{}'", payee.name);
    Ok(payee)
}

pub fn get_payee(conn: &Connection, owner: UserId, id: PayeeId) -> Result<Payee> {
    let sql = format!(
        "SELECT {} FROM payees WHERE id=?1 AND user_id=?2",
        PAYEE_COLUMNS
    );
    conn.query_row(&sql, params![id, owner], map_row_to_payee)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("Payee {}", id)))
}

pub fn list_payees(conn: &Connection, owner: UserId) -> Result<Vec<Payee>> {
    let sql = format!(
        "SELECT {} FROM payees WHERE user_id=?1 ORDER BY name",
        PAYEE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let payees = stmt
        .query_map(params![owner], map_row_to_payee)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(payees)
}

pub fn update_payee(
    conn: &Connection,
    owner: UserId,
    id: PayeeId,
    patch: &PayeePatch,
) -> Result<Payee> {
    let current = get_payee(conn, owner, id)?;
    let name = match &patch.name {
        Some(name) => {
            let name = required_name("Payee", name)?;
            if name_taken(conn, "payees", owner, &name, Some(id))? {
                return Err(Error::Validation(format!(
                    "Payee '{}' already exists",
                    name
                )));
            }
            name
        }
        None => current.name,
    };
    let email = match &patch.email {
        Some(email) => check_email(email.as_deref())?,
        None => current.email,
    };
    let phone = match &patch.phone {
        Some(phone) => non_blank(phone.as_deref()),
        None => current.phone,
    };
    let address = match &patch.address {
        Some(address) => non_blank(address.as_deref()),
        None => current.address,
    };
    conn.execute(
        "UPDATE payees SET name=?1, email=?2, phone=?3, address=?4, updated_at=datetime('now')
         WHERE id=?5 AND user_id=?6",
        params![name, email, phone, address, id, owner],
    )?;
    get_payee(conn, owner, id)
}

pub fn delete_payee(conn: &Connection, owner: UserId, id: PayeeId) -> Result<()> {
    let payee = get_payee(conn, owner, id)?;
    if referenced_by_transactions(conn, "payee_id", id)? {
        return Err(Error::InvalidOperation(format!(
            "Cannot delete payee '{}' with existing transactions",
            payee.name
        )));
    }
    conn.execute(
        "DELETE FROM payees WHERE id=?1 AND user_id=?2",
        params![id, owner],
    )?;
    tracing::info!(payee_id = id, "deleted payee '{}'", payee.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup() -> (Connection, UserId) {
        let conn = db::open_in_memory().unwrap();
        let user = users::create_user(&conn, "alice").unwrap();
        (conn, user.id)
    }

    #[test]
    fn blank_contact_fields_are_stored_as_null() {
        let (conn, owner) = setup();

        let payee = create_payee(
            &conn,
            owner,
            &NewPayee {
                name: "Landlord".to_string(),
                email: Some("  ".to_string()),
                phone: Some("".to_string()),
                address: Some(" 1 Main St ".to_string()),
            },
        )
        .unwrap();

        assert_eq!(payee.email, None);
        assert_eq!(payee.phone, None);
        assert_eq!(payee.address.as_deref(), Some("1 Main St"));
    }

    #[test]
    fn rejects_malformed_email() {
        let (conn, owner) = setup();

        let err = create_payee(
            &conn,
            owner,
            &NewPayee {
                name: "Gym".to_string(),
                email: Some("not-an-email".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn patch_clears_and_sets_fields() {
        let (conn, owner) = setup();
        let payee = create_payee(
            &conn,
            owner,
            &NewPayee {
                name: "Gym".to_string(),
                email: Some("desk@gym.example".to_string()),
                phone: Some("555-0100".to_string()),
                address: None,
            },
        )
        .unwrap();

        let updated = update_payee(
            &conn,
            owner,
            payee.id,
            &PayeePatch {
                phone: Some(None),
                address: Some(Some("2 High St".to_string())),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.email.as_deref(), Some("desk@gym.example"));
        assert_eq!(updated.phone, None);
        assert_eq!(updated.address.as_deref(), Some("2 High St"));
    }
}
