// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::{AccountId, CategoryId, PayeeId, UserId};

pub const DEFAULT_CURRENCY: &str = "USD";

static CURRENCY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", s)))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_| Error::Validation(format!("Invalid decimal '{}'", s)))
}

pub fn parse_day_of_month(field: &str, s: &str) -> Result<u8> {
    let day: u8 = s
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("Invalid {} '{}'", field, s)))?;
    check_day_of_month(field, day)?;
    Ok(day)
}

pub fn check_day_of_month(field: &str, day: u8) -> Result<()> {
    if (1..=31).contains(&day) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must be between 1 and 31, got {}",
            field, day
        )))
    }
}

/// Upper-case and check a three letter currency code.
pub fn normalize_currency(s: &str) -> Result<String> {
    let ccy = s.trim().to_uppercase();
    if CURRENCY_CODE.is_match(&ccy) {
        Ok(ccy)
    } else {
        Err(Error::Validation(format!(
            "Invalid currency '{}', expected a three letter code such as USD",
            s
        )))
    }
}

/// Trim free text and turn blank input into `None`.
pub fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

pub fn required_name(field: &str, s: &str) -> Result<String> {
    non_blank(Some(s)).ok_or_else(|| Error::Validation(format!("{} name is required", field)))
}

/// Read a decimal stored as TEXT.
pub fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn opt_decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| {
        s.parse::<Decimal>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
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

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> anyhow::Result<bool> {
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

pub fn id_for_user(conn: &Connection, name: &str) -> Result<UserId> {
    conn.query_row(
        "SELECT id FROM users WHERE name=?1",
        params![name.trim()],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("User '{}'", name.trim())))
}

pub fn id_for_account(conn: &Connection, owner: UserId, name: &str) -> Result<AccountId> {
    conn.query_row(
        "SELECT id FROM accounts WHERE user_id=?1 AND name=?2",
        params![owner, name.trim()],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("Account '{}'", name.trim())))
}

pub fn id_for_category(conn: &Connection, owner: UserId, name: &str) -> Result<CategoryId> {
    conn.query_row(
        "SELECT id FROM categories WHERE user_id=?1 AND name=?2",
        params![owner, name.trim()],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("Category '{}'", name.trim())))
}

pub fn id_for_payee(conn: &Connection, owner: UserId, name: &str) -> Result<PayeeId> {
    conn.query_row(
        "SELECT id FROM payees WHERE user_id=?1 AND name=?2",
        params![owner, name.trim()],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("Payee '{}'", name.trim())))
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn get_default_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "default_currency")?.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
}

pub fn set_default_currency(conn: &Connection, ccy: &str) -> Result<()> {
    let ccy = normalize_currency(ccy)?;
    set_setting(conn, "default_currency", &ccy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn parse_date_rejects_impossible_days() {
        assert!(parse_date("2025-02-30").is_err());
        assert_eq!(
            parse_date(" 2024-02-29 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn currency_codes_are_upper_cased() {
        assert_eq!(normalize_currency(" eur ").unwrap(), "EUR");
        assert!(normalize_currency("EURO").is_err());
        assert!(normalize_currency("U5D").is_err());
    }

    #[test]
    fn day_of_month_bounds() {
        assert_eq!(parse_day_of_month("payment_due_date", "31").unwrap(), 31);
        assert!(parse_day_of_month("payment_due_date", "0").is_err());
        assert!(parse_day_of_month("payment_due_date", "32").is_err());
    }

    #[test]
    fn blank_text_becomes_none() {
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(Some(" rent ")), Some("rent".to_string()));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn default_currency_falls_back_to_usd() {
        let conn = db::open_in_memory().unwrap();
        assert_eq!(get_default_currency(&conn).unwrap(), "USD");

        set_default_currency(&conn, "nzd").unwrap();
        assert_eq!(get_default_currency(&conn).unwrap(), "NZD");
    }

    #[test]
    fn money_is_shown_with_two_places() {
        assert_eq!(fmt_money(&Decimal::new(12346, 3), "USD"), "USD 12.35");
        assert_eq!(fmt_money(&Decimal::new(-5, 0), "EUR"), "EUR -5.00");
    }
}
