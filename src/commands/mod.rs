// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod categories;
pub mod doctor;
pub mod payees;
pub mod transactions;
pub mod transfers;
pub mod users;

use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use rusqlite::Connection;

use crate::entities::users::default_user;
use crate::models::UserId;
use crate::utils::{id_for_user, non_blank};

/// The user every owner-scoped command acts as: `--user`/`TALLYBOOK_USER`
/// first, then the `default_user` setting.
pub fn resolve_owner(conn: &Connection, user: Option<&str>) -> Result<UserId> {
    let name = match user {
        Some(name) => name.to_string(),
        None => match default_user(conn)? {
            Some(name) => name,
            None => bail!(
                "No user selected. Create one with `tallybook user add --name NAME --default` or pass --user"
            ),
        },
    };
    Ok(id_for_user(conn, &name)?)
}

pub(crate) fn arg<'a>(m: &'a ArgMatches, name: &str) -> Option<&'a str> {
    m.get_one::<String>(name).map(String::as_str)
}

pub(crate) fn required<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a str> {
    arg(m, name).ok_or_else(|| anyhow!("--{} is required", name))
}

/// `None` when the flag is absent, `Some(None)` when it was given a blank
/// value, which clears the field.
pub(crate) fn clearable(m: &ArgMatches, name: &str) -> Option<Option<String>> {
    arg(m, name).map(|v| non_blank(Some(v)))
}

pub(crate) fn parse_id(s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid id '{}'", s))
}

pub(crate) fn output_flags(m: &ArgMatches) -> (bool, bool) {
    (m.get_flag("json"), m.get_flag("jsonl"))
}

pub(crate) fn or_dash(v: Option<&str>) -> String {
    v.unwrap_or("-").to_string()
}
