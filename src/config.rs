// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::db;
use crate::logging::DEFAULT_FILTER;

pub const DB_ENV: &str = "TALLYBOOK_DB";
pub const USER_ENV: &str = "TALLYBOOK_USER";
pub const LOG_ENV: &str = "TALLYBOOK_LOG";

/// Settings resolved from command-line flags and the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    /// The acting user; falls back to the `default_user` setting.
    pub user: Option<String>,
    pub log_filter: String,
}

impl Config {
    pub fn from_matches(m: &clap::ArgMatches) -> Result<Self> {
        let db_path = match m.get_one::<String>("db") {
            Some(p) => PathBuf::from(p.trim()),
            None => db::default_db_path()?,
        };
        let user = m
            .get_one::<String>("user")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let log_filter = match m.get_count("verbose") {
            0 => env::var(LOG_ENV)
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| DEFAULT_FILTER.to_string()),
            1 => "tallybook=info".to_string(),
            _ => "tallybook=debug".to_string(),
        };
        Ok(Self {
            db_path,
            user,
            log_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;

    #[test]
    fn flags_override_defaults() {
        let m = cli::build_cli().get_matches_from([
            "tallybook",
            "--db",
            " /tmp/ledger.sqlite ",
            "--user",
            "alice",
            "-vv",
            "doctor",
        ]);

        let config = Config::from_matches(&m).unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/ledger.sqlite"));
        assert_eq!(config.user.as_deref(), Some("alice"));
        assert_eq!(config.log_filter, "tallybook=debug");
    }

    #[test]
    fn blank_user_is_ignored() {
        let m = cli::build_cli().get_matches_from([
            "tallybook",
            "--db",
            "ledger.sqlite",
            "--user",
            "  ",
            "doctor",
        ]);

        let config = Config::from_matches(&m).unwrap();

        assert_eq!(config.user, None);
    }
}
