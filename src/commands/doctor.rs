// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use super::output_flags;
use crate::ledger::{check_transfer_links, reconcile};
use crate::models::UserId;
use crate::utils::{maybe_print_json, pretty_table};

#[derive(Debug, Serialize)]
pub struct Issue {
    pub issue: &'static str,
    pub detail: String,
}

pub fn find_issues(conn: &Connection, owner: UserId) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    for check in reconcile(conn, owner)? {
        if !check.is_consistent() {
            issues.push(Issue {
                issue: "balance_drift",
                detail: format!(
                    "{}: stored {} but transactions give {} (off by {})",
                    check.account_name,
                    check.stored,
                    check.expected,
                    check
                        .drift()
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "more than can be represented".to_string())
                ),
            });
        }
    }

    for link in check_transfer_links(conn, owner)? {
        issues.push(Issue {
            issue: "broken_transfer",
            detail: format!("transfer {}: {}", link.transfer_id, link.detail),
        });
    }

    Ok(issues)
}

pub fn handle(conn: &Connection, owner: UserId, m: &clap::ArgMatches) -> Result<()> {
    let (json, jsonl) = output_flags(m);
    let issues = find_issues(conn, owner)?;
    if maybe_print_json(json, jsonl, &issues)? {
        return Ok(());
    }
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.issue.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
