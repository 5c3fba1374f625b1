// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recompute balances from transaction history and check transfer links.

use rusqlite::{Connection, params};
use rust_decimal::Decimal;

use super::entries::fetch_transaction;
use super::transfers::list_links;
use crate::entities::accounts::list_accounts;
use crate::error::{Error, Result};
use crate::models::{AccountId, BalanceCheck, LinkIssue, TransactionKind, UserId};
use crate::utils::decimal_column;

/// `opening` plus every amount on the account, added in date order.
fn expected_balance(
    conn: &Connection,
    owner: UserId,
    account_id: AccountId,
    opening: Decimal,
) -> Result<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM transactions WHERE user_id=?1 AND account_id=?2 ORDER BY date, id",
    )?;
    let amounts = stmt
        .query_map(params![owner, account_id], |r| decimal_column(r, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    amounts
        .into_iter()
        .try_fold(opening, |total, amount| total.checked_add(amount))
        .ok_or_else(|| {
            tracing::error!(account_id, "transaction history does not fit in a decimal");
            Error::ConsistencyFault(format!(
                "transactions of account {} add up to more than can be represented",
                account_id
            ))
        })
}

/// Stored against expected balance for each of the owner's accounts, where
/// expected is the opening balance plus every transaction on the account.
pub fn reconcile(conn: &Connection, owner: UserId) -> Result<Vec<BalanceCheck>> {
    let mut checks = Vec::new();
    for account in list_accounts(conn, owner)? {
        let expected = expected_balance(conn, owner, account.id, account.opening_balance)?;
        if expected != account.balance {
            tracing::warn!(
                account_id = account.id,
                stored = %account.balance,
                %expected,
                "account balance drifted from its transactions"
            );
        }
        checks.push(BalanceCheck {
            account_id: account.id,
            account_name: account.name,
            stored: account.balance,
            expected,
        });
    }
    Ok(checks)
}

/// Links whose transactions no longer mirror the link itself.
pub fn check_transfer_links(conn: &Connection, owner: UserId) -> Result<Vec<LinkIssue>> {
    let mut issues = Vec::new();
    for link in list_links(conn, owner)? {
        let mut problem = |detail: String| {
            issues.push(LinkIssue {
                transfer_id: link.id,
                detail,
            })
        };
        let sides = [
            (
                "outgoing",
                link.from_transaction_id,
                link.from_account_id,
                -link.amount,
                TransactionKind::Expense,
            ),
            (
                "incoming",
                link.to_transaction_id,
                link.to_account_id,
                link.amount,
                TransactionKind::Income,
            ),
        ];
        for (label, id, account_id, amount, kind) in sides {
            match fetch_transaction(conn, owner, id)? {
                None => problem(format!("{} transaction {} is missing", label, id)),
                Some(t) => {
                    if t.account_id != account_id {
                        problem(format!(
                            "{} transaction {} is on account {}, expected {}",
                            label, id, t.account_id, account_id
                        ));
                    }
                    if t.amount != amount || t.kind != kind {
                        problem(format!(
                            "{} transaction {} is {} {}, expected {} {}",
                            label, id, t.kind, t.amount, kind, amount
                        ));
                    }
                }
            }
        }
    }
    Ok(issues)
}
