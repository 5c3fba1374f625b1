// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::{AccountId, UserId};

/// Add `delta` to the stored balance of one of `owner`'s accounts.
///
/// Must run inside the unit of work of the write it accompanies; the caller
/// has already established that the account exists. An account row that
/// cannot be found here is a [`Error::ConsistencyFault`] and the caller's
/// unit of work must be abandoned.
pub fn adjust_balance(
    conn: &Connection,
    owner: UserId,
    account_id: AccountId,
    delta: Decimal,
) -> Result<()> {
    if delta.is_zero() {
        return Ok(());
    }

    let stored: Option<String> = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1 AND user_id=?2",
            params![account_id, owner],
            |r| r.get(0),
        )
        .optional()?;
    let Some(stored) = stored else {
        tracing::error!(account_id, %delta, "balance adjustment matched no account");
        return Err(Error::ConsistencyFault(format!(
            "balance of account {} was not updated",
            account_id
        )));
    };
    let current = stored.parse::<Decimal>().map_err(|_| {
        Error::ConsistencyFault(format!(
            "stored balance '{}' of account {} is not a decimal",
            stored, account_id
        ))
    })?;
    let updated = current.checked_add(delta).ok_or_else(|| {
        Error::Validation(format!(
            "balance of account {} would overflow",
            account_id
        ))
    })?;

    let rows = conn.execute(
        "UPDATE accounts SET balance=?1, updated_at=datetime('now') WHERE id=?2 AND user_id=?3",
        params![updated.to_string(), account_id, owner],
    )?;
    if rows != 1 {
        tracing::error!(account_id, rows, "balance update touched an unexpected number of rows");
        return Err(Error::ConsistencyFault(format!(
            "balance of account {} was not updated",
            account_id
        )));
    }
    tracing::debug!(account_id, %delta, balance = %updated, "adjusted balance");
    Ok(())
}
