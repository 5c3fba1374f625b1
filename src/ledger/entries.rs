// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Simple (non-transfer) transactions and the balance bookkeeping that goes
//! with creating, editing and deleting them.

use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use super::balance::adjust_balance;
use super::index::TransferIndex;
use super::transfers;
use crate::db;
use crate::entities::{accounts, categories, payees};
use crate::error::{Error, Result};
use crate::models::{
    AccountId, CategoryId, NewTransaction, Page, PayeeId, Transaction, TransactionDetails,
    TransactionFilter, TransactionId, TransactionKind, TransactionPatch, UserId,
};
use crate::utils::{decimal_column, non_blank};

const TRANSACTION_COLUMNS: &str = "t.id, t.user_id, t.account_id, t.category_id, t.payee_id, \
     t.amount, t.type, t.description, t.notes, t.date, t.created_at, t.updated_at";

const DETAIL_JOINS: &str = "FROM transactions t
     JOIN accounts a ON a.id = t.account_id
     LEFT JOIN categories c ON c.id = t.category_id
     LEFT JOIN payees p ON p.id = t.payee_id";

const FILTER_CLAUSE: &str = "t.user_id = ?1
     AND (?2 IS NULL OR t.account_id = ?2)
     AND (?3 IS NULL OR t.category_id = ?3)
     AND (?4 IS NULL OR t.payee_id = ?4)
     AND (?5 IS NULL OR t.type = ?5)
     AND (?6 IS NULL OR t.date >= ?6)
     AND (?7 IS NULL OR t.date <= ?7)";

const MAX_PAGE_SIZE: u32 = 500;

pub(crate) fn map_row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        account_id: row.get(2)?,
        category_id: row.get(3)?,
        payee_id: row.get(4)?,
        amount: decimal_column(row, 5)?,
        kind: row.get(6)?,
        description: row.get(7)?,
        notes: row.get(8)?,
        date: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Columns of a transaction row as written by the engine. The amount is
/// already signed.
pub(crate) struct EntryRow<'a> {
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub payee_id: Option<PayeeId>,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub description: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub date: NaiveDate,
}

/// Insert a transaction row without touching any balance.
pub(crate) fn insert_entry(conn: &Connection, owner: UserId, row: &EntryRow) -> Result<Transaction> {
    conn.execute(
        "INSERT INTO transactions(user_id, account_id, category_id, payee_id, amount, type,
             description, notes, date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            owner,
            row.account_id,
            row.category_id,
            row.payee_id,
            row.amount.to_string(),
            row.kind,
            row.description,
            row.notes,
            row.date
        ],
    )?;
    let id = conn.last_insert_rowid();
    fetch_transaction(conn, owner, id)?
        .ok_or_else(|| Error::ConsistencyFault(format!("transaction {} was not stored", id)))
}

pub(crate) fn fetch_transaction(
    conn: &Connection,
    owner: UserId,
    id: TransactionId,
) -> Result<Option<Transaction>> {
    let sql = format!(
        "SELECT {} FROM transactions t WHERE t.id=?1 AND t.user_id=?2",
        TRANSACTION_COLUMNS
    );
    let transaction = conn
        .query_row(&sql, params![id, owner], map_row_to_transaction)
        .optional()?;
    Ok(transaction)
}

pub fn get_transaction(conn: &Connection, owner: UserId, id: TransactionId) -> Result<Transaction> {
    fetch_transaction(conn, owner, id)?
        .ok_or_else(|| Error::NotFound(format!("Transaction {}", id)))
}

/// Check that every reference resolves to one of `owner`'s records.
fn check_references(
    conn: &Connection,
    owner: UserId,
    account_id: Option<AccountId>,
    category_id: Option<CategoryId>,
    payee_id: Option<PayeeId>,
) -> Result<()> {
    if let Some(id) = account_id {
        accounts::get_account(conn, owner, id)?;
    }
    if let Some(id) = category_id {
        categories::get_category(conn, owner, id)?;
    }
    if let Some(id) = payee_id {
        payees::get_payee(conn, owner, id)?;
    }
    Ok(())
}

fn check_amount(amount: Decimal) -> Result<()> {
    if amount.is_zero() {
        Err(Error::Validation("Amount must not be zero".to_string()))
    } else {
        Ok(())
    }
}

/// Balance adjustments that turn `old_amount` on `old_account` into
/// `new_amount` on `new_account`.
pub(crate) fn balance_moves(
    old_account: AccountId,
    old_amount: Decimal,
    new_account: AccountId,
    new_amount: Decimal,
) -> Result<Vec<(AccountId, Decimal)>> {
    if old_account != new_account {
        return Ok(vec![(old_account, -old_amount), (new_account, new_amount)]);
    }
    let delta = new_amount.checked_sub(old_amount).ok_or_else(|| {
        Error::Validation(format!(
            "changing the amount from {} to {} would overflow",
            old_amount, new_amount
        ))
    })?;
    if delta.is_zero() {
        Ok(Vec::new())
    } else {
        Ok(vec![(old_account, delta)])
    }
}

/// Record a deposit or withdrawal and move the account balance with it.
pub fn create_transaction(
    conn: &mut Connection,
    owner: UserId,
    new: &NewTransaction,
) -> Result<Transaction> {
    check_amount(new.amount)?;
    let kind = new.direction.kind();
    let amount = kind.signed(new.amount);
    let description = non_blank(new.description.as_deref());
    let notes = non_blank(new.notes.as_deref());

    let tx = db::begin(conn)?;
    check_references(
        &tx,
        owner,
        Some(new.account_id),
        new.category_id,
        new.payee_id,
    )?;
    let created = insert_entry(
        &tx,
        owner,
        &EntryRow {
            account_id: new.account_id,
            category_id: new.category_id,
            payee_id: new.payee_id,
            amount,
            kind,
            description: description.as_deref(),
            notes: notes.as_deref(),
            date: new.date,
        },
    )?;
    adjust_balance(&tx, owner, new.account_id, amount)?;
    tx.commit()?;

    tracing::info!(
        transaction_id = created.id,
        account_id = created.account_id,
        "recorded {} of {}",
        kind,
        amount
    );
    Ok(created)
}

/// Apply `patch` to a simple transaction, moving balances by the net change.
///
/// The new amount is always derived the same way: the magnitude comes from
/// the patch or the stored amount, the sign from the patched direction or the
/// stored kind. Moving the transaction to another account reverses it on the
/// old account and applies it to the new one.
pub fn update_transaction(
    conn: &mut Connection,
    owner: UserId,
    id: TransactionId,
    patch: &TransactionPatch,
) -> Result<Transaction> {
    if let Some(amount) = patch.amount {
        check_amount(amount)?;
    }

    let tx = db::begin(conn)?;
    let current = get_transaction(&tx, owner, id)?;
    if transfers::find_link(&tx, owner, id)?.is_some() {
        tracing::warn!(transaction_id = id, "refused to edit one side of a transfer");
        return Err(Error::InvalidOperation(
            "Transfer transactions cannot be edited. Delete the transfer and create a new one."
                .to_string(),
        ));
    }
    check_references(
        &tx,
        owner,
        patch.account_id,
        patch.category_id.flatten(),
        patch.payee_id.flatten(),
    )?;

    let account_id = patch.account_id.unwrap_or(current.account_id);
    let kind = patch.direction.map(|d| d.kind()).unwrap_or(current.kind);
    let amount = kind.signed(patch.amount.unwrap_or(current.amount));
    for (account, delta) in balance_moves(current.account_id, current.amount, account_id, amount)? {
        adjust_balance(&tx, owner, account, delta)?;
    }

    let description = match &patch.description {
        Some(d) => non_blank(d.as_deref()),
        None => current.description,
    };
    let notes = match &patch.notes {
        Some(n) => non_blank(n.as_deref()),
        None => current.notes,
    };
    let rows = tx.execute(
        "UPDATE transactions SET account_id=?1, category_id=?2, payee_id=?3, amount=?4, type=?5,
             description=?6, notes=?7, date=?8, updated_at=datetime('now')
         WHERE id=?9 AND user_id=?10",
        params![
            account_id,
            patch.category_id.unwrap_or(current.category_id),
            patch.payee_id.unwrap_or(current.payee_id),
            amount.to_string(),
            kind,
            description,
            notes,
            patch.date.unwrap_or(current.date),
            id,
            owner
        ],
    )?;
    if rows != 1 {
        return Err(Error::ConsistencyFault(format!(
            "transaction {} was not updated",
            id
        )));
    }
    let updated = get_transaction(&tx, owner, id)?;
    tx.commit()?;

    tracing::info!(
        transaction_id = id,
        from = %current.amount,
        to = %updated.amount,
        "updated transaction"
    );
    Ok(updated)
}

/// Delete a transaction, reversing its balance effect. Deleting either side
/// of a transfer deletes the whole transfer.
pub fn delete_transaction(conn: &mut Connection, owner: UserId, id: TransactionId) -> Result<()> {
    let tx = db::begin(conn)?;
    let current = get_transaction(&tx, owner, id)?;
    if let Some(link) = transfers::find_link(&tx, owner, id)? {
        transfers::unwind(&tx, owner, &link)?;
    } else {
        adjust_balance(&tx, owner, current.account_id, -current.amount)?;
        let rows = tx.execute(
            "DELETE FROM transactions WHERE id=?1 AND user_id=?2",
            params![id, owner],
        )?;
        if rows != 1 {
            return Err(Error::ConsistencyFault(format!(
                "transaction {} was not deleted",
                id
            )));
        }
        tracing::info!(transaction_id = id, "deleted transaction of {}", current.amount);
    }
    tx.commit()?;
    Ok(())
}

fn map_row_to_details(
    row: &rusqlite::Row,
    index: &TransferIndex,
    account_names: &HashMap<AccountId, String>,
) -> rusqlite::Result<TransactionDetails> {
    let transaction = map_row_to_transaction(row)?;
    let link = index.link_for(transaction.id);
    let counterpart_account_id = link.and_then(|l| l.counterpart_account_of(transaction.id));
    Ok(TransactionDetails {
        transfer_side: link.and_then(|l| l.side_of(transaction.id)),
        counterpart_account_name: counterpart_account_id
            .and_then(|id| account_names.get(&id).cloned()),
        counterpart_account_id,
        account_name: row.get(12)?,
        currency: row.get(13)?,
        category_name: row.get(14)?,
        category_color: row.get(15)?,
        payee_name: row.get(16)?,
        transaction,
    })
}

fn account_names(conn: &Connection, owner: UserId) -> Result<HashMap<AccountId, String>> {
    Ok(accounts::list_accounts(conn, owner)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect())
}

/// One transaction with the names of everything it references.
pub fn get_transaction_details(
    conn: &Connection,
    owner: UserId,
    id: TransactionId,
) -> Result<TransactionDetails> {
    let index = TransferIndex::from_links(transfers::find_link(conn, owner, id)?);
    let names = account_names(conn, owner)?;
    let sql = format!(
        "SELECT {}, a.name, a.currency, c.name, c.color, p.name {} WHERE t.id=?1 AND t.user_id=?2",
        TRANSACTION_COLUMNS, DETAIL_JOINS
    );
    conn.query_row(&sql, params![id, owner], |r| {
        map_row_to_details(r, &index, &names)
    })
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("Transaction {}", id)))
}

/// A page of the owner's transactions, newest first.
pub fn list_transactions(
    conn: &Connection,
    owner: UserId,
    filter: &TransactionFilter,
) -> Result<Page<TransactionDetails>> {
    if filter.page == 0 {
        return Err(Error::Validation("page starts at 1".to_string()));
    }
    if filter.limit == 0 || filter.limit > MAX_PAGE_SIZE {
        return Err(Error::Validation(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM transactions t WHERE {}", FILTER_CLAUSE),
        params![
            owner,
            filter.account_id,
            filter.category_id,
            filter.payee_id,
            filter.kind,
            filter.from,
            filter.to
        ],
        |r| r.get(0),
    )?;

    let index = TransferIndex::load(conn, owner)?;
    let names = account_names(conn, owner)?;
    let sql = format!(
        "SELECT {}, a.name, a.currency, c.name, c.color, p.name {} WHERE {}
         ORDER BY t.date DESC, t.id DESC LIMIT ?8 OFFSET ?9",
        TRANSACTION_COLUMNS, DETAIL_JOINS, FILTER_CLAUSE
    );
    let offset = i64::from(filter.page - 1) * i64::from(filter.limit);
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(
            params![
                owner,
                filter.account_id,
                filter.category_id,
                filter.payee_id,
                filter.kind,
                filter.from,
                filter.to,
                filter.limit,
                offset
            ],
            |r| map_row_to_details(r, &index, &names),
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let total = total as u64;
    Ok(Page {
        items,
        page: filter.page,
        limit: filter.limit,
        total,
        pages: total.div_ceil(u64::from(filter.limit)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn same_account_moves_by_net_change() {
        assert_eq!(balance_moves(1, d(50), 1, d(80)).unwrap(), vec![(1, d(30))]);
        assert_eq!(balance_moves(1, d(50), 1, d(-50)).unwrap(), vec![(1, d(-100))]);
    }

    #[test]
    fn unchanged_amount_moves_nothing() {
        assert!(balance_moves(1, d(-20), 1, d(-20)).unwrap().is_empty());
    }

    #[test]
    fn account_change_reverses_old_and_applies_new() {
        assert_eq!(
            balance_moves(1, d(-20), 2, d(35)).unwrap(),
            vec![(1, d(20)), (2, d(35))]
        );
    }

    #[test]
    fn unrepresentable_net_change_is_rejected() {
        let err = balance_moves(1, Decimal::MAX, 1, -Decimal::MAX).unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
    }
}
