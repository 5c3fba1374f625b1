// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transfers: a movement of money between two of an owner's accounts, stored
//! as an outgoing transaction, an incoming transaction and a link row.

use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use super::balance::adjust_balance;
use super::entries::{EntryRow, fetch_transaction, insert_entry};
use crate::db;
use crate::error::{Error, Result};
use crate::models::{
    AccountId, NewTransfer, Transaction, TransactionId, TransactionKind, Transfer, TransferLink,
    UserId,
};
use crate::utils::{decimal_column, non_blank};

pub const DEFAULT_OUTGOING_DESCRIPTION: &str = "Transfer out";
pub const DEFAULT_INCOMING_DESCRIPTION: &str = "Transfer in";

const LINK_COLUMNS: &str = "id, user_id, from_account_id, to_account_id, from_transaction_id, \
     to_transaction_id, amount, description, date, created_at";

pub(crate) fn map_row_to_link(row: &rusqlite::Row) -> rusqlite::Result<TransferLink> {
    Ok(TransferLink {
        id: row.get(0)?,
        user_id: row.get(1)?,
        from_account_id: row.get(2)?,
        to_account_id: row.get(3)?,
        from_transaction_id: row.get(4)?,
        to_transaction_id: row.get(5)?,
        amount: decimal_column(row, 6)?,
        description: row.get(7)?,
        date: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// The link that `transaction_id` is one side of, if any.
pub fn find_link(
    conn: &Connection,
    owner: UserId,
    transaction_id: TransactionId,
) -> Result<Option<TransferLink>> {
    let sql = format!(
        "SELECT {} FROM transfer_transactions
         WHERE user_id=?1 AND (from_transaction_id=?2 OR to_transaction_id=?2)",
        LINK_COLUMNS
    );
    let link = conn
        .query_row(&sql, params![owner, transaction_id], map_row_to_link)
        .optional()?;
    Ok(link)
}

pub fn list_links(conn: &Connection, owner: UserId) -> Result<Vec<TransferLink>> {
    let sql = format!(
        "SELECT {} FROM transfer_transactions WHERE user_id=?1 ORDER BY date DESC, id DESC",
        LINK_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let links = stmt
        .query_map(params![owner], map_row_to_link)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(links)
}

fn get_link(conn: &Connection, owner: UserId, id: i64) -> Result<TransferLink> {
    let sql = format!(
        "SELECT {} FROM transfer_transactions WHERE id=?1 AND user_id=?2",
        LINK_COLUMNS
    );
    conn.query_row(&sql, params![id, owner], map_row_to_link)
        .optional()?
        .ok_or_else(|| Error::ConsistencyFault(format!("transfer {} disappeared", id)))
}

fn validate(new: &NewTransfer) -> Result<()> {
    if new.from_account_id == new.to_account_id {
        return Err(Error::Validation(
            "Source and destination accounts must be different".to_string(),
        ));
    }
    if new.amount <= Decimal::ZERO {
        return Err(Error::Validation(format!(
            "Transfer amount must be positive, got {}",
            new.amount
        )));
    }
    Ok(())
}

/// Both endpoint accounts, resolved with a single query. Anything other than
/// exactly two rows means at least one of them is not the owner's.
fn resolve_endpoints(
    conn: &Connection,
    owner: UserId,
    from: AccountId,
    to: AccountId,
) -> Result<()> {
    let mut stmt =
        conn.prepare("SELECT id, currency FROM accounts WHERE user_id=?1 AND id IN (?2, ?3)")?;
    let found = stmt
        .query_map(params![owner, from, to], |r| {
            Ok((r.get::<_, AccountId>(0)?, r.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if found.len() != 2 {
        return Err(Error::NotFound("One or both accounts".to_string()));
    }
    if found[0].1 != found[1].1 {
        return Err(Error::Validation(format!(
            "Cannot transfer between accounts in different currencies ({} and {}); transfers are not converted between currencies",
            found[0].1, found[1].1
        )));
    }
    Ok(())
}

/// Move `new.amount` from one account to another as one unit of work.
pub fn create_transfer(conn: &mut Connection, owner: UserId, new: &NewTransfer) -> Result<Transfer> {
    validate(new)?;
    let magnitude = new.amount;
    let description = non_blank(new.description.as_deref());
    let notes = non_blank(new.notes.as_deref());

    let tx = db::begin(conn)?;
    resolve_endpoints(&tx, owner, new.from_account_id, new.to_account_id)?;

    let outgoing = insert_entry(
        &tx,
        owner,
        &EntryRow {
            account_id: new.from_account_id,
            category_id: None,
            payee_id: None,
            amount: -magnitude,
            kind: TransactionKind::Expense,
            description: Some(
                description
                    .as_deref()
                    .unwrap_or(DEFAULT_OUTGOING_DESCRIPTION),
            ),
            notes: notes.as_deref(),
            date: new.date,
        },
    )?;
    let incoming = insert_entry(
        &tx,
        owner,
        &EntryRow {
            account_id: new.to_account_id,
            category_id: None,
            payee_id: None,
            amount: magnitude,
            kind: TransactionKind::Income,
            description: Some(
                description
                    .as_deref()
                    .unwrap_or(DEFAULT_INCOMING_DESCRIPTION),
            ),
            notes: notes.as_deref(),
            date: new.date,
        },
    )?;
    tx.execute(
        "INSERT INTO transfer_transactions(user_id, from_account_id, to_account_id,
             from_transaction_id, to_transaction_id, amount, description, date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            owner,
            new.from_account_id,
            new.to_account_id,
            outgoing.id,
            incoming.id,
            magnitude.to_string(),
            description,
            new.date
        ],
    )?;
    let link = get_link(&tx, owner, tx.last_insert_rowid())?;

    adjust_balance(&tx, owner, new.from_account_id, -magnitude)?;
    adjust_balance(&tx, owner, new.to_account_id, magnitude)?;
    tx.commit()?;

    tracing::info!(
        transfer_id = link.id,
        from = link.from_account_id,
        to = link.to_account_id,
        "transferred {}",
        magnitude
    );
    Ok(Transfer {
        outgoing,
        incoming,
        link,
    })
}

/// The transfer that `transaction_id` belongs to, from either side.
pub fn get_transfer(
    conn: &Connection,
    owner: UserId,
    transaction_id: TransactionId,
) -> Result<Transfer> {
    let link = find_link(conn, owner, transaction_id)?.ok_or_else(|| {
        Error::NotFound(format!("Transfer for transaction {}", transaction_id))
    })?;
    let side = |id: TransactionId| -> Result<Transaction> {
        fetch_transaction(conn, owner, id)?.ok_or_else(|| {
            Error::ConsistencyFault(format!(
                "transfer {} references missing transaction {}",
                link.id, id
            ))
        })
    };
    let outgoing = side(link.from_transaction_id)?;
    let incoming = side(link.to_transaction_id)?;
    Ok(Transfer {
        outgoing,
        incoming,
        link,
    })
}

/// Delete the transfer that `transaction_id` is either side of.
pub fn delete_transfer(
    conn: &mut Connection,
    owner: UserId,
    transaction_id: TransactionId,
) -> Result<()> {
    let tx = db::begin(conn)?;
    let link = find_link(&tx, owner, transaction_id)?.ok_or_else(|| {
        Error::NotFound(format!("Transfer for transaction {}", transaction_id))
    })?;
    unwind(&tx, owner, &link)?;
    tx.commit()?;
    Ok(())
}

/// Reverse both balance effects of `link` and remove it with both of its
/// transactions. Runs inside the caller's unit of work.
pub(crate) fn unwind(conn: &Connection, owner: UserId, link: &TransferLink) -> Result<()> {
    adjust_balance(conn, owner, link.to_account_id, -link.amount)?;
    adjust_balance(conn, owner, link.from_account_id, link.amount)?;

    let links = conn.execute(
        "DELETE FROM transfer_transactions WHERE id=?1 AND user_id=?2",
        params![link.id, owner],
    )?;
    if links != 1 {
        return Err(Error::ConsistencyFault(format!(
            "transfer {} was not deleted",
            link.id
        )));
    }
    let entries = conn.execute(
        "DELETE FROM transactions WHERE id IN (?1, ?2) AND user_id=?3",
        params![link.from_transaction_id, link.to_transaction_id, owner],
    )?;
    if entries != 2 {
        tracing::error!(
            transfer_id = link.id,
            entries,
            "transfer delete removed the wrong number of transactions"
        );
        return Err(Error::ConsistencyFault(format!(
            "expected to delete 2 transactions for transfer {}, deleted {}",
            link.id, entries
        )));
    }
    tracing::info!(transfer_id = link.id, "deleted transfer of {}", link.amount);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::entities::{accounts, users};
    use crate::models::{AccountType, NewAccount};

    fn setup() -> (Connection, UserId, AccountId, AccountId) {
        let conn = db::open_in_memory().unwrap();
        let owner = users::create_user(&conn, "alice").unwrap().id;
        let a = accounts::create_account(
            &conn,
            owner,
            &NewAccount::new("A", AccountType::Checking).with_balance(Decimal::new(1000, 0)),
        )
        .unwrap();
        let b = accounts::create_account(
            &conn,
            owner,
            &NewAccount::new("B", AccountType::Savings).with_balance(Decimal::new(500, 0)),
        )
        .unwrap();
        (conn, owner, a.id, b.id)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn default_descriptions_are_used() {
        let (mut conn, owner, a, b) = setup();

        let transfer =
            create_transfer(&mut conn, owner, &NewTransfer::new(a, b, Decimal::new(200, 0), date()))
                .unwrap();

        assert_eq!(
            transfer.outgoing.description.as_deref(),
            Some(DEFAULT_OUTGOING_DESCRIPTION)
        );
        assert_eq!(
            transfer.incoming.description.as_deref(),
            Some(DEFAULT_INCOMING_DESCRIPTION)
        );
        assert_eq!(transfer.link.description, None);
    }

    #[test]
    fn given_description_is_used_on_both_sides() {
        let (mut conn, owner, a, b) = setup();
        let mut new = NewTransfer::new(a, b, Decimal::new(50, 0), date());
        new.description = Some("Rainy day fund".to_string());

        let transfer = create_transfer(&mut conn, owner, &new).unwrap();

        assert_eq!(transfer.outgoing.description.as_deref(), Some("Rainy day fund"));
        assert_eq!(transfer.incoming.description.as_deref(), Some("Rainy day fund"));
        assert_eq!(transfer.link.description.as_deref(), Some("Rainy day fund"));
    }

    #[test]
    fn currency_mismatch_is_rejected() {
        let (mut conn, owner, a, _) = setup();
        let mut new = NewAccount::new("Euro", AccountType::Savings);
        new.currency = Some("EUR".to_string());
        let euro = accounts::create_account(&conn, owner, &new).unwrap();

        let err = create_transfer(
            &mut conn,
            owner,
            &NewTransfer::new(a, euro.id, Decimal::ONE, date()),
        )
        .unwrap_err();

        match err {
            Error::Validation(msg) => assert!(msg.contains("not converted"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn find_link_works_from_both_sides() {
        let (mut conn, owner, a, b) = setup();
        let transfer =
            create_transfer(&mut conn, owner, &NewTransfer::new(a, b, Decimal::TEN, date()))
                .unwrap();

        let from_out = find_link(&conn, owner, transfer.outgoing.id).unwrap();
        let from_in = find_link(&conn, owner, transfer.incoming.id).unwrap();

        assert_eq!(from_out, Some(transfer.link.clone()));
        assert_eq!(from_in, Some(transfer.link));
    }

    #[test]
    fn delete_of_unlinked_transaction_is_not_found() {
        let (mut conn, owner, _, _) = setup();

        let err = delete_transfer(&mut conn, owner, 12345).unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
    }
}
