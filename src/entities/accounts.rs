// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::Local;
use rusqlite::{Connection, OptionalExtension, params};

use super::{name_taken, referenced_by_transactions, users};
use crate::db;
use crate::error::{Error, Result};
use crate::models::{Account, AccountId, AccountPatch, NewAccount, UserId};
use crate::utils::{
    check_day_of_month, decimal_column, get_default_currency, normalize_currency,
    opt_decimal_column, required_name,
};

const ACCOUNT_COLUMNS: &str = "id, user_id, name, type, balance, opening_balance, credit_limit, \
     bill_generation_date, payment_due_date, status, opening_date, currency, created_at, updated_at";

pub fn map_row_to_account(row: &rusqlite::Row) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        r#type: row.get(3)?,
        balance: decimal_column(row, 4)?,
        opening_balance: decimal_column(row, 5)?,
        credit_limit: opt_decimal_column(row, 6)?,
        bill_generation_date: row.get(7)?,
        payment_due_date: row.get(8)?,
        status: row.get(9)?,
        opening_date: row.get(10)?,
        currency: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn check_days(bill: Option<u8>, due: Option<u8>) -> Result<()> {
    if let Some(day) = bill {
        check_day_of_month("bill_generation_date", day)?;
    }
    if let Some(day) = due {
        check_day_of_month("payment_due_date", day)?;
    }
    Ok(())
}

pub fn create_account(conn: &Connection, owner: UserId, new: &NewAccount) -> Result<Account> {
    let name = required_name("Account", &new.name)?;
    check_days(new.bill_generation_date, new.payment_due_date)?;
    let currency = match &new.currency {
        Some(ccy) => normalize_currency(ccy)?,
        None => get_default_currency(conn)?,
    };
    let opening_date = new
        .opening_date
        .unwrap_or_else(|| Local::now().date_naive());

    users::get_user(conn, owner)?;
    if name_taken(conn, "accounts", owner, &name, None)? {
        return Err(Error::Validation(format!(
            "Account '{}' already exists",
            name
        )));
    }

    conn.execute(
        "INSERT INTO accounts(user_id, name, type, balance, opening_balance, credit_limit,
             bill_generation_date, payment_due_date, status, opening_date, currency)
         VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            owner,
            name,
            new.r#type,
            new.balance.to_string(),
            new.credit_limit.map(|d| d.to_string()),
            new.bill_generation_date,
            new.payment_due_date,
            new.status,
            opening_date,
            currency
        ],
    )?;
    let account = get_account(conn, owner, conn.last_insert_rowid())?;
    tracing::info!(
        account_id = account.id,
        "created account '{}' with balance {}",
        account.name,
        account.balance
    );
    Ok(account)
}

pub fn find_account(conn: &Connection, owner: UserId, id: AccountId) -> Result<Option<Account>> {
    let sql = format!(
        "SELECT {} FROM accounts WHERE id=?1 AND user_id=?2",
        ACCOUNT_COLUMNS
    );
    let account = conn
        .query_row(&sql, params![id, owner], map_row_to_account)
        .optional()?;
    Ok(account)
}

pub fn get_account(conn: &Connection, owner: UserId, id: AccountId) -> Result<Account> {
    find_account(conn, owner, id)?.ok_or_else(|| Error::NotFound(format!("Account {}", id)))
}

/// All of the owner's accounts, newest first.
pub fn list_accounts(conn: &Connection, owner: UserId) -> Result<Vec<Account>> {
    let sql = format!(
        "SELECT {} FROM accounts WHERE user_id=?1 ORDER BY created_at DESC, id DESC",
        ACCOUNT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let accounts = stmt
        .query_map(params![owner], map_row_to_account)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(accounts)
}

/// Apply `patch` to an account.
///
/// Setting the balance directly moves the opening balance by the same amount,
/// so the balance stays equal to the opening balance plus the account's
/// transactions.
pub fn update_account(
    conn: &mut Connection,
    owner: UserId,
    id: AccountId,
    patch: &AccountPatch,
) -> Result<Account> {
    let name = patch
        .name
        .as_deref()
        .map(|n| required_name("Account", n))
        .transpose()?;
    check_days(
        patch.bill_generation_date.flatten(),
        patch.payment_due_date.flatten(),
    )?;
    let currency = patch
        .currency
        .as_deref()
        .map(normalize_currency)
        .transpose()?;

    let tx = db::begin(conn)?;
    let current = get_account(&tx, owner, id)?;
    if let Some(name) = &name {
        if name_taken(&tx, "accounts", owner, name, Some(id))? {
            return Err(Error::Validation(format!(
                "Account '{}' already exists",
                name
            )));
        }
    }

    let balance = patch.balance.unwrap_or(current.balance);
    let opening_balance = balance
        .checked_sub(current.balance)
        .and_then(|shift| current.opening_balance.checked_add(shift))
        .ok_or_else(|| {
            Error::Validation(format!(
                "setting the balance of account '{}' to {} would overflow its opening balance",
                current.name, balance
            ))
        })?;
    let rows = tx.execute(
        "UPDATE accounts SET name=?1, type=?2, balance=?3, opening_balance=?4, credit_limit=?5,
             bill_generation_date=?6, payment_due_date=?7, status=?8, opening_date=?9,
             currency=?10, updated_at=datetime('now')
         WHERE id=?11 AND user_id=?12",
        params![
            name.unwrap_or(current.name),
            patch.r#type.unwrap_or(current.r#type),
            balance.to_string(),
            opening_balance.to_string(),
            patch
                .credit_limit
                .unwrap_or(current.credit_limit)
                .map(|d| d.to_string()),
            patch
                .bill_generation_date
                .unwrap_or(current.bill_generation_date),
            patch.payment_due_date.unwrap_or(current.payment_due_date),
            patch.status.unwrap_or(current.status),
            patch.opening_date.unwrap_or(current.opening_date),
            currency.unwrap_or(current.currency),
            id,
            owner
        ],
    )?;
    if rows != 1 {
        return Err(Error::ConsistencyFault(format!(
            "account {} was not updated",
            id
        )));
    }
    let updated = get_account(&tx, owner, id)?;
    tx.commit()?;
    tracing::info!(account_id = id, "updated account '{}'", updated.name);
    Ok(updated)
}

/// Delete an account that no transaction references.
pub fn delete_account(conn: &mut Connection, owner: UserId, id: AccountId) -> Result<()> {
    let tx = db::begin(conn)?;
    let account = get_account(&tx, owner, id)?;
    if referenced_by_transactions(&tx, "account_id", id)? {
        tracing::warn!(account_id = id, "refused to delete account with transactions");
        return Err(Error::InvalidOperation(format!(
            "Cannot delete account '{}' with existing transactions",
            account.name
        )));
    }
    tx.execute(
        "DELETE FROM accounts WHERE id=?1 AND user_id=?2",
        params![id, owner],
    )?;
    tx.commit()?;
    tracing::info!(account_id = id, "deleted account '{}'", account.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{AccountStatus, AccountType};

    fn setup() -> (Connection, UserId) {
        let conn = db::open_in_memory().unwrap();
        let user = users::create_user(&conn, "alice").unwrap();
        (conn, user.id)
    }

    #[test]
    fn create_records_opening_balance() {
        let (conn, owner) = setup();

        let account = create_account(
            &conn,
            owner,
            &NewAccount::new("Everyday", AccountType::Checking).with_balance(Decimal::new(1000, 0)),
        )
        .unwrap();

        assert_eq!(account.balance, Decimal::new(1000, 0));
        assert_eq!(account.opening_balance, Decimal::new(1000, 0));
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.currency, "USD");
    }

    #[test]
    fn names_are_unique_per_owner() {
        let (conn, owner) = setup();
        let other = users::create_user(&conn, "bob").unwrap().id;
        let new = NewAccount::new("Wallet", AccountType::Cash);
        create_account(&conn, owner, &new).unwrap();

        assert!(matches!(
            create_account(&conn, owner, &new),
            Err(Error::Validation(_))
        ));
        assert!(create_account(&conn, other, &new).is_ok());
    }

    #[test]
    fn rejects_out_of_range_days() {
        let (conn, owner) = setup();
        let mut new = NewAccount::new("Card", AccountType::Credit);
        new.payment_due_date = Some(32);

        assert!(matches!(
            create_account(&conn, owner, &new),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn other_owners_cannot_see_account() {
        let (conn, owner) = setup();
        let other = users::create_user(&conn, "mallory").unwrap().id;
        let account =
            create_account(&conn, owner, &NewAccount::new("Savings", AccountType::Savings))
                .unwrap();

        assert!(matches!(
            get_account(&conn, other, account.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn balance_edit_shifts_opening_balance() {
        let (mut conn, owner) = setup();
        let account = create_account(
            &conn,
            owner,
            &NewAccount::new("Everyday", AccountType::Checking).with_balance(Decimal::new(100, 0)),
        )
        .unwrap();

        let updated = update_account(
            &mut conn,
            owner,
            account.id,
            &AccountPatch {
                balance: Some(Decimal::new(250, 0)),
                status: Some(AccountStatus::Inactive),
                opening_date: Some(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.balance, Decimal::new(250, 0));
        assert_eq!(updated.opening_balance, Decimal::new(250, 0));
        assert_eq!(updated.status, AccountStatus::Inactive);
        assert_eq!(updated.name, "Everyday");
    }

    #[test]
    fn update_can_clear_credit_limit() {
        let (mut conn, owner) = setup();
        let mut new = NewAccount::new("Card", AccountType::Credit);
        new.credit_limit = Some(Decimal::new(5000, 0));
        let account = create_account(&conn, owner, &new).unwrap();

        let updated = update_account(
            &mut conn,
            owner,
            account.id,
            &AccountPatch {
                credit_limit: Some(None),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.credit_limit, None);
    }

    #[test]
    fn rename_to_existing_name_is_rejected() {
        let (mut conn, owner) = setup();
        create_account(&conn, owner, &NewAccount::new("A", AccountType::Cash)).unwrap();
        let b = create_account(&conn, owner, &NewAccount::new("B", AccountType::Cash)).unwrap();

        let err = update_account(
            &mut conn,
            owner,
            b.id,
            &AccountPatch {
                name: Some("A".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn delete_unused_account() {
        let (mut conn, owner) = setup();
        let account =
            create_account(&conn, owner, &NewAccount::new("Old", AccountType::Cash)).unwrap();

        delete_account(&mut conn, owner, account.id).unwrap();

        assert!(find_account(&conn, owner, account.id).unwrap().is_none());
        assert!(matches!(
            delete_account(&mut conn, owner, account.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn balance_edit_that_overflows_opening_balance_is_rejected() {
        let (mut conn, owner) = setup();
        let account = create_account(
            &conn,
            owner,
            &NewAccount::new("Deep", AccountType::Credit).with_balance(-Decimal::MAX),
        )
        .unwrap();

        let err = update_account(
            &mut conn,
            owner,
            account.id,
            &AccountPatch {
                balance: Some(Decimal::MAX),
                ..Default::default()
            },
        )
        .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        let unchanged = get_account(&conn, owner, account.id).unwrap();
        assert_eq!(unchanged.balance, -Decimal::MAX);
        assert_eq!(unchanged.opening_balance, -Decimal::MAX);
    }
}
