// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub type UserId = i64;
pub type AccountId = i64;
pub type CategoryId = i64;
pub type PayeeId = i64;
pub type TransactionId = i64;
pub type TransferId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
    Cash,
    Investment,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Credit => "credit",
            AccountType::Cash => "cash",
            AccountType::Investment => "investment",
        }
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "checking" => Ok(AccountType::Checking),
            "savings" => Ok(AccountType::Savings),
            "credit" => Ok(AccountType::Credit),
            "cash" => Ok(AccountType::Cash),
            "investment" => Ok(AccountType::Investment),
            other => Err(Error::Validation(format!(
                "Invalid account type '{}', expected one of checking, savings, credit, cash, investment",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Closed => "closed",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            "closed" => Ok(AccountStatus::Closed),
            other => Err(Error::Validation(format!(
                "Invalid account status '{}', expected active, inactive or closed",
                other
            ))),
        }
    }
}

/// The stored classification of a transaction. The sign of the stored amount
/// always agrees with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Apply this kind's sign to the magnitude of `amount`.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Income => amount.abs(),
            TransactionKind::Expense => -amount.abs(),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(Error::Validation(format!(
                "Invalid transaction type '{}', expected income or expense",
                other
            ))),
        }
    }
}

/// Which way money moves for a simple transaction, as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Deposit,
    Withdrawal,
}

impl Direction {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Direction::Deposit => TransactionKind::Income,
            Direction::Withdrawal => TransactionKind::Expense,
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deposit" => Ok(Direction::Deposit),
            "withdrawal" => Ok(Direction::Withdrawal),
            other => Err(Error::Validation(format!(
                "Invalid direction '{}', expected deposit or withdrawal",
                other
            ))),
        }
    }
}

macro_rules! text_column {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(self.as_str().into())
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|e: Error| FromSqlError::Other(e.to_string().into()))
                }
            }
        )+
    };
}

text_column!(AccountType, AccountStatus, TransactionKind);

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Deposit => f.write_str("deposit"),
            Direction::Withdrawal => f.write_str("withdrawal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub name: String,
    pub r#type: AccountType,
    pub balance: Decimal,
    /// The part of `balance` that is not explained by transactions.
    pub opening_balance: Decimal,
    pub credit_limit: Option<Decimal>,
    /// Day of month (1-31) on which the statement is generated.
    pub bill_generation_date: Option<u8>,
    /// Day of month (1-31) on which payment is due.
    pub payment_due_date: Option<u8>,
    pub status: AccountStatus,
    pub opening_date: NaiveDate,
    pub currency: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub r#type: AccountType,
    /// Initial balance, recorded as the opening balance.
    pub balance: Decimal,
    pub credit_limit: Option<Decimal>,
    pub bill_generation_date: Option<u8>,
    pub payment_due_date: Option<u8>,
    pub status: AccountStatus,
    /// Defaults to today.
    pub opening_date: Option<NaiveDate>,
    /// Defaults to the `default_currency` setting.
    pub currency: Option<String>,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, r#type: AccountType) -> Self {
        Self {
            name: name.into(),
            r#type,
            balance: Decimal::ZERO,
            credit_limit: None,
            bill_generation_date: None,
            payment_due_date: None,
            status: AccountStatus::Active,
            opening_date: None,
            currency: None,
        }
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }
}

/// Field-by-field edit of an account. `None` leaves a field alone; for the
/// nullable columns `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub r#type: Option<AccountType>,
    pub balance: Option<Decimal>,
    pub credit_limit: Option<Option<Decimal>>,
    pub bill_generation_date: Option<Option<u8>>,
    pub payment_due_date: Option<Option<u8>>,
    pub status: Option<AccountStatus>,
    pub opening_date: Option<NaiveDate>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserId,
    pub name: String,
    pub color: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payee {
    pub id: PayeeId,
    pub user_id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPayee {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayeePatch {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub payee_id: Option<PayeeId>,
    /// Positive for money in, negative for money out.
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub payee_id: Option<PayeeId>,
    /// Only the magnitude is used; `direction` decides the sign.
    pub amount: Decimal,
    pub direction: Direction,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub date: NaiveDate,
}

impl NewTransaction {
    pub fn new(account_id: AccountId, amount: Decimal, direction: Direction, date: NaiveDate) -> Self {
        Self {
            account_id,
            category_id: None,
            payee_id: None,
            amount,
            direction,
            description: None,
            notes: None,
            date,
        }
    }
}

/// Field-by-field edit of a simple transaction. `None` leaves a field alone;
/// for the nullable columns `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub account_id: Option<AccountId>,
    pub category_id: Option<Option<CategoryId>>,
    pub payee_id: Option<Option<PayeeId>>,
    pub amount: Option<Decimal>,
    pub direction: Option<Direction>,
    pub description: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub date: Option<NaiveDate>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self == &TransactionPatch::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferSide {
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferLink {
    pub id: TransferId,
    pub user_id: UserId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub from_transaction_id: TransactionId,
    pub to_transaction_id: TransactionId,
    /// Always positive.
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl TransferLink {
    /// Which side of this transfer `transaction_id` is, if any.
    pub fn side_of(&self, transaction_id: TransactionId) -> Option<TransferSide> {
        if transaction_id == self.from_transaction_id {
            Some(TransferSide::Outgoing)
        } else if transaction_id == self.to_transaction_id {
            Some(TransferSide::Incoming)
        } else {
            None
        }
    }

    /// The transaction on the other side of `transaction_id`.
    pub fn counterpart_of(&self, transaction_id: TransactionId) -> Option<TransactionId> {
        match self.side_of(transaction_id)? {
            TransferSide::Outgoing => Some(self.to_transaction_id),
            TransferSide::Incoming => Some(self.from_transaction_id),
        }
    }

    /// The account on the other side of `transaction_id`.
    pub fn counterpart_account_of(&self, transaction_id: TransactionId) -> Option<AccountId> {
        match self.side_of(transaction_id)? {
            TransferSide::Outgoing => Some(self.to_account_id),
            TransferSide::Incoming => Some(self.from_account_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransfer {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Decimal,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub date: NaiveDate,
}

impl NewTransfer {
    pub fn new(
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Decimal,
        date: NaiveDate,
    ) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
            description: None,
            notes: None,
            date,
        }
    }
}

/// Both transactions of a transfer and the record linking them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub outgoing: Transaction,
    pub incoming: Transaction,
    pub link: TransferLink,
}

/// A transaction joined with the names of what it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub account_name: String,
    pub currency: String,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub payee_name: Option<String>,
    pub transfer_side: Option<TransferSide>,
    pub counterpart_account_id: Option<AccountId>,
    pub counterpart_account_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub payee_id: Option<PayeeId>,
    pub kind: Option<TransactionKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            account_id: None,
            category_id: None,
            payee_id: None,
            kind: None,
            from: None,
            to: None,
            page: 1,
            limit: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

/// Stored against recomputed balance of one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceCheck {
    pub account_id: AccountId,
    pub account_name: String,
    pub stored: Decimal,
    pub expected: Decimal,
}

impl BalanceCheck {
    /// `stored - expected`, or `None` when the difference is too large to
    /// represent.
    pub fn drift(&self) -> Option<Decimal> {
        self.stored.checked_sub(self.expected)
    }

    pub fn is_consistent(&self) -> bool {
        self.stored == self.expected
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkIssue {
    pub transfer_id: TransferId,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn kind_sign_follows_direction() {
        let fifty = Decimal::new(50, 0);

        assert_eq!(Direction::Deposit.kind().signed(-fifty), fifty);
        assert_eq!(Direction::Withdrawal.kind().signed(fifty), -fifty);
    }

    #[test]
    fn parses_lowercase_and_mixed_case() {
        assert_eq!("Savings".parse::<AccountType>().unwrap(), AccountType::Savings);
        assert_eq!(" closed ".parse::<AccountStatus>().unwrap(), AccountStatus::Closed);
        assert_eq!("WITHDRAWAL".parse::<Direction>().unwrap(), Direction::Withdrawal);
        assert!("transfer".parse::<Direction>().is_err());
    }

    #[test]
    fn link_resolves_counterparts_from_either_side() {
        let link = TransferLink {
            id: 1,
            user_id: 1,
            from_account_id: 10,
            to_account_id: 20,
            from_transaction_id: 100,
            to_transaction_id: 200,
            amount: Decimal::new(200, 0),
            description: None,
            date: chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            created_at: chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        };

        assert_eq!(link.side_of(100), Some(TransferSide::Outgoing));
        assert_eq!(link.counterpart_of(200), Some(100));
        assert_eq!(link.counterpart_account_of(100), Some(20));
        assert_eq!(link.side_of(300), None);
    }

    #[test]
    fn drift_beyond_decimal_range_is_none() {
        let check = BalanceCheck {
            account_id: 1,
            account_name: "Deep".to_string(),
            stored: Decimal::MAX,
            expected: -Decimal::MAX,
        };

        assert_eq!(check.drift(), None);
        assert!(!check.is_consistent());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TransactionPatch::default().is_empty());
        assert!(
            !TransactionPatch {
                amount: Some(Decimal::ONE),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
