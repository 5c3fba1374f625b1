// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use rusqlite::Connection;

use super::transfers::list_links;
use crate::error::Result;
use crate::models::{TransactionId, TransferLink, UserId};

/// Transfer links keyed by both of their transaction ids, built at read time.
#[derive(Debug, Default, Clone)]
pub struct TransferIndex {
    by_transaction: HashMap<TransactionId, TransferLink>,
}

impl TransferIndex {
    pub fn load(conn: &Connection, owner: UserId) -> Result<Self> {
        Ok(Self::from_links(list_links(conn, owner)?))
    }

    pub fn from_links(links: impl IntoIterator<Item = TransferLink>) -> Self {
        let mut by_transaction = HashMap::new();
        for link in links {
            by_transaction.insert(link.from_transaction_id, link.clone());
            by_transaction.insert(link.to_transaction_id, link);
        }
        Self { by_transaction }
    }

    pub fn link_for(&self, transaction_id: TransactionId) -> Option<&TransferLink> {
        self.by_transaction.get(&transaction_id)
    }

    pub fn is_transfer(&self, transaction_id: TransactionId) -> bool {
        self.by_transaction.contains_key(&transaction_id)
    }

    /// Number of distinct transfers.
    pub fn len(&self) -> usize {
        self.by_transaction.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.by_transaction.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;

    fn link(id: i64, from_tx: i64, to_tx: i64) -> TransferLink {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        TransferLink {
            id,
            user_id: 1,
            from_account_id: 1,
            to_account_id: 2,
            from_transaction_id: from_tx,
            to_transaction_id: to_tx,
            amount: Decimal::TEN,
            description: None,
            date,
            created_at: date.and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn both_sides_resolve_to_the_same_link() {
        let index = TransferIndex::from_links([link(1, 10, 11), link(2, 20, 21)]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.link_for(10).map(|l| l.id), Some(1));
        assert_eq!(index.link_for(11).map(|l| l.id), Some(1));
        assert_eq!(index.link_for(21).map(|l| l.id), Some(2));
        assert!(!index.is_transfer(12));
    }

    #[test]
    fn empty_index() {
        let index = TransferIndex::from_links(None);

        assert!(index.is_empty());
        assert_eq!(index.link_for(1), None);
    }
}
