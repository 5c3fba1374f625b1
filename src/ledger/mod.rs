// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The transaction ledger.
//!
//! Every mutation here runs as one SQLite transaction that also moves the
//! affected account balances, so an account's balance always equals its
//! opening balance plus the amounts of its transactions. Transfers are two
//! transactions plus a link row and are created and deleted as one unit.

pub mod balance;
pub mod entries;
pub mod index;
pub mod reconcile;
pub mod transfers;

pub use balance::adjust_balance;
pub use entries::{
    create_transaction, delete_transaction, get_transaction, get_transaction_details,
    list_transactions, update_transaction,
};
pub use index::TransferIndex;
pub use reconcile::{check_transfer_links, reconcile};
pub use transfers::{create_transfer, delete_transfer, find_link, get_transfer, list_links};
