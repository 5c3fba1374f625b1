// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The library error type.
//!
//! Every ledger and entity operation returns [`Error`]. The first four variants
//! are meant to be shown to the user as-is; [`Error::Sql`] wraps store failures
//! that callers should log and report as an internal fault.

/// Result alias used throughout the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The errors that may occur while reading or mutating the ledger.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input: zero amounts, equal transfer endpoints, bad dates,
    /// out-of-range days, duplicate names and the like.
    ///
    /// Nothing has been written when this is returned.
    #[error("{0}")]
    Validation(String),

    /// A referenced user, account, category, payee, transaction or transfer
    /// does not exist for the requesting owner.
    #[error("{0} not found")]
    NotFound(String),

    /// The operation is not allowed on the target in its current state, e.g.
    /// editing one side of a transfer or deleting an account that still has
    /// transactions.
    #[error("{0}")]
    InvalidOperation(String),

    /// A unit of work did not apply the way it was expected to, e.g. a balance
    /// adjustment that matched no account row.
    ///
    /// The unit of work has been rolled back when this is returned.
    #[error("ledger consistency fault: {0}")]
    ConsistencyFault(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    Sql(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::Sql(value)
    }
}

impl Error {
    /// Whether the error was caused by the caller's input rather than by the
    /// store, i.e. whether retrying with corrected input can succeed.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::NotFound(_) | Error::InvalidOperation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn not_found_names_the_missing_thing() {
        let err = Error::NotFound("account 7".to_owned());

        assert_eq!(err.to_string(), "account 7 not found");
        assert!(err.is_user_error());
    }

    #[test]
    fn consistency_faults_are_not_user_errors() {
        let err = Error::ConsistencyFault("balance of account 3 was not updated".to_owned());

        assert!(!err.is_user_error());
        assert!(err.to_string().starts_with("ledger consistency fault"));
    }

    #[test]
    fn sql_errors_convert() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert!(matches!(err, Error::Sql(_)));
    }
}
