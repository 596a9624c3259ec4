//! Error types for the entity store and the repositories built on it.

use thiserror::Error;
use uuid::Uuid;

use cemtrade_core::auth::PasswordError;
use cemtrade_core::ledger::LedgerError;

use crate::store::Collection;

/// Errors raised by an [`EntityStore`](crate::store::EntityStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A write targeted a record that does not exist.
    #[error("{collection} record {id} not found")]
    NotFound {
        /// Collection searched.
        collection: Collection,
        /// Missing id.
        id: Uuid,
    },

    /// A record is not a JSON object or carries an unusable id.
    #[error("Invalid {collection} record: {reason}")]
    InvalidRecord {
        /// Collection written to.
        collection: Collection,
        /// What is wrong with the record.
        reason: String,
    },

    /// An increment targeted a field that does not hold a decimal.
    #[error("Field '{field}' of {collection} record {id} is not numeric")]
    NotNumeric {
        /// Collection written to.
        collection: Collection,
        /// Record id.
        id: Uuid,
        /// Field name.
        field: String,
    },

    /// The backing storage failed.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidRecord { .. } => "INVALID_RECORD",
            Self::NotNumeric { .. } => "NOT_NUMERIC",
            Self::Backend(_) => "STORE_BACKEND",
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Errors raised by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A referenced account, shop, customer or record no longer exists.
    #[error("Stale reference: {collection} record {id} no longer exists")]
    StaleReference {
        /// Collection the reference points into.
        collection: Collection,
        /// The dangling id.
        id: Uuid,
    },

    /// An account cannot be deleted while ledger transactions still post to it.
    #[error("Account {id} still has {entries} ledger transactions")]
    AccountInUse {
        /// The account.
        id: Uuid,
        /// Number of ledger transactions referencing it.
        entries: usize,
    },

    /// A domain rule rejected the input.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Hashing or checking the reports password failed.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// The store failed.
    #[error(transparent)]
    Store(StoreError),

    /// A stored record could not be decoded, or a value could not be encoded.
    #[error("Record codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => Self::StaleReference { collection, id },
            other => Self::Store(other),
        }
    }
}

impl RepositoryError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::StaleReference { .. } => "STALE_REFERENCE",
            Self::AccountInUse { .. } => "ACCOUNT_IN_USE",
            Self::Ledger(err) => err.error_code(),
            Self::Password(err) => err.error_code(),
            Self::Store(err) => err.error_code(),
            Self::Codec(_) => "CODEC_ERROR",
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_retryable(),
            _ => false,
        }
    }

    pub(crate) const fn stale(collection: Collection, id: Uuid) -> Self {
        Self::StaleReference { collection, id }
    }
}
