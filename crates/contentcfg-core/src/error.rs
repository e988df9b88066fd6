//! Error types for the content configuration engine
//!
//! Only two boundaries are genuinely fallible: the local key-value store and
//! the remote source of truth. Everything else in the engine is total, so the
//! public entry points report expected failures through outcome enums
//! (`LoadOutcome`, `SaveOutcome`) and reserve `CfgError` for I/O setup and
//! invalid arguments.

use thiserror::Error;

use crate::types::{ConfigKind, Timestamp};

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum CfgError {
    /// Local key-value store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Database creation/opening error
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Table error
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    /// Storage operation error
    #[error("Storage operation error: {0}")]
    StorageOp(#[from] redb::StorageError),

    /// Commit error
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A caller passed an argument the engine cannot work with
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failures of a local key-value store backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend rejected the operation
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// The store is full; the value was not written
    #[error("Storage quota exceeded writing '{key}' ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },
}

macro_rules! backend_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StorageError {
                fn from(e: $ty) -> Self {
                    StorageError::Backend(e.to_string())
                }
            }
        )*
    };
}

backend_error_from!(
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Failures talking to the remote store.
///
/// `Clone` because a single in-flight fetch fans its result out to every
/// caller that joined it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote could not be reached
    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    /// The remote answered but refused the request
    #[error("Remote rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The remote answered with something that is not JSON
    #[error("Malformed remote payload: {0}")]
    Malformed(String),
}

/// Save-boundary validation failures.
///
/// Carries enough context (kind, id and title) for a UI to point at the
/// record that needs fixing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `startAt` is later than `endAt`
    #[error("{kind} '{title}' ends before it starts ({start_at} > {end_at})")]
    InvertedWindow {
        kind: ConfigKind,
        id: String,
        title: String,
        start_at: Timestamp,
        end_at: Timestamp,
    },
}

/// Result type alias using CfgError
pub type CfgResult<T> = Result<T, CfgError>;
