//! Error types for object persistence.
//!
//! Database failures are passed through with a short prefix; the remaining
//! variants cover operations the object's metadata cannot support.

use thiserror::Error;

/// Errors returned by [`Dbu`](crate::Dbu) operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite operation failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The type has no key field, so keyed operations are undefined.
    #[error("no key field for table '{0}'")]
    NoKeyField(&'static str),

    /// The object's key is zero, so it cannot identify a stored row.
    #[error("key value missing for table '{0}'")]
    KeyMissing(&'static str),

    /// A delete by key matched no row.
    #[error("no record deleted for id {0}")]
    NoRecordDeleted(i64),

    /// A thread panicked while holding the connection lock.
    #[error("connection lock poisoned")]
    LockPoisoned,
}

/// Convenience alias for results with [`DbError`].
pub type Result<T> = std::result::Result<T, DbError>;
