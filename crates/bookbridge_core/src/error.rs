//! Error taxonomy for the store and bridge layers.
//!
//! # Responsibility
//! - Map every failure the record store reports into a closed category set.
//! - Separate store-reported (recoverable) failures from unexpected ones.
//!
//! # Invariants
//! - Every `rusqlite::Error` maps to exactly one `StoreErrorCategory`.
//! - `BridgeError::Unexpected` is never produced by the store itself; it
//!   only arises above it (lost completion, worker shut down).

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Closed category set for failures reported by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorCategory {
    /// A uniqueness or primary-key constraint rejected a mutation.
    UniqueConstraint,
    /// Any other constraint (not-null, check, foreign-key) rejected a mutation.
    ConstraintViolation,
    /// A command referenced a column the relation does not declare.
    UndeclaredColumn,
    /// A command referenced a relation that does not exist (e.g. after drop).
    MissingRelation,
    /// The underlying file or I/O layer failed.
    Io,
    /// The store rejected the command for any other reason (syntax, misuse).
    InvalidCommand,
}

impl StoreErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UniqueConstraint => "unique_constraint",
            Self::ConstraintViolation => "constraint_violation",
            Self::UndeclaredColumn => "undeclared_column",
            Self::MissingRelation => "missing_relation",
            Self::Io => "io",
            Self::InvalidCommand => "invalid_command",
        }
    }
}

/// A classified, recoverable failure reported by the record store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreError {
    pub category: StoreErrorCategory,
    pub message: String,
}

impl StoreError {
    pub(crate) fn from_sqlite(err: rusqlite::Error) -> Self {
        Self {
            category: categorize(&err),
            message: err.to_string(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.category.as_str(), self.message)
    }
}

impl Error for StoreError {}

/// A failure surfaced through the bridging layer.
#[derive(Debug)]
pub enum BridgeError {
    /// The store rejected the command; recoverable after reporting.
    Store(StoreError),
    /// The bridge or its caller is broken; must propagate.
    Unexpected(String),
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Unexpected(message) => write!(f, "unexpected failure: {message}"),
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Unexpected(_) => None,
        }
    }
}

impl From<StoreError> for BridgeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Splits a bridge failure into its recoverable store error, or re-raises it.
///
/// # Contract
/// - `Ok(store_error)`: the store rejected the operation; report it, then
///   continue the workflow.
/// - `Err(err)`: not store-reported; the caller must propagate it with `?`
///   instead of swallowing it.
pub fn classify_failure(err: BridgeError) -> Result<StoreError, BridgeError> {
    match err {
        BridgeError::Store(store_err) => Ok(store_err),
        other => Err(other),
    }
}

fn categorize(err: &rusqlite::Error) -> StoreErrorCategory {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            {
                return StoreErrorCategory::UniqueConstraint;
            }
            match code.code {
                rusqlite::ErrorCode::ConstraintViolation => {
                    StoreErrorCategory::ConstraintViolation
                }
                rusqlite::ErrorCode::SystemIoFailure
                | rusqlite::ErrorCode::DiskFull
                | rusqlite::ErrorCode::CannotOpen => StoreErrorCategory::Io,
                _ => categorize_generic(message.as_deref()),
            }
        }
        // Prepare-time rejections (unknown column or table in the statement
        // text) arrive through this variant, not as a SqliteFailure.
        rusqlite::Error::SqlInputError { msg, .. } => categorize_generic(Some(msg)),
        _ => StoreErrorCategory::InvalidCommand,
    }
}

// SQLite reports unknown tables and columns as generic SQLITE_ERROR; the
// message is the only discriminator available at this boundary. Callers
// never repeat this inspection, they match on the category.
fn categorize_generic(message: Option<&str>) -> StoreErrorCategory {
    let Some(message) = message else {
        return StoreErrorCategory::InvalidCommand;
    };

    if message.contains("no such table") {
        StoreErrorCategory::MissingRelation
    } else if message.contains("no such column") || message.contains("has no column named") {
        StoreErrorCategory::UndeclaredColumn
    } else {
        StoreErrorCategory::InvalidCommand
    }
}
