//! Unified error types for the club ledger.
//!
//! Single-record operations surface these verbatim to the caller. Batch operations
//! (imports) convert per-row failures into strings on their summary instead.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input: unparseable date or amount, out-of-range month, missing column
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// A member, category, session or payment lookup failed
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier used for the lookup
        key: String,
    },

    /// A write would violate a uniqueness rule
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting record
        message: String,
    },

    /// Monetary amount was negative or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Configuration could not be loaded or interpreted
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Underlying storage failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// CSV input could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Header pattern failed to compile
    #[error("Pattern error: {0}")]
    Regex(#[from] regex::Error),

    /// File could not be opened or read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`] on the given entity kind.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
