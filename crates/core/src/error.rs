//! Domain error model.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// availability, bans). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, zero quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A line's required quantity exceeds live availability for the named
    /// item. Expected, user-facing, not retried automatically.
    #[error("insufficient stock for \"{item}\"")]
    InsufficientStock { item: String },

    /// The user is in reservation cool-down until the given instant.
    #[error("banned until {until}")]
    Banned { until: DateTime<Utc> },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn insufficient_stock(item: impl Into<String>) -> Self {
        Self::InsufficientStock { item: item.into() }
    }

    pub fn banned(until: DateTime<Utc>) -> Self {
        Self::Banned { until }
    }
}
