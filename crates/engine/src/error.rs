//! Engine error model.

use thiserror::Error;

use curio_core::DomainError;

use crate::store::StoreError;

/// Error surfaced by engine operations.
///
/// Every failure is per-request: a failed operation rolls its transaction
/// back in full and the caller receives exactly one of these, never a
/// partially-applied state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Whether the whole operation can safely be retried from scratch.
    ///
    /// True only for store-level serialization conflicts and lock timeouts;
    /// nothing partial was committed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Store(StoreError::Conflict(_)))
    }
}
