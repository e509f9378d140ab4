//! # Engine Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      What Was Committed?                                │
//! │                                                                         │
//! │  EngineError::Core       nothing     bad input, unknown id,            │
//! │                                      overpayment                       │
//! │                                                                         │
//! │  EngineError::Store      nothing     fetch failed, or the mutation     │
//! │                                      write itself failed               │
//! │                                                                         │
//! │  EngineError::SyncFailed the         payment ledger is correct, the    │
//! │                          mutation    cached balance is stale.          │
//! │                                      Retry recompute_and_persist on    │
//! │                                      every stale_sales() id only.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use tread_core::CoreError;
use tread_db::DbError;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Store Error
// =============================================================================

/// Failure reported by a [`SalesStore`](crate::store::SalesStore) or
/// [`PaymentsStore`](crate::store::PaymentsStore), independent of backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Entity to update or delete does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Backend could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Backend rejected the operation.
    #[error("Store error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            other if other.is_unavailable() => StoreError::Unavailable(other.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

// =============================================================================
// Mutation
// =============================================================================

/// The write that preceded a failed synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    PaymentRecorded,
    PaymentEdited,
    PaymentDeleted,
    SaleTermsEdited,
    /// No mutation; a plain recompute failed to write.
    Recompute,
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mutation::PaymentRecorded => write!(f, "payment recorded"),
            Mutation::PaymentEdited => write!(f, "payment edited"),
            Mutation::PaymentDeleted => write!(f, "payment deleted"),
            Mutation::SaleTermsEdited => write!(f, "sale terms edited"),
            Mutation::Recompute => write!(f, "recompute"),
        }
    }
}

// =============================================================================
// Engine Error
// =============================================================================

/// Error returned by [`BalanceEngine`](crate::engine::BalanceEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule rejected the request. Nothing was written.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A read, or the mutation write itself, failed. Nothing was written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The mutation is durable but the cached balance of the listed sales
    /// could not be brought up to date. A moved payment can leave both its
    /// old and its new sale stale.
    #[error("{mutation}, balance sync failed for sale {}: {source}", .sale_ids.join(", "))]
    SyncFailed {
        sale_ids: Vec<String>,
        mutation: Mutation,
        #[source]
        source: StoreError,
    },
}

impl EngineError {
    /// True when the caller should retry `recompute_and_persist` for each of
    /// [`stale_sales`](Self::stale_sales) and must not repeat the mutation.
    pub fn needs_resync(&self) -> bool {
        matches!(self, EngineError::SyncFailed { .. })
    }

    /// First sale whose cached balance is stale, if any.
    pub fn stale_sale(&self) -> Option<&str> {
        self.stale_sales().into_iter().next()
    }

    /// Every sale whose cached balance is stale.
    pub fn stale_sales(&self) -> Vec<&str> {
        match self {
            EngineError::SyncFailed { sale_ids, .. } => {
                sale_ids.iter().map(String::as_str).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Folds a second sync failure of the same mutation into this one. The
    /// first failure's cause is kept.
    pub(crate) fn and_stale(self, other: EngineError) -> EngineError {
        match (self, other) {
            (
                EngineError::SyncFailed {
                    mut sale_ids,
                    mutation,
                    source,
                },
                EngineError::SyncFailed { sale_ids: more, .. },
            ) => {
                sale_ids.extend(more);
                EngineError::SyncFailed {
                    sale_ids,
                    mutation,
                    source,
                }
            }
            (first, _) => first,
        }
    }
}
