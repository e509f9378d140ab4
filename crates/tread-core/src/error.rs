//! # Error Types
//!
//! Domain-specific error types for tread-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tread-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tread-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  tread-reconcile errors                                                │
//! │  ├── StoreError       - What a SalesStore / PaymentsStore reports      │
//! │  └── EngineError      - What callers of BalanceEngine see              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Caller              │
//! │        DbError → StoreError ──────────┘                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule failures.
///
/// Raised before anything is written, so the ledger is untouched when one of
/// these comes back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Sale does not exist in the store.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Payment does not exist in the store.
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Payment would take the total paid past the sale total.
    ///
    /// ## User Workflow
    /// ```text
    /// Payment form (amount: 6000)
    ///      │
    ///      ▼
    /// Derive live balance: outstanding = 5090
    ///      │
    ///      ▼
    /// Overpayment { outstanding: 5090, attempted: 6000 }
    ///      │
    ///      ▼
    /// UI shows: "Amount exceeds the remaining balance of Rs. 5090.00"
    /// ```
    #[error("Payment of {attempted} exceeds the remaining balance of {outstanding} on sale {sale_id}")]
    Overpayment {
        sale_id: String,
        outstanding: Money,
        attempted: Money,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Amount is smaller than the business minimum.
    #[error("{field} must be at least {minimum}")]
    BelowMinimum { field: String, minimum: Money },

    /// Amount is larger than what it is paying towards.
    #[error("{field} cannot exceed {maximum}")]
    AboveMaximum { field: String, maximum: Money },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::Overpayment {
            sale_id: "sale-1".to_string(),
            outstanding: Money::from_major(5090),
            attempted: Money::from_major(6000),
        };
        assert_eq!(
            err.to_string(),
            "Payment of Rs. 6000.00 exceeds the remaining balance of Rs. 5090.00 on sale sale-1"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer_id".to_string(),
        };
        assert_eq!(err.to_string(), "customer_id is required");

        let err = ValidationError::BelowMinimum {
            field: "initial payment".to_string(),
            minimum: Money::from_major(610),
        };
        assert_eq!(err.to_string(), "initial payment must be at least Rs. 610.00");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
