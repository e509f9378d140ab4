//! # tread-core: Pure Business Logic for Tread Installments
//!
//! Everything about a credit sale's money that can be decided without
//! touching storage lives here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tread Installments Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Presentation (tables, payment form, dashboards)          │   │
//! │  │        reads the cached remaining_balance / status only         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tread-reconcile (BalanceEngine)                 │   │
//! │  │   create_sale, record_payment, edit/delete payment, recompute   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tread-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  balance  │  │ validation│  │   │
//! │  │   │   Sale    │  │   Money   │  │  derive   │  │   rules   │  │   │
//! │  │   │  Payment  │  │           │  │  status   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, Payment, SaleStatus, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`balance`] - Remaining-balance derivation and settlement rules
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tread_core::balance::{derive_balance, SaleTerms};
//! use tread_core::money::Money;
//!
//! let terms = SaleTerms::new(Money::from_major(5700), Money::from_major(610));
//! let snapshot = derive_balance(terms, [Money::from_major(57)]);
//!
//! assert_eq!(snapshot.remaining_balance, Money::from_major(5033));
//! assert!(!snapshot.is_settled);
//! ```

pub mod balance;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use balance::{derive_balance, BalanceSnapshot, SaleTerms};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Fixed service charge added once per sale, regardless of quantity (Rs. 700).
pub const DEFAULT_SERVICE_CHARGE: Money = Money::from_major(700);

/// Smallest initial payment accepted when a sale is recorded (Rs. 610).
pub const DEFAULT_MINIMUM_INITIAL_PAYMENT: Money = Money::from_major(610);

/// Expected daily installment used for "installments left" estimates (Rs. 57).
pub const DEFAULT_DAILY_INSTALLMENT: Money = Money::from_major(57);

/// Largest quantity accepted on a single credit sale.
pub const MAX_SALE_QUANTITY: i64 = 100;

/// Longest free-text note stored on a payment.
pub const MAX_NOTES_LENGTH: usize = 500;
