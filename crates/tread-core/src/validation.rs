//! # Validation Module
//!
//! Input validation for sales and payments before they reach a store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Forms (presentation layer)                                   │
//! │  ├── Basic format checks (empty, numeric)                              │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: BalanceEngine (Rust)                                         │
//! │  ├── THIS MODULE: field rules, minimum initial payment                 │
//! │  └── check_within_balance against the live derived balance             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key payments.sale_id → sales.id                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tread_core::validation::{validate_payment_amount, validate_quantity};
//!
//! validate_payment_amount(5_700).unwrap();
//! validate_quantity(2).unwrap();
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{NewPayment, NewSale, PaymentChanges, SaleTermsUpdate};
use crate::{MAX_NOTES_LENGTH, MAX_SALE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates that an entity reference (customer, product, sale id) is present.
pub fn validate_reference(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates optional payment notes.
///
/// ## Example
/// ```rust
/// use tread_core::validation::validate_notes;
///
/// assert!(validate_notes(None).is_ok());
/// assert!(validate_notes(Some("paid by brother")).is_ok());
/// assert!(validate_notes(Some(&"x".repeat(501))).is_err());
/// ```
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    match notes {
        Some(text) if text.chars().count() > MAX_NOTES_LENGTH => Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LENGTH,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_SALE_QUANTITY (100)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_SALE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_SALE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or total in cents. Zero is allowed.
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a payment amount in cents.
///
/// ## Example
/// ```rust
/// use tread_core::validation::validate_payment_amount;
///
/// assert!(validate_payment_amount(5_700).is_ok());
/// assert!(validate_payment_amount(0).is_err());
/// assert!(validate_payment_amount(-100).is_err());
/// ```
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates the down payment taken when a sale is recorded.
///
/// ## Rules
/// - At least `minimum`, unless the whole sale costs less than that
/// - Never more than the sale total
///
/// ## Example
/// ```rust
/// use tread_core::money::Money;
/// use tread_core::validation::validate_initial_payment;
///
/// let min = Money::from_major(610);
/// let total = Money::from_major(5700);
///
/// assert!(validate_initial_payment(Money::from_major(610), min, total).is_ok());
/// assert!(validate_initial_payment(Money::from_major(500), min, total).is_err());
/// assert!(validate_initial_payment(Money::from_major(6000), min, total).is_err());
/// ```
pub fn validate_initial_payment(
    amount: Money,
    minimum: Money,
    total: Money,
) -> ValidationResult<()> {
    let minimum = minimum.min(total.clamp_non_negative());

    if amount < minimum {
        return Err(ValidationError::BelowMinimum {
            field: "initial payment".to_string(),
            minimum,
        });
    }

    if amount > total {
        return Err(ValidationError::AboveMaximum {
            field: "initial payment".to_string(),
            maximum: total,
        });
    }

    Ok(())
}

// =============================================================================
// Balance Rules
// =============================================================================

/// Rejects a payment larger than the sale's live outstanding balance.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Payment form                                                           │
/// │                                                                         │
/// │  Sale selected, outstanding derived from the ledger: Rs. 5090          │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  check_within_balance(sale, 5090, amount) ← THIS FUNCTION              │
/// │       │                                                                 │
/// │       ├── amount > 5090? → Overpayment                                  │
/// │       │                                                                 │
/// │       └── OK → payment is written                                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn check_within_balance(sale_id: &str, outstanding: Money, attempted: Money) -> CoreResult<()> {
    if attempted > outstanding {
        return Err(CoreError::Overpayment {
            sale_id: sale_id.to_string(),
            outstanding,
            attempted,
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates a sale as entered at the counter, given its computed total.
pub fn validate_new_sale(sale: &NewSale, total: Money, minimum_initial: Money) -> ValidationResult<()> {
    validate_reference("customer_id", &sale.customer_id)?;
    validate_reference("product_id", &sale.product_id)?;
    validate_quantity(sale.quantity)?;
    validate_price_cents("unit price", sale.unit_price_cents)?;
    if let Some(service_charge) = sale.service_charge_cents {
        validate_price_cents("service charge", service_charge)?;
    }
    validate_initial_payment(
        Money::from_cents(sale.initial_payment_cents),
        minimum_initial,
        total,
    )
}

pub fn validate_new_payment(payment: &NewPayment) -> ValidationResult<()> {
    validate_reference("sale_id", &payment.sale_id)?;
    validate_payment_amount(payment.amount_cents)?;
    validate_notes(payment.notes.as_deref())
}

pub fn validate_payment_changes(changes: &PaymentChanges) -> ValidationResult<()> {
    if let Some(ref sale_id) = changes.sale_id {
        validate_reference("sale_id", sale_id)?;
    }
    if let Some(amount) = changes.amount_cents {
        validate_payment_amount(amount)?;
    }
    validate_notes(changes.notes.as_deref())
}

/// Validates an edit of a sale's terms.
///
/// The minimum initial payment is only enforced at creation; a correction of
/// an old sale may legitimately record a smaller figure.
pub fn validate_terms_update(terms: &SaleTermsUpdate) -> ValidationResult<()> {
    if let Some(quantity) = terms.quantity {
        validate_quantity(quantity)?;
    }
    if let Some(total) = terms.total_amount_cents {
        validate_price_cents("total amount", total)?;
    }
    if let Some(initial) = terms.initial_payment_cents {
        validate_price_cents("initial payment", initial)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
