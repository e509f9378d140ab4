//! # Domain Types
//!
//! Core domain types shared by the engine, the stores and the presentation
//! layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐        ┌─────────────────────┐                │
//! │  │        Sale         │ 1    * │      Payment        │                │
//! │  │  ─────────────────  │◄───────│  ─────────────────  │                │
//! │  │  id (UUID)          │        │  id (UUID)          │                │
//! │  │  sale_number        │        │  sale_id (FK)       │                │
//! │  │  total_amount       │        │  amount             │                │
//! │  │  initial_payment    │        │  payment_date       │                │
//! │  │  remaining_balance* │        │  payment_method     │                │
//! │  │  status             │        └─────────────────────┘                │
//! │  └─────────────────────┘                                               │
//! │   * cached, derived from the payment ledger                            │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   SaleStatus    │   │ PaymentMethod   │                             │
//! │  │  Active         │   │  Cash           │                             │
//! │  │  Completed      │   │  BankTransfer   │                             │
//! │  │  Defaulted      │   │  Cheque         │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money Fields
//! Monetary columns are stored as `*_cents: i64` and exposed as [`Money`]
//! through accessor methods, so rows map one-to-one onto the database.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

/// Generates a new entity ID (UUID v4).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Sale Status
// =============================================================================

/// Lifecycle state of a credit sale.
///
/// ## Transitions
/// ```text
///            derived balance hits 0
///   Active ─────────────────────────► Completed
///     ▲                                   │
///     └───────────────────────────────────┘
///      payment edited/deleted, balance > 0
///
///   Active ──(manual action, outside the engine)──► Defaulted
///   Defaulted never changes automatically.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Balance outstanding, installments expected.
    Active,
    /// Balance fully paid.
    Completed,
    /// Written off by an explicit business decision.
    Defaulted,
}

impl SaleStatus {
    /// Status a sale should carry once its balance has been re-derived.
    ///
    /// `Defaulted` is sticky; every other status follows the settlement flag.
    ///
    /// ## Example
    /// ```rust
    /// use tread_core::SaleStatus;
    ///
    /// assert_eq!(SaleStatus::Active.reconciled(true), SaleStatus::Completed);
    /// assert_eq!(SaleStatus::Completed.reconciled(false), SaleStatus::Active);
    /// assert_eq!(SaleStatus::Defaulted.reconciled(true), SaleStatus::Defaulted);
    /// ```
    pub const fn reconciled(self, is_settled: bool) -> SaleStatus {
        match self {
            SaleStatus::Defaulted => SaleStatus::Defaulted,
            _ if is_settled => SaleStatus::Completed,
            _ => SaleStatus::Active,
        }
    }

    /// Lowercase name as stored in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Active => "active",
            SaleStatus::Completed => "completed",
            SaleStatus::Defaulted => "defaulted",
        }
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Active
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(SaleStatus::Active),
            "completed" => Ok(SaleStatus::Completed),
            "defaulted" => Ok(SaleStatus::Defaulted),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec![
                    "active".to_string(),
                    "completed".to_string(),
                    "defaulted".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Cheque,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => f.write_str("cash"),
            PaymentMethod::BankTransfer => f.write_str("bank_transfer"),
            PaymentMethod::Cheque => f.write_str("cheque"),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One credit purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Human-readable number printed on the customer's card.
    pub sale_number: String,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub initial_payment_cents: i64,
    /// `unit price × quantity + service charge`, fixed at creation or by an
    /// explicit terms edit.
    pub total_amount_cents: i64,
    /// Cached `max(0, total - paid)`. Only the engine writes it.
    pub remaining_balance_cents: i64,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn initial_payment(&self) -> Money {
        Money::from_cents(self.initial_payment_cents)
    }

    /// The cached balance. May be stale between a mutation and its sync.
    #[inline]
    pub fn remaining_balance(&self) -> Money {
        Money::from_cents(self.remaining_balance_cents)
    }
}

/// Everything a store needs to insert a sale; ids, numbers and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDraft {
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub sale_date: NaiveDate,
    pub initial_payment_cents: i64,
    pub total_amount_cents: i64,
    pub remaining_balance_cents: i64,
    pub status: SaleStatus,
}

/// A sale as entered at the counter, before totals are computed.
///
/// `unit_price_cents` and `service_charge_cents` are snapshots of the product
/// at the time of sale; the catalog itself lives outside this workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Falls back to the configured service charge when absent.
    pub service_charge_cents: Option<i64>,
    pub initial_payment_cents: i64,
    /// Defaults to today.
    #[ts(as = "Option<String>")]
    pub sale_date: Option<NaiveDate>,
}

/// Partial update of a sale row. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleUpdate {
    pub quantity: Option<i64>,
    pub initial_payment_cents: Option<i64>,
    pub total_amount_cents: Option<i64>,
    pub remaining_balance_cents: Option<i64>,
    pub status: Option<SaleStatus>,
}

impl SaleUpdate {
    /// Update carrying only the derived snapshot.
    pub fn snapshot(remaining_balance: Money, status: SaleStatus) -> Self {
        SaleUpdate {
            remaining_balance_cents: Some(remaining_balance.cents()),
            status: Some(status),
            ..SaleUpdate::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &SaleUpdate::default()
    }

    /// Applies the set fields to an in-memory sale.
    pub fn apply_to(&self, sale: &mut Sale) {
        if let Some(quantity) = self.quantity {
            sale.quantity = quantity;
        }
        if let Some(initial) = self.initial_payment_cents {
            sale.initial_payment_cents = initial;
        }
        if let Some(total) = self.total_amount_cents {
            sale.total_amount_cents = total;
        }
        if let Some(balance) = self.remaining_balance_cents {
            sale.remaining_balance_cents = balance;
        }
        if let Some(status) = self.status {
            sale.status = status;
        }
    }
}

/// Edit of a sale's financial terms, issued from the sale form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleTermsUpdate {
    pub quantity: Option<i64>,
    pub total_amount_cents: Option<i64>,
    pub initial_payment_cents: Option<i64>,
}

impl SaleTermsUpdate {
    /// Re-prices a sale for a new quantity: total becomes
    /// `unit_price × quantity + service_charge`.
    pub fn repriced(quantity: i64, unit_price: Money, service_charge: Money) -> Self {
        SaleTermsUpdate {
            quantity: Some(quantity),
            total_amount_cents: Some(
                crate::balance::sale_total(unit_price, quantity, service_charge).cents(),
            ),
            initial_payment_cents: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &SaleTermsUpdate::default()
    }
}

impl From<&SaleTermsUpdate> for SaleUpdate {
    fn from(terms: &SaleTermsUpdate) -> Self {
        SaleUpdate {
            quantity: terms.quantity,
            initial_payment_cents: terms.initial_payment_cents,
            total_amount_cents: terms.total_amount_cents,
            ..SaleUpdate::default()
        }
    }
}

// =============================================================================
// Sale Filter
// =============================================================================

/// Selection of sales for listings and bulk recompute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleFilter {
    pub status: Option<SaleStatus>,
    pub customer_id: Option<String>,
    /// Only sales whose cached balance is above zero.
    #[serde(default)]
    pub outstanding_only: bool,
    #[ts(as = "Option<String>")]
    pub date_from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub date_to: Option<NaiveDate>,
}

impl SaleFilter {
    /// Every sale.
    pub fn all() -> Self {
        SaleFilter::default()
    }

    /// Sales still being paid off, as listed on the payment screen.
    pub fn collectable() -> Self {
        SaleFilter {
            status: Some(SaleStatus::Active),
            outstanding_only: true,
            ..SaleFilter::default()
        }
    }

    /// Whether `sale` passes this filter.
    pub fn matches(&self, sale: &Sale) -> bool {
        if let Some(status) = self.status {
            if sale.status != status {
                return false;
            }
        }
        if let Some(ref customer_id) = self.customer_id {
            if &sale.customer_id != customer_id {
                return false;
            }
        }
        if self.outstanding_only && sale.remaining_balance_cents <= 0 {
            return false;
        }
        if let Some(from) = self.date_from {
            if sale.sale_date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if sale.sale_date > to {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Payment
// =============================================================================

/// One installment paid against a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

impl From<&Payment> for Money {
    fn from(payment: &Payment) -> Self {
        payment.amount()
    }
}

/// A payment about to be recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPayment {
    pub sale_id: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl NewPayment {
    /// A cash payment dated today.
    pub fn cash(sale_id: impl Into<String>, amount: Money) -> Self {
        NewPayment {
            sale_id: sale_id.into(),
            amount_cents: amount.cents(),
            payment_date: Utc::now().date_naive(),
            payment_method: PaymentMethod::Cash,
            notes: None,
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Partial edit of a recorded payment. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentChanges {
    /// Moves the payment to another sale.
    pub sale_id: Option<String>,
    pub amount_cents: Option<i64>,
    #[ts(as = "Option<String>")]
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

impl PaymentChanges {
    /// Changes that affect some sale's balance.
    pub fn touches_balance(&self) -> bool {
        self.sale_id.is_some() || self.amount_cents.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self == &PaymentChanges::default()
    }

    /// Applies the set fields to an in-memory payment.
    pub fn apply_to(&self, payment: &mut Payment) {
        if let Some(ref sale_id) = self.sale_id {
            payment.sale_id = sale_id.clone();
        }
        if let Some(amount) = self.amount_cents {
            payment.amount_cents = amount;
        }
        if let Some(date) = self.payment_date {
            payment.payment_date = date;
        }
        if let Some(method) = self.payment_method {
            payment.payment_method = method;
        }
        if let Some(ref notes) = self.notes {
            payment.notes = Some(notes.clone());
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(status: SaleStatus, balance: i64, date: NaiveDate) -> Sale {
        let now = Utc::now();
        Sale {
            id: "sale-1".to_string(),
            sale_number: "S-20260101-0001".to_string(),
            customer_id: "cust-1".to_string(),
            product_id: "tyre-1".to_string(),
            quantity: 1,
            sale_date: date,
            initial_payment_cents: 61_000,
            total_amount_cents: 570_000,
            remaining_balance_cents: balance,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_default_is_active() {
        assert_eq!(SaleStatus::default(), SaleStatus::Active);
    }

    #[test]
    fn test_status_reconciled() {
        assert_eq!(SaleStatus::Active.reconciled(false), SaleStatus::Active);
        assert_eq!(SaleStatus::Active.reconciled(true), SaleStatus::Completed);
        assert_eq!(SaleStatus::Completed.reconciled(true), SaleStatus::Completed);
        assert_eq!(SaleStatus::Completed.reconciled(false), SaleStatus::Active);
        assert_eq!(SaleStatus::Defaulted.reconciled(true), SaleStatus::Defaulted);
        assert_eq!(SaleStatus::Defaulted.reconciled(false), SaleStatus::Defaulted);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Completed".parse::<SaleStatus>().unwrap(), SaleStatus::Completed);
        assert!("voided".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"bank_transfer\""
        );
        assert_eq!(
            serde_json::to_string(&SaleStatus::Defaulted).unwrap(),
            "\"defaulted\""
        );
    }

    #[test]
    fn test_sale_update_apply() {
        let mut s = sale(SaleStatus::Active, 509_000, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        SaleUpdate::snapshot(Money::zero(), SaleStatus::Completed).apply_to(&mut s);
        assert_eq!(s.remaining_balance_cents, 0);
        assert_eq!(s.status, SaleStatus::Completed);
        assert_eq!(s.total_amount_cents, 570_000);
    }

    #[test]
    fn test_filter_matches() {
        let jan = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let open = sale(SaleStatus::Active, 509_000, jan);
        let paid = sale(SaleStatus::Completed, 0, jan);

        assert!(SaleFilter::all().matches(&paid));
        assert!(SaleFilter::collectable().matches(&open));
        assert!(!SaleFilter::collectable().matches(&paid));

        let february = SaleFilter {
            date_from: NaiveDate::from_ymd_opt(2026, 2, 1),
            ..SaleFilter::default()
        };
        assert!(!february.matches(&open));

        let other_customer = SaleFilter {
            customer_id: Some("cust-2".to_string()),
            ..SaleFilter::default()
        };
        assert!(!other_customer.matches(&open));
    }

    #[test]
    fn test_payment_changes_touches_balance() {
        let notes_only = PaymentChanges {
            notes: Some("paid at branch".to_string()),
            ..PaymentChanges::default()
        };
        assert!(!notes_only.touches_balance());

        let amount = PaymentChanges {
            amount_cents: Some(5_700),
            ..PaymentChanges::default()
        };
        assert!(amount.touches_balance());
    }

    #[test]
    fn test_repriced_terms() {
        let terms = SaleTermsUpdate::repriced(2, Money::from_major(5000), Money::from_major(700));
        assert_eq!(terms.quantity, Some(2));
        assert_eq!(terms.total_amount_cents, Some(Money::from_major(10_700).cents()));
    }
}
