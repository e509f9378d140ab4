//! # Balance Derivation
//!
//! The single formula every part of the system uses for "how much is still
//! owed on this sale".
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   total_paid        = initial_payment + Σ payment.amount               │
//! │   remaining_balance = max(0, total_amount - total_paid)                │
//! │   is_settled        = remaining_balance == 0                           │
//! │                                                                         │
//! │   • every recorded payment counts, whatever its date                   │
//! │   • registration fees are NOT payments and never enter the sum         │
//! │   • negative inputs are clamped to zero, never rejected                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Sale;

// =============================================================================
// Sale Terms
// =============================================================================

/// The two numbers of a sale that the balance depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTerms {
    pub total_amount: Money,
    pub initial_payment: Money,
}

impl SaleTerms {
    pub const fn new(total_amount: Money, initial_payment: Money) -> Self {
        SaleTerms {
            total_amount,
            initial_payment,
        }
    }
}

impl From<&Sale> for SaleTerms {
    fn from(sale: &Sale) -> Self {
        SaleTerms::new(sale.total_amount(), sale.initial_payment())
    }
}

// =============================================================================
// Balance Snapshot
// =============================================================================

/// Result of deriving a sale's balance from its payment ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BalanceSnapshot {
    pub remaining_balance: Money,
    /// Initial payment plus every installment.
    pub total_paid: Money,
    pub is_settled: bool,
}

impl BalanceSnapshot {
    /// How far the payments exceed the total (zero when they do not).
    pub fn overpaid_by(&self, terms: SaleTerms) -> Money {
        self.total_paid
            .saturating_sub(terms.total_amount.clamp_non_negative())
            .clamp_non_negative()
    }
}

/// Derives the remaining balance of one sale.
///
/// Accepts anything that yields payment amounts: a slice of [`Payment`]s
/// (by reference), or plain [`Money`] values.
///
/// ## Example
/// ```rust
/// use tread_core::balance::{derive_balance, SaleTerms};
/// use tread_core::money::Money;
///
/// let terms = SaleTerms::new(Money::from_major(1000), Money::from_major(200));
/// let snapshot = derive_balance(terms, [Money::from_major(1500)]);
///
/// // Overpaid sales clamp to zero, never negative
/// assert_eq!(snapshot.remaining_balance, Money::zero());
/// assert!(snapshot.is_settled);
/// ```
///
/// [`Payment`]: crate::types::Payment
pub fn derive_balance<I>(terms: SaleTerms, payments: I) -> BalanceSnapshot
where
    I: IntoIterator,
    I::Item: Into<Money>,
{
    let installments: Money = payments
        .into_iter()
        .map(|amount| amount.into().clamp_non_negative())
        .sum();

    let total_paid = terms
        .initial_payment
        .clamp_non_negative()
        .saturating_add(installments);

    let remaining_balance = terms
        .total_amount
        .clamp_non_negative()
        .saturating_sub(total_paid)
        .clamp_non_negative();

    BalanceSnapshot {
        remaining_balance,
        total_paid,
        is_settled: remaining_balance.is_zero(),
    }
}

/// Total of a new sale: `unit_price × quantity + service_charge`.
///
/// The service charge is charged once per sale, not per unit.
///
/// ## Example
/// ```rust
/// use tread_core::balance::sale_total;
/// use tread_core::money::Money;
///
/// let total = sale_total(Money::from_major(5000), 1, Money::from_major(700));
/// assert_eq!(total, Money::from_major(5700));
/// ```
pub fn sale_total(unit_price: Money, quantity: i64, service_charge: Money) -> Money {
    unit_price
        .multiply_quantity(quantity)
        .saturating_add(service_charge)
}

/// Number of daily installments still needed to clear `balance`.
///
/// ## Example
/// ```rust
/// use tread_core::balance::installments_remaining;
/// use tread_core::money::Money;
///
/// assert_eq!(installments_remaining(Money::from_major(5090), Money::from_major(57)), 90);
/// assert_eq!(installments_remaining(Money::zero(), Money::from_major(57)), 0);
/// ```
pub fn installments_remaining(balance: Money, daily_installment: Money) -> i64 {
    if !balance.is_positive() || !daily_installment.is_positive() {
        return 0;
    }
    let (b, d) = (balance.cents(), daily_installment.cents());
    b / d + i64::from(b % d != 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Payment, PaymentMethod};
    use chrono::{NaiveDate, Utc};

    fn rs(major: i64) -> Money {
        Money::from_major(major)
    }

    fn payment(amount: Money, day: u32) -> Payment {
        Payment {
            id: format!("pay-{day}"),
            sale_id: "sale-1".to_string(),
            amount_cents: amount.cents(),
            payment_date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            payment_method: PaymentMethod::Cash,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn standard_terms() -> SaleTerms {
        SaleTerms::new(rs(5700), rs(610))
    }

    #[test]
    fn test_no_payments() {
        let snapshot = derive_balance(standard_terms(), Vec::<Money>::new());
        assert_eq!(snapshot.remaining_balance, rs(5090));
        assert_eq!(snapshot.total_paid, rs(610));
        assert!(!snapshot.is_settled);
    }

    #[test]
    fn test_single_installment() {
        let payments = vec![payment(rs(57), 1)];
        let snapshot = derive_balance(standard_terms(), &payments);
        assert_eq!(snapshot.remaining_balance, rs(5033));
    }

    #[test]
    fn test_exact_settlement() {
        // 89 × 57 = 5073, plus 17 = 5090
        let mut amounts = vec![rs(57); 89];
        amounts.push(rs(17));
        let snapshot = derive_balance(standard_terms(), amounts);
        assert_eq!(snapshot.remaining_balance, Money::zero());
        assert!(snapshot.is_settled);
    }

    #[test]
    fn test_overpayment_clamps_to_zero() {
        let terms = SaleTerms::new(rs(1000), rs(200));
        let snapshot = derive_balance(terms, [rs(1500)]);
        assert_eq!(snapshot.remaining_balance, Money::zero());
        assert!(snapshot.is_settled);
        assert_eq!(snapshot.overpaid_by(terms), rs(700));
    }

    #[test]
    fn test_negative_inputs_are_clamped() {
        let terms = SaleTerms::new(rs(1000), rs(-50));
        let snapshot = derive_balance(terms, [rs(-300), rs(100)]);
        assert_eq!(snapshot.total_paid, rs(100));
        assert_eq!(snapshot.remaining_balance, rs(900));

        let negative_total = SaleTerms::new(rs(-10), Money::zero());
        assert!(derive_balance(negative_total, Vec::<Money>::new()).is_settled);
    }

    #[test]
    fn test_duplicates_are_summed_and_dates_ignored() {
        let payments = vec![payment(rs(57), 1), payment(rs(57), 1), payment(rs(57), 28)];
        let snapshot = derive_balance(standard_terms(), &payments);
        assert_eq!(snapshot.remaining_balance, rs(5090 - 171));
    }

    #[test]
    fn test_matches_reference_formula() {
        let cases: [(i64, i64, &[i64]); 5] = [
            (570_000, 61_000, &[]),
            (570_000, 61_000, &[5_700, 5_700, 1]),
            (100_000, 20_000, &[150_000]),
            (0, 0, &[]),
            (12_345, 0, &[12_344]),
        ];
        for (total, initial, paid) in cases {
            let terms = SaleTerms::new(Money::from_cents(total), Money::from_cents(initial));
            let snapshot = derive_balance(terms, paid.iter().map(|c| Money::from_cents(*c)));
            let expected = (total - (initial + paid.iter().sum::<i64>())).max(0);
            assert_eq!(snapshot.remaining_balance.cents(), expected);
            assert_eq!(snapshot.is_settled, expected == 0);
        }
    }

    #[test]
    fn test_sale_total_charges_service_once() {
        assert_eq!(sale_total(rs(5000), 2, rs(700)), rs(10_700));
    }

    #[test]
    fn test_installments_remaining_rounds_up() {
        assert_eq!(installments_remaining(rs(57), rs(57)), 1);
        assert_eq!(installments_remaining(rs(58), rs(57)), 2);
        assert_eq!(installments_remaining(rs(100), Money::zero()), 0);
    }
}
