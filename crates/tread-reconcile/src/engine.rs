//! # Balance Engine
//!
//! Every write that can change what a sale owes goes through here, and every
//! one of them ends with the same synchronization step.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mutation Pipeline                                │
//! │                                                                         │
//! │  record_payment / edit_payment / delete_payment / edit_sale_terms      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate input ─────────────► EngineError::Core (nothing written)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock sale(s) (SaleLocks)                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  write to store ─────────────► EngineError::Store (nothing written)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SYNC: re-read sale + ALL payments                                     │
//! │        derive_balance → reconciled status                              │
//! │        update_sale only if something changed                           │
//! │       │                                                                 │
//! │       ├── fails ─────────────► EngineError::SyncFailed                 │
//! │       │                        (ledger correct, cache stale, retry     │
//! │       ▼                         recompute_and_persist)                 │
//! │  Reconciliation                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read Paths
//! - [`BalanceEngine::derive_sale_balance`]: one sale, live, errors propagate
//! - [`BalanceEngine::derive_balances`]: many sales, one payment fetch,
//!   falls back to the cached snapshot on failure

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ts_rs::TS;

use tread_core::balance::{derive_balance, installments_remaining, sale_total, BalanceSnapshot, SaleTerms};
use tread_core::validation;
use tread_core::{
    CoreError, Money, NewPayment, NewSale, Payment, PaymentChanges, Sale, SaleDraft, SaleFilter,
    SaleStatus, SaleTermsUpdate, SaleUpdate,
};

use crate::config::BalanceRules;
use crate::error::{EngineError, EngineResult, Mutation, StoreError};
use crate::locks::{SaleGuard, SaleLocks};
use crate::store::{PaymentsStore, SalesStore};

// =============================================================================
// Results
// =============================================================================

/// Outcome of synchronizing one sale's cached snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Reconciliation {
    pub sale_id: String,
    pub remaining_balance: Money,
    pub status: SaleStatus,
    pub previous_balance: Money,
    pub previous_status: SaleStatus,
    /// Whether the stored snapshot was rewritten.
    pub changed: bool,
}

impl Reconciliation {
    pub fn status_changed(&self) -> bool {
        self.status != self.previous_status
    }
}

/// A recorded or edited payment together with its sale's new snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct PaymentOutcome {
    pub payment: Payment,
    pub reconciliation: Reconciliation,
    /// Sale the payment was moved away from, when an edit moved it.
    pub moved_from: Option<Reconciliation>,
}

/// One sale that `recompute_all` could not repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct RecomputeFailure {
    pub sale_id: String,
    pub error: String,
}

/// Summary of a bulk recompute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct RecomputeReport {
    pub examined: usize,
    /// Sales whose stored snapshot was stale and has been rewritten.
    pub corrected: usize,
    pub failures: Vec<RecomputeFailure>,
}

impl RecomputeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Where a synchronization stopped.
enum SyncStep {
    SaleMissing,
    Read(StoreError),
    Write(StoreError),
}

// =============================================================================
// Engine
// =============================================================================

/// Derives balances from the payment ledger and keeps each sale's cached
/// `remaining_balance` / `status` in step with it.
///
/// Clones share the same stores and the same lock registry. Two engines built
/// separately with [`BalanceEngine::new`] do not order their mutations.
///
/// ## Example
/// ```rust,ignore
/// let store = Arc::new(MemoryStore::new());
/// let engine = BalanceEngine::new(store.clone(), store, BalanceRules::default());
///
/// let sale = engine.create_sale(new_sale).await?;
/// let outcome = engine
///     .record_payment(NewPayment::cash(&sale.id, Money::from_major(57)))
///     .await?;
/// assert_eq!(outcome.reconciliation.remaining_balance, Money::from_major(5033));
/// ```
pub struct BalanceEngine<S, P> {
    sales: Arc<S>,
    payments: Arc<P>,
    rules: BalanceRules,
    locks: Arc<SaleLocks>,
}

impl<S, P> Clone for BalanceEngine<S, P> {
    fn clone(&self) -> Self {
        BalanceEngine {
            sales: Arc::clone(&self.sales),
            payments: Arc::clone(&self.payments),
            rules: self.rules.clone(),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<S: SalesStore, P: PaymentsStore> BalanceEngine<S, P> {
    pub fn new(sales: Arc<S>, payments: Arc<P>, rules: BalanceRules) -> Self {
        BalanceEngine {
            sales,
            payments,
            rules,
            locks: Arc::new(SaleLocks::new()),
        }
    }

    pub fn rules(&self) -> &BalanceRules {
        &self.rules
    }

    pub fn sales_store(&self) -> &S {
        &self.sales
    }

    pub fn payments_store(&self) -> &P {
        &self.payments
    }

    // =========================================================================
    // Read Paths
    // =========================================================================

    /// Live balance of one sale from freshly fetched payments.
    ///
    /// Fetch errors propagate; use this wherever a wrong number would be
    /// acted on.
    pub async fn derive_sale_balance(&self, sale_id: &str) -> EngineResult<(Sale, BalanceSnapshot)> {
        let sale = self
            .sales
            .get_sale(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        let payments = self.payments.get_payments_for_sale(sale_id).await?;

        let snapshot = derive_balance(SaleTerms::from(&sale), &payments);
        Ok((sale, snapshot))
    }

    /// Overwrites each sale's `remaining_balance` with the live derived
    /// value, using a single payment fetch for the whole set.
    ///
    /// Order is preserved. Status is left as stored. If the fetch fails the
    /// input comes back unchanged, so display callers keep the cached figures.
    pub async fn derive_balances(&self, sales: Vec<Sale>) -> Vec<Sale> {
        if sales.is_empty() {
            return sales;
        }

        let ids: Vec<String> = sales.iter().map(|s| s.id.clone()).collect();
        let payments = match self.payments.get_payments_for_sales(&ids).await {
            Ok(payments) => payments,
            Err(err) => {
                warn!(
                    sales = sales.len(),
                    error = %err,
                    "Batch payment fetch failed, using cached balances"
                );
                return sales;
            }
        };

        let mut paid_by_sale: HashMap<&str, Vec<Money>> = HashMap::new();
        for payment in &payments {
            paid_by_sale
                .entry(payment.sale_id.as_str())
                .or_default()
                .push(payment.amount());
        }

        let derived: Vec<Sale> = sales
            .into_iter()
            .map(|mut sale| {
                let paid = paid_by_sale.get(sale.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                let snapshot = derive_balance(SaleTerms::from(&sale), paid.iter().copied());
                sale.remaining_balance_cents = snapshot.remaining_balance.cents();
                sale
            })
            .collect();

        debug!(
            sales = derived.len(),
            payments = payments.len(),
            "Derived balances in batch"
        );
        derived
    }

    /// Sales still being paid off (active with a live balance above zero),
    /// as listed on the payment screen.
    ///
    /// Candidates are picked by status only; a cached balance of zero may be
    /// stale.
    pub async fn collectable_sales(&self) -> EngineResult<Vec<Sale>> {
        let active = SaleFilter {
            status: Some(SaleStatus::Active),
            ..SaleFilter::default()
        };
        let candidates = self.sales.get_sales(&active).await?;
        let derived = self.derive_balances(candidates).await;
        Ok(derived
            .into_iter()
            .filter(|sale| sale.remaining_balance().is_positive())
            .collect())
    }

    /// Daily installments still needed to clear a sale's cached balance.
    pub fn installments_left(&self, sale: &Sale) -> i64 {
        installments_remaining(sale.remaining_balance(), self.rules.daily_installment())
    }

    // =========================================================================
    // Synchronization
    // =========================================================================

    /// Re-derives one sale from its full payment ledger and persists the
    /// balance and status when they differ from what is stored.
    ///
    /// Idempotent: a second call with no mutation in between changes nothing.
    pub async fn recompute_and_persist(&self, sale_id: &str) -> EngineResult<Reconciliation> {
        let _guard = self.locks.lock(sale_id).await;

        match self.reconcile(sale_id).await {
            Ok(reconciliation) => Ok(reconciliation),
            Err(SyncStep::SaleMissing) => Err(CoreError::SaleNotFound(sale_id.to_string()).into()),
            Err(SyncStep::Read(err)) => Err(EngineError::Store(err)),
            Err(SyncStep::Write(source)) => Err(EngineError::SyncFailed {
                sale_ids: vec![sale_id.to_string()],
                mutation: Mutation::Recompute,
                source,
            }),
        }
    }

    /// Synchronization after a committed mutation; every failure is a
    /// `SyncFailed`. Caller holds the sale's lock.
    async fn sync_after(&self, sale_id: &str, mutation: Mutation) -> EngineResult<Reconciliation> {
        self.reconcile(sale_id).await.map_err(|step| {
            let source = match step {
                SyncStep::SaleMissing => StoreError::not_found("Sale", sale_id),
                SyncStep::Read(err) | SyncStep::Write(err) => err,
            };
            warn!(
                sale_id = %sale_id,
                mutation = %mutation,
                error = %source,
                "Balance sync failed after mutation"
            );
            EngineError::SyncFailed {
                sale_ids: vec![sale_id.to_string()],
                mutation,
                source,
            }
        })
    }

    async fn reconcile(&self, sale_id: &str) -> Result<Reconciliation, SyncStep> {
        let sale = self
            .sales
            .get_sale(sale_id)
            .await
            .map_err(SyncStep::Read)?
            .ok_or(SyncStep::SaleMissing)?;
        let payments = self
            .payments
            .get_payments_for_sale(sale_id)
            .await
            .map_err(SyncStep::Read)?;

        let snapshot = derive_balance(SaleTerms::from(&sale), &payments);
        let status = sale.status.reconciled(snapshot.is_settled);

        let reconciliation = Reconciliation {
            sale_id: sale.id.clone(),
            remaining_balance: snapshot.remaining_balance,
            status,
            previous_balance: sale.remaining_balance(),
            previous_status: sale.status,
            changed: snapshot.remaining_balance != sale.remaining_balance() || status != sale.status,
        };

        if reconciliation.changed {
            self.sales
                .update_sale(sale_id, SaleUpdate::snapshot(snapshot.remaining_balance, status))
                .await
                .map_err(SyncStep::Write)?;

            debug!(
                sale_id = %sale_id,
                from = %reconciliation.previous_balance,
                to = %reconciliation.remaining_balance,
                "Remaining balance updated"
            );
            if reconciliation.status_changed() {
                info!(
                    sale_id = %sale_id,
                    from = %reconciliation.previous_status,
                    to = %status,
                    "Sale status changed"
                );
            }
        }

        Ok(reconciliation)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Records a new credit sale.
    ///
    /// Total is `unit_price × quantity + service_charge`; the sale starts
    /// `completed` if the initial payment already covers it.
    pub async fn create_sale(&self, new: NewSale) -> EngineResult<Sale> {
        let service_charge = new
            .service_charge_cents
            .map(Money::from_cents)
            .unwrap_or_else(|| self.rules.service_charge());
        let total = sale_total(Money::from_cents(new.unit_price_cents), new.quantity, service_charge);
        validation::validate_new_sale(&new, total, self.rules.minimum_initial_payment())
            .map_err(CoreError::from)?;

        let initial = Money::from_cents(new.initial_payment_cents);
        let snapshot = derive_balance(SaleTerms::new(total, initial), std::iter::empty::<Money>());

        let draft = SaleDraft {
            customer_id: new.customer_id,
            product_id: new.product_id,
            quantity: new.quantity,
            sale_date: new.sale_date.unwrap_or_else(|| Utc::now().date_naive()),
            initial_payment_cents: initial.cents(),
            total_amount_cents: total.cents(),
            remaining_balance_cents: snapshot.remaining_balance.cents(),
            status: SaleStatus::Active.reconciled(snapshot.is_settled),
        };

        let sale = self.sales.create_sale(draft).await?;
        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            total = %total,
            remaining = %sale.remaining_balance(),
            "Sale created"
        );
        Ok(sale)
    }

    /// Records an installment and synchronizes its sale.
    ///
    /// With `reject_overpayment` on, an amount above the live outstanding
    /// balance is refused before anything is written.
    pub async fn record_payment(&self, new: NewPayment) -> EngineResult<PaymentOutcome> {
        validation::validate_new_payment(&new).map_err(CoreError::from)?;

        let _guard = self.locks.lock(&new.sale_id).await;

        let (sale, live) = self.derive_sale_balance(&new.sale_id).await?;
        if self.rules.reject_overpayment {
            validation::check_within_balance(&sale.id, live.remaining_balance, new.amount())?;
        }

        let payment = self.payments.create_payment(new).await?;
        info!(
            payment_id = %payment.id,
            sale_id = %payment.sale_id,
            amount = %payment.amount(),
            "Payment recorded"
        );

        let reconciliation = self.sync_after(&payment.sale_id, Mutation::PaymentRecorded).await?;
        Ok(PaymentOutcome {
            payment,
            reconciliation,
            moved_from: None,
        })
    }

    /// Edits a payment. When the edit moves it to another sale, both sales
    /// are synchronized, and a failed sync names every sale left stale.
    pub async fn edit_payment(
        &self,
        payment_id: &str,
        changes: PaymentChanges,
    ) -> EngineResult<PaymentOutcome> {
        validation::validate_payment_changes(&changes).map_err(CoreError::from)?;

        let (mut payment, _guard) = self
            .lock_payment(payment_id, changes.sale_id.as_deref())
            .await?;
        let source_sale = payment.sale_id.clone();
        let target_sale = changes.sale_id.clone().unwrap_or_else(|| source_sale.clone());

        if changes.touches_balance() {
            let target = self
                .sales
                .get_sale(&target_sale)
                .await?
                .ok_or_else(|| CoreError::SaleNotFound(target_sale.clone()))?;

            if self.rules.reject_overpayment {
                let others = self.payments.get_payments_for_sale(&target_sale).await?;
                let without_this = others.iter().filter(|p| p.id != payment.id);
                let outstanding = derive_balance(SaleTerms::from(&target), without_this).remaining_balance;
                let amount = changes.amount_cents.map(Money::from_cents).unwrap_or(payment.amount());
                validation::check_within_balance(&target.id, outstanding, amount)?;
            }
        }

        self.payments.update_payment(payment_id, changes.clone()).await?;
        changes.apply_to(&mut payment);
        info!(
            payment_id = %payment_id,
            sale_id = %target_sale,
            moved = source_sale != target_sale,
            "Payment edited"
        );

        // Both sides of a move are attempted even if the first fails
        let moved_from = if source_sale != target_sale {
            Some(self.sync_after(&source_sale, Mutation::PaymentEdited).await)
        } else {
            None
        };
        let target = self.sync_after(&target_sale, Mutation::PaymentEdited).await;

        let (moved_from, reconciliation) = match (moved_from.transpose(), target) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(from), Err(to)) => return Err(from.and_stale(to)),
            (Err(err), Ok(_)) | (Ok(_), Err(err)) => return Err(err),
        };

        Ok(PaymentOutcome {
            payment,
            reconciliation,
            moved_from,
        })
    }

    /// Deletes a payment and synchronizes its sale.
    pub async fn delete_payment(&self, payment_id: &str) -> EngineResult<Reconciliation> {
        let (payment, _guard) = self.lock_payment(payment_id, None).await?;

        self.payments.delete_payment(payment_id).await?;
        info!(
            payment_id = %payment_id,
            sale_id = %payment.sale_id,
            amount = %payment.amount(),
            "Payment deleted"
        );

        self.sync_after(&payment.sale_id, Mutation::PaymentDeleted).await
    }

    /// Changes a sale's quantity, total or initial payment and synchronizes.
    ///
    /// Lowering the total below what has been paid is allowed; the balance
    /// clamps to zero.
    pub async fn edit_sale_terms(
        &self,
        sale_id: &str,
        terms: SaleTermsUpdate,
    ) -> EngineResult<Reconciliation> {
        validation::validate_terms_update(&terms).map_err(CoreError::from)?;
        if terms.is_empty() {
            return self.recompute_and_persist(sale_id).await;
        }

        let _guard = self.locks.lock(sale_id).await;

        match self.sales.update_sale(sale_id, SaleUpdate::from(&terms)).await {
            Ok(()) => {}
            Err(StoreError::NotFound { .. }) => {
                return Err(CoreError::SaleNotFound(sale_id.to_string()).into())
            }
            Err(err) => return Err(err.into()),
        }
        info!(sale_id = %sale_id, ?terms, "Sale terms edited");

        self.sync_after(sale_id, Mutation::SaleTermsEdited).await
    }

    /// Recomputes every sale matching `filter`, continuing past failures.
    pub async fn recompute_all(&self, filter: &SaleFilter) -> EngineResult<RecomputeReport> {
        let sales = self.sales.get_sales(filter).await?;
        let mut report = RecomputeReport {
            examined: sales.len(),
            ..RecomputeReport::default()
        };

        for sale in &sales {
            match self.recompute_and_persist(&sale.id).await {
                Ok(reconciliation) if reconciliation.changed => report.corrected += 1,
                Ok(_) => {}
                Err(err) => {
                    warn!(sale_id = %sale.id, error = %err, "Recompute failed");
                    report.failures.push(RecomputeFailure {
                        sale_id: sale.id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            examined = report.examined,
            corrected = report.corrected,
            failed = report.failures.len(),
            "Bulk recompute finished"
        );
        Ok(report)
    }

    /// Locks the sale a payment belongs to (plus `also`, if given), retrying
    /// if the payment moves while waiting for the lock.
    async fn lock_payment(
        &self,
        payment_id: &str,
        also: Option<&str>,
    ) -> EngineResult<(Payment, SaleGuard)> {
        loop {
            let seen = self.fetch_payment(payment_id).await?;
            let guard = match also {
                Some(other) => self.locks.lock_pair(&seen.sale_id, other).await,
                None => self.locks.lock(&seen.sale_id).await,
            };

            let current = self.fetch_payment(payment_id).await?;
            if current.sale_id == seen.sale_id {
                return Ok((current, guard));
            }
            debug!(payment_id = %payment_id, "Payment moved while locking, retrying");
        }
    }

    async fn fetch_payment(&self, payment_id: &str) -> EngineResult<Payment> {
        self.payments
            .get_payment(payment_id)
            .await?
            .ok_or_else(|| CoreError::PaymentNotFound(payment_id.to_string()).into())
    }
}
