//! Shared fixtures for the engine integration tests.
//!
//! ## Fault Injection
//! The wrappers here sit between the engine and a [`MemoryStore`] and fail
//! or pause specific calls, so each failure path can be driven on purpose:
//!
//! - [`FlakySales`] - fail the next N `update_sale` calls
//! - [`FlakyPayments`] - fail batch or single-sale payment reads, count batch fetches
//! - [`GatedSales`] - park the next `update_sale` until the test releases it
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use tread_core::{
    Money, NewPayment, NewSale, Payment, PaymentChanges, Sale, SaleDraft, SaleFilter, SaleStatus,
    SaleUpdate,
};
use tread_reconcile::{
    BalanceEngine, BalanceRules, MemoryStore, PaymentsStore, SalesStore, StoreError, StoreResult,
};

pub type MemoryEngine = BalanceEngine<MemoryStore, MemoryStore>;

pub fn rs(major: i64) -> Money {
    Money::from_major(major)
}

pub fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

/// Engine over a fresh in-memory store with the default rules.
pub fn memory_engine() -> (Arc<MemoryStore>, MemoryEngine) {
    memory_engine_with(BalanceRules::default())
}

pub fn memory_engine_with(rules: BalanceRules) -> (Arc<MemoryStore>, MemoryEngine) {
    let store = Arc::new(MemoryStore::new());
    let engine = BalanceEngine::new(store.clone(), store.clone(), rules);
    (store, engine)
}

pub fn lenient_rules() -> BalanceRules {
    BalanceRules {
        reject_overpayment: false,
        ..BalanceRules::default()
    }
}

/// One Rs. 5000 tyre with the default Rs. 700 service charge and Rs. 610
/// down: total Rs. 5700, Rs. 5090 outstanding.
pub fn tyre_sale(customer_id: &str) -> NewSale {
    NewSale {
        customer_id: customer_id.to_string(),
        product_id: "tyre-185-65-r15".to_string(),
        quantity: 1,
        unit_price_cents: rs(5000).cents(),
        service_charge_cents: None,
        initial_payment_cents: rs(610).cents(),
        sale_date: Some(march(1)),
    }
}

pub fn payment_on(sale_id: &str, amount: Money, day: u32) -> NewPayment {
    NewPayment {
        payment_date: march(day),
        ..NewPayment::cash(sale_id, amount)
    }
}

/// Inserts a sale straight into the store, bypassing engine validation, with
/// whatever cached snapshot the test wants.
pub async fn seed_sale<S: SalesStore>(
    store: &S,
    total: Money,
    initial: Money,
    cached_balance: Money,
    status: SaleStatus,
) -> Sale {
    store
        .create_sale(SaleDraft {
            customer_id: "cust-seeded".to_string(),
            product_id: "tyre-seeded".to_string(),
            quantity: 1,
            sale_date: march(1),
            initial_payment_cents: initial.cents(),
            total_amount_cents: total.cents(),
            remaining_balance_cents: cached_balance.cents(),
            status,
        })
        .await
        .unwrap()
}

/// Writes a payment straight into the ledger without synchronizing.
pub async fn seed_payment<P: PaymentsStore>(store: &P, sale_id: &str, amount: Money) -> Payment {
    store
        .create_payment(NewPayment::cash(sale_id, amount))
        .await
        .unwrap()
}

pub async fn stored_sale<S: SalesStore>(store: &S, sale_id: &str) -> Sale {
    store.get_sale(sale_id).await.unwrap().unwrap()
}

// =============================================================================
// FlakySales
// =============================================================================

/// Fails the next `failures` calls to `update_sale`.
#[derive(Debug)]
pub struct FlakySales {
    inner: Arc<MemoryStore>,
    failures: AtomicUsize,
}

impl FlakySales {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        FlakySales {
            inner,
            failures: AtomicUsize::new(0),
        }
    }

    pub fn fail_next_updates(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl SalesStore for FlakySales {
    async fn get_sale(&self, id: &str) -> StoreResult<Option<Sale>> {
        self.inner.get_sale(id).await
    }

    async fn get_sales(&self, filter: &SaleFilter) -> StoreResult<Vec<Sale>> {
        self.inner.get_sales(filter).await
    }

    async fn update_sale(&self, id: &str, update: SaleUpdate) -> StoreResult<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("sales table locked".to_string()));
        }
        self.inner.update_sale(id, update).await
    }

    async fn create_sale(&self, draft: SaleDraft) -> StoreResult<Sale> {
        self.inner.create_sale(draft).await
    }
}

// =============================================================================
// FlakyPayments
// =============================================================================

/// Payments store that can fail reads on demand and counts batch fetches.
#[derive(Debug)]
pub struct FlakyPayments {
    inner: Arc<MemoryStore>,
    fail_batch: AtomicBool,
    fail_single: AtomicBool,
    fail_writes: AtomicBool,
    batch_calls: AtomicUsize,
}

impl FlakyPayments {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        FlakyPayments {
            inner,
            fail_batch: AtomicBool::new(false),
            fail_single: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_batch_reads(&self, fail: bool) {
        self.fail_batch.store(fail, Ordering::SeqCst);
    }

    pub fn fail_single_reads(&self, fail: bool) {
        self.fail_single.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn write_guard(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("payments table locked".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentsStore for FlakyPayments {
    async fn get_payment(&self, id: &str) -> StoreResult<Option<Payment>> {
        self.inner.get_payment(id).await
    }

    async fn get_payments_for_sale(&self, sale_id: &str) -> StoreResult<Vec<Payment>> {
        if self.fail_single.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.get_payments_for_sale(sale_id).await
    }

    async fn get_payments_for_sales(&self, sale_ids: &[String]) -> StoreResult<Vec<Payment>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.get_payments_for_sales(sale_ids).await
    }

    async fn create_payment(&self, payment: NewPayment) -> StoreResult<Payment> {
        self.write_guard()?;
        self.inner.create_payment(payment).await
    }

    async fn update_payment(&self, id: &str, changes: PaymentChanges) -> StoreResult<()> {
        self.write_guard()?;
        self.inner.update_payment(id, changes).await
    }

    async fn delete_payment(&self, id: &str) -> StoreResult<()> {
        self.write_guard()?;
        self.inner.delete_payment(id).await
    }
}

// =============================================================================
// GatedSales
// =============================================================================

struct Gate {
    reached: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Parks the next `update_sale` call until the test releases it.
pub struct GatedSales {
    inner: Arc<MemoryStore>,
    gate: Mutex<Option<Gate>>,
}

/// Test-side handles of an armed gate.
pub struct GateHandles {
    /// Resolves once an update is parked at the gate.
    pub reached: oneshot::Receiver<()>,
    /// Send to let the parked update through.
    pub release: oneshot::Sender<()>,
}

impl GatedSales {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        GatedSales {
            inner,
            gate: Mutex::new(None),
        }
    }

    /// Arms the gate for the next `update_sale` only.
    pub fn arm(&self) -> GateHandles {
        let (reached_tx, reached_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(Gate {
            reached: reached_tx,
            release: release_rx,
        });
        GateHandles {
            reached: reached_rx,
            release: release_tx,
        }
    }
}

#[async_trait]
impl SalesStore for GatedSales {
    async fn get_sale(&self, id: &str) -> StoreResult<Option<Sale>> {
        self.inner.get_sale(id).await
    }

    async fn get_sales(&self, filter: &SaleFilter) -> StoreResult<Vec<Sale>> {
        self.inner.get_sales(filter).await
    }

    async fn update_sale(&self, id: &str, update: SaleUpdate) -> StoreResult<()> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.reached.send(());
            let _ = gate.release.await;
        }
        self.inner.update_sale(id, update).await
    }

    async fn create_sale(&self, draft: SaleDraft) -> StoreResult<Sale> {
        self.inner.create_sale(draft).await
    }
}
