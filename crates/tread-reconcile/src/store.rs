//! # Store Interfaces
//!
//! The engine only ever talks to persistence through these two traits, so it
//! can run against SQLite, a hosted database, or [`MemoryStore`] in tests.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   BalanceEngine<S: SalesStore, P: PaymentsStore>                        │
//! │        │                               │                                │
//! │        ▼                               ▼                                │
//! │   SalesStore                      PaymentsStore                         │
//! │   ├── MemoryStore                 ├── MemoryStore                       │
//! │   └── SqliteSales                 └── SqlitePayments                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations must return freshly committed data: a write that has
//! returned `Ok` is visible to every subsequent read.
//!
//! [`MemoryStore`]: crate::memory::MemoryStore

use async_trait::async_trait;
use tread_core::{NewPayment, Payment, PaymentChanges, Sale, SaleDraft, SaleFilter, SaleUpdate};

use crate::error::StoreResult;

/// Persistence of sales.
#[async_trait]
pub trait SalesStore: Send + Sync {
    async fn get_sale(&self, id: &str) -> StoreResult<Option<Sale>>;

    async fn get_sales(&self, filter: &SaleFilter) -> StoreResult<Vec<Sale>>;

    /// Partial update; `NotFound` when the sale does not exist.
    async fn update_sale(&self, id: &str, update: SaleUpdate) -> StoreResult<()>;

    /// Inserts a sale, assigning id, sale number and timestamps.
    async fn create_sale(&self, draft: SaleDraft) -> StoreResult<Sale>;
}

/// Persistence of the payment ledger.
#[async_trait]
pub trait PaymentsStore: Send + Sync {
    async fn get_payment(&self, id: &str) -> StoreResult<Option<Payment>>;

    async fn get_payments_for_sale(&self, sale_id: &str) -> StoreResult<Vec<Payment>>;

    /// Every payment whose sale is in `sale_ids`, as one logical fetch.
    async fn get_payments_for_sales(&self, sale_ids: &[String]) -> StoreResult<Vec<Payment>>;

    async fn create_payment(&self, payment: NewPayment) -> StoreResult<Payment>;

    /// Partial update; `NotFound` when the payment does not exist.
    async fn update_payment(&self, id: &str, changes: PaymentChanges) -> StoreResult<()>;

    /// `NotFound` when the payment does not exist.
    async fn delete_payment(&self, id: &str) -> StoreResult<()>;
}
