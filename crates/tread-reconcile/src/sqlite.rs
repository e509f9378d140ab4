//! # SQLite Store Adapters
//!
//! Thin adapters from the store traits onto the `tread-db` repositories.

use async_trait::async_trait;
use std::sync::Arc;
use tread_core::{NewPayment, Payment, PaymentChanges, Sale, SaleDraft, SaleFilter, SaleUpdate};
use tread_db::{Database, PaymentRepository, SaleRepository};

use crate::config::ReconcileConfig;
use crate::engine::BalanceEngine;
use crate::error::StoreResult;
use crate::store::{PaymentsStore, SalesStore};

/// Engine wired to a SQLite database.
pub type SqliteEngine = BalanceEngine<SqliteSales, SqlitePayments>;

/// [`SalesStore`] over [`SaleRepository`].
#[derive(Debug, Clone)]
pub struct SqliteSales {
    repo: SaleRepository,
}

impl SqliteSales {
    pub fn new(db: &Database) -> Self {
        SqliteSales { repo: db.sales() }
    }
}

/// [`PaymentsStore`] over [`PaymentRepository`].
#[derive(Debug, Clone)]
pub struct SqlitePayments {
    repo: PaymentRepository,
    chunk_size: usize,
}

impl SqlitePayments {
    /// `chunk_size` caps the number of sale ids bound into one batch query.
    pub fn new(db: &Database, chunk_size: usize) -> Self {
        SqlitePayments {
            repo: db.payments(),
            chunk_size,
        }
    }
}

/// Builds an engine over `db` using the configured rules and batch size.
pub fn sqlite_engine(db: &Database, config: &ReconcileConfig) -> SqliteEngine {
    BalanceEngine::new(
        Arc::new(SqliteSales::new(db)),
        Arc::new(SqlitePayments::new(db, config.batch.chunk_size)),
        config.rules.clone(),
    )
}

#[async_trait]
impl SalesStore for SqliteSales {
    async fn get_sale(&self, id: &str) -> StoreResult<Option<Sale>> {
        Ok(self.repo.get_by_id(id).await?)
    }

    async fn get_sales(&self, filter: &SaleFilter) -> StoreResult<Vec<Sale>> {
        Ok(self.repo.list(filter).await?)
    }

    async fn update_sale(&self, id: &str, update: SaleUpdate) -> StoreResult<()> {
        Ok(self.repo.update(id, &update).await?)
    }

    async fn create_sale(&self, draft: SaleDraft) -> StoreResult<Sale> {
        Ok(self.repo.insert(&draft).await?)
    }
}

#[async_trait]
impl PaymentsStore for SqlitePayments {
    async fn get_payment(&self, id: &str) -> StoreResult<Option<Payment>> {
        Ok(self.repo.get_by_id(id).await?)
    }

    async fn get_payments_for_sale(&self, sale_id: &str) -> StoreResult<Vec<Payment>> {
        Ok(self.repo.list_for_sale(sale_id).await?)
    }

    async fn get_payments_for_sales(&self, sale_ids: &[String]) -> StoreResult<Vec<Payment>> {
        Ok(self.repo.list_for_sales(sale_ids, self.chunk_size).await?)
    }

    async fn create_payment(&self, payment: NewPayment) -> StoreResult<Payment> {
        Ok(self.repo.insert(&payment).await?)
    }

    async fn update_payment(&self, id: &str, changes: PaymentChanges) -> StoreResult<()> {
        Ok(self.repo.update(id, &changes).await?)
    }

    async fn delete_payment(&self, id: &str) -> StoreResult<()> {
        Ok(self.repo.delete(id).await?)
    }
}
