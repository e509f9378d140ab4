//! # In-Memory Store
//!
//! Implements both store traits over two `RwLock`ed vectors. Used by the
//! tests and anywhere a throwaway ledger is enough.
//!
//! Behaves like the SQLite store where it matters to the engine: payments
//! must reference an existing sale, updates and deletes of missing rows are
//! `NotFound`, and listings come back ordered by sale date and number.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use tread_core::{
    new_id, NewPayment, Payment, PaymentChanges, Sale, SaleDraft, SaleFilter, SaleUpdate,
};

use crate::error::{StoreError, StoreResult};
use crate::store::{PaymentsStore, SalesStore};

/// Sales and payments held in process memory.
///
/// Lock order is always `sales` before `payments`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sales: RwLock<Vec<Sale>>,
    payments: RwLock<Vec<Payment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of payments in the ledger.
    pub async fn payment_count(&self) -> usize {
        self.payments.read().await.len()
    }
}

fn missing_sale(sale_id: &str) -> StoreError {
    StoreError::Backend(format!(
        "FOREIGN KEY constraint failed: sale {sale_id} does not exist"
    ))
}

// =============================================================================
// SalesStore
// =============================================================================

#[async_trait]
impl SalesStore for MemoryStore {
    async fn get_sale(&self, id: &str) -> StoreResult<Option<Sale>> {
        let sales = self.sales.read().await;
        Ok(sales.iter().find(|s| s.id == id).cloned())
    }

    async fn get_sales(&self, filter: &SaleFilter) -> StoreResult<Vec<Sale>> {
        let sales = self.sales.read().await;
        let mut matching: Vec<Sale> = sales.iter().filter(|s| filter.matches(s)).cloned().collect();
        matching.sort_by(|a, b| {
            (a.sale_date, &a.sale_number).cmp(&(b.sale_date, &b.sale_number))
        });
        Ok(matching)
    }

    async fn update_sale(&self, id: &str, update: SaleUpdate) -> StoreResult<()> {
        let mut sales = self.sales.write().await;
        let sale = sales
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::not_found("Sale", id))?;

        update.apply_to(sale);
        sale.updated_at = Utc::now();
        Ok(())
    }

    async fn create_sale(&self, draft: SaleDraft) -> StoreResult<Sale> {
        let mut sales = self.sales.write().await;

        let prefix = format!("S-{}-", draft.sale_date.format("%Y%m%d"));
        let same_day = sales
            .iter()
            .filter(|s| s.sale_number.starts_with(&prefix))
            .count();

        let now = Utc::now();
        let sale = Sale {
            id: new_id(),
            sale_number: format!("{}{:04}", prefix, same_day + 1),
            customer_id: draft.customer_id,
            product_id: draft.product_id,
            quantity: draft.quantity,
            sale_date: draft.sale_date,
            initial_payment_cents: draft.initial_payment_cents,
            total_amount_cents: draft.total_amount_cents,
            remaining_balance_cents: draft.remaining_balance_cents,
            status: draft.status,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %sale.id, sale_number = %sale.sale_number, "Stored sale in memory");
        sales.push(sale.clone());
        Ok(sale)
    }
}

// =============================================================================
// PaymentsStore
// =============================================================================

#[async_trait]
impl PaymentsStore for MemoryStore {
    async fn get_payment(&self, id: &str) -> StoreResult<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.iter().find(|p| p.id == id).cloned())
    }

    async fn get_payments_for_sale(&self, sale_id: &str) -> StoreResult<Vec<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.iter().filter(|p| p.sale_id == sale_id).cloned().collect())
    }

    async fn get_payments_for_sales(&self, sale_ids: &[String]) -> StoreResult<Vec<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments
            .iter()
            .filter(|p| sale_ids.contains(&p.sale_id))
            .cloned()
            .collect())
    }

    async fn create_payment(&self, new: NewPayment) -> StoreResult<Payment> {
        let sales = self.sales.read().await;
        if !sales.iter().any(|s| s.id == new.sale_id) {
            return Err(missing_sale(&new.sale_id));
        }

        let payment = Payment {
            id: new_id(),
            sale_id: new.sale_id,
            amount_cents: new.amount_cents,
            payment_date: new.payment_date,
            payment_method: new.payment_method,
            notes: new.notes,
            created_at: Utc::now(),
        };

        self.payments.write().await.push(payment.clone());
        Ok(payment)
    }

    async fn update_payment(&self, id: &str, changes: PaymentChanges) -> StoreResult<()> {
        let sales = self.sales.read().await;
        if let Some(ref sale_id) = changes.sale_id {
            if !sales.iter().any(|s| &s.id == sale_id) {
                return Err(missing_sale(sale_id));
            }
        }

        let mut payments = self.payments.write().await;
        let payment = payments
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("Payment", id))?;

        changes.apply_to(payment);
        Ok(())
    }

    async fn delete_payment(&self, id: &str) -> StoreResult<()> {
        let mut payments = self.payments.write().await;
        let before = payments.len();
        payments.retain(|p| p.id != id);

        if payments.len() == before {
            return Err(StoreError::not_found("Payment", id));
        }
        Ok(())
    }
}
