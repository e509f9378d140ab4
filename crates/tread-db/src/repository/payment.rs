//! # Payment Repository
//!
//! The installment ledger. Rows are never interpreted here; balances are
//! derived from them by the engine.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tread_core::{new_id, NewPayment, Payment, PaymentChanges};

const PAYMENT_COLUMNS: &str =
    "id, sale_id, amount_cents, payment_date, payment_method, notes, created_at";

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Gets a payment by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1");

        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    /// All payments recorded against one sale, oldest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE sale_id = ?1 ORDER BY payment_date, created_at"
        );

        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }

    /// All payments for a set of sales.
    ///
    /// ## Chunking
    /// ```text
    /// ids: [s1 .. s1200], chunk_size: 500
    ///
    ///   SELECT ... WHERE sale_id IN (s1 .. s500)
    ///   SELECT ... WHERE sale_id IN (s501 .. s1000)
    ///   SELECT ... WHERE sale_id IN (s1001 .. s1200)
    /// ```
    /// Keeps every statement under SQLite's bound-parameter limit. If any
    /// chunk fails the whole call fails; partial ledgers are never returned.
    pub async fn list_for_sales(&self, sale_ids: &[String], chunk_size: usize) -> DbResult<Vec<Payment>> {
        let mut payments = Vec::new();

        for chunk in sale_ids.chunks(chunk_size.max(1)) {
            let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "SELECT {PAYMENT_COLUMNS} FROM payments WHERE sale_id IN ("
            ));
            let mut separated = query.separated(", ");
            for id in chunk {
                separated.push_bind(id);
            }
            separated.push_unseparated(") ORDER BY sale_id, payment_date, created_at");

            let rows = query
                .build_query_as::<Payment>()
                .fetch_all(&self.pool)
                .await?;
            payments.extend(rows);
        }

        debug!(
            sales = sale_ids.len(),
            payments = payments.len(),
            "Loaded payments for sales"
        );
        Ok(payments)
    }

    /// Records a new payment.
    ///
    /// ## Errors
    /// [`DbError::ForeignKeyViolation`] when the sale does not exist.
    pub async fn insert(&self, new: &NewPayment) -> DbResult<Payment> {
        let payment = Payment {
            id: new_id(),
            sale_id: new.sale_id.clone(),
            amount_cents: new.amount_cents,
            payment_date: new.payment_date,
            payment_method: new.payment_method,
            notes: new.notes.clone(),
            created_at: Utc::now(),
        };

        debug!(sale_id = %payment.sale_id, amount = %payment.amount_cents, "Recording payment");

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, sale_id, amount_cents,
                payment_date, payment_method, notes, created_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6, ?7
            )
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.amount_cents)
        .bind(payment.payment_date)
        .bind(payment.payment_method)
        .bind(payment.notes.as_deref())
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Applies a partial edit. Unset fields keep their stored value.
    pub async fn update(&self, id: &str, changes: &PaymentChanges) -> DbResult<()> {
        debug!(id = %id, moves_sale = changes.sale_id.is_some(), "Updating payment");

        let result = sqlx::query(
            r#"
            UPDATE payments SET
                sale_id = COALESCE(?2, sale_id),
                amount_cents = COALESCE(?3, amount_cents),
                payment_date = COALESCE(?4, payment_date),
                payment_method = COALESCE(?5, payment_method),
                notes = COALESCE(?6, notes)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(changes.sale_id.as_deref())
        .bind(changes.amount_cents)
        .bind(changes.payment_date)
        .bind(changes.payment_method)
        .bind(changes.notes.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payment", id));
        }

        Ok(())
    }

    /// Removes a payment from the ledger.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting payment");

        let result = sqlx::query("DELETE FROM payments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payment", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
