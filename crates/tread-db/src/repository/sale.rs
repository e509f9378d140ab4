//! # Sale Repository
//!
//! Database operations for credit sales.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. INSERT                                                             │
//! │     └── insert(draft) → Sale { sale_number: S-YYYYMMDD-NNNN }          │
//! │                                                                         │
//! │  2. PAYMENTS RECORDED (payment repository)                             │
//! │                                                                         │
//! │  3. SNAPSHOT WRITES                                                    │
//! │     └── update(id, SaleUpdate::snapshot(balance, status))              │
//! │                                                                         │
//! │  4. (OPTIONAL) TERMS EDIT                                              │
//! │     └── update(id, quantity / total / initial payment)                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tread_core::{new_id, Sale, SaleDraft, SaleFilter, SaleUpdate};

const SALE_COLUMNS: &str = r#"
    id,
    sale_number,
    customer_id,
    product_id,
    quantity,
    sale_date,
    initial_payment_cents,
    total_amount_cents,
    remaining_balance_cents,
    status,
    created_at,
    updated_at
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Lists sales matching a filter, oldest first.
    ///
    /// Unset filter fields match everything.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let sql = format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR customer_id = ?2)
              AND (?3 = 0 OR remaining_balance_cents > 0)
              AND (?4 IS NULL OR sale_date >= ?4)
              AND (?5 IS NULL OR sale_date <= ?5)
            ORDER BY sale_date, sale_number
            "#
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(filter.status)
            .bind(filter.customer_id.as_deref())
            .bind(filter.outstanding_only)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    /// Inserts a new sale, assigning its id and sale number.
    ///
    /// ## Sale Number
    /// `S-YYYYMMDD-NNNN`, where the date is the sale date and `NNNN` counts
    /// the sales already recorded for that day. Numbering and insert share an
    /// IMMEDIATE transaction, so concurrent writers queue on the write lock
    /// (up to the busy timeout) instead of failing on upgrade.
    pub async fn insert(&self, draft: &SaleDraft) -> DbResult<Sale> {
        let now = Utc::now();
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let prefix = sale_number_prefix(draft.sale_date);
        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE sale_number LIKE ?1 || '%'")
                .bind(&prefix)
                .fetch_one(&mut *tx)
                .await?;

        let sale = Sale {
            id: new_id(),
            sale_number: format!("{}{:04}", prefix, existing + 1),
            customer_id: draft.customer_id.clone(),
            product_id: draft.product_id.clone(),
            quantity: draft.quantity,
            sale_date: draft.sale_date,
            initial_payment_cents: draft.initial_payment_cents,
            total_amount_cents: draft.total_amount_cents,
            remaining_balance_cents: draft.remaining_balance_cents,
            status: draft.status,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %sale.id, sale_number = %sale.sale_number, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number, customer_id, product_id,
                quantity, sale_date,
                initial_payment_cents, total_amount_cents, remaining_balance_cents,
                status, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11, ?12
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.sale_number)
        .bind(&sale.customer_id)
        .bind(&sale.product_id)
        .bind(sale.quantity)
        .bind(sale.sale_date)
        .bind(sale.initial_payment_cents)
        .bind(sale.total_amount_cents)
        .bind(sale.remaining_balance_cents)
        .bind(sale.status)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(sale)
    }

    /// Applies a partial update. Unset fields keep their stored value.
    ///
    /// ## Errors
    /// [`DbError::NotFound`] when no sale has this id.
    pub async fn update(&self, id: &str, update: &SaleUpdate) -> DbResult<()> {
        debug!(
            id = %id,
            remaining_balance_cents = ?update.remaining_balance_cents,
            status = ?update.status,
            "Updating sale"
        );

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                quantity = COALESCE(?2, quantity),
                initial_payment_cents = COALESCE(?3, initial_payment_cents),
                total_amount_cents = COALESCE(?4, total_amount_cents),
                remaining_balance_cents = COALESCE(?5, remaining_balance_cents),
                status = COALESCE(?6, status),
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.quantity)
        .bind(update.initial_payment_cents)
        .bind(update.total_amount_cents)
        .bind(update.remaining_balance_cents)
        .bind(update.status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }

    /// Number of sales stored.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn sale_number_prefix(sale_date: NaiveDate) -> String {
    format!("S-{}-", sale_date.format("%Y%m%d"))
}

// =============================================================================
// Unit Tests
// =============================================================================
