//! The engine wired to an in-memory SQLite database.

mod common;

use common::*;
use std::collections::HashSet;
use tread_core::{PaymentChanges, SaleFilter, SaleStatus};
use tread_db::{Database, DbConfig};
use tread_reconcile::{
    sqlite_engine, BatchSettings, EngineError, PaymentsStore, ReconcileConfig, SalesStore,
    SqliteEngine, SqlitePayments,
};

async fn setup(chunk_size: usize) -> (Database, SqliteEngine) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ReconcileConfig {
        batch: BatchSettings { chunk_size },
        ..ReconcileConfig::default()
    };
    let engine = sqlite_engine(&db, &config);
    (db, engine)
}

#[tokio::test]
async fn payment_lifecycle_round_trips_through_sqlite() {
    let (db, engine) = setup(500).await;
    let sale = engine.create_sale(tyre_sale("cust-1")).await.unwrap();
    assert_eq!(sale.sale_number, "S-20260301-0001");
    assert_eq!(sale.remaining_balance(), rs(5090));

    let first = engine.record_payment(payment_on(&sale.id, rs(57), 2)).await.unwrap();
    assert_eq!(first.reconciliation.remaining_balance, rs(5033));

    let last = engine.record_payment(payment_on(&sale.id, rs(5033), 3)).await.unwrap();
    assert_eq!(last.reconciliation.status, SaleStatus::Completed);

    let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(stored.remaining_balance(), rs(0));
    assert_eq!(stored.status, SaleStatus::Completed);

    let reopened = engine.delete_payment(&first.payment.id).await.unwrap();
    assert_eq!(reopened.remaining_balance, rs(57));
    assert_eq!(reopened.status, SaleStatus::Active);

    let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SaleStatus::Active);
    assert_eq!(db.payments().list_for_sale(&sale.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn moved_payment_is_persisted() {
    let (db, engine) = setup(500).await;
    let a = engine.create_sale(tyre_sale("cust-1")).await.unwrap();
    let b = engine.create_sale(tyre_sale("cust-2")).await.unwrap();
    assert_eq!(b.sale_number, "S-20260301-0002");

    let recorded = engine.record_payment(payment_on(&a.id, rs(57), 2)).await.unwrap();
    let moved = engine
        .edit_payment(
            &recorded.payment.id,
            PaymentChanges {
                sale_id: Some(b.id.clone()),
                ..PaymentChanges::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(moved.moved_from.map(|r| r.remaining_balance), Some(rs(5090)));
    assert_eq!(moved.reconciliation.remaining_balance, rs(5033));

    let stored = db.payments().get_by_id(&recorded.payment.id).await.unwrap().unwrap();
    assert_eq!(stored.sale_id, b.id);
}

#[tokio::test]
async fn batch_derivation_spans_chunks() {
    // Two ids per query forces three round trips for five sales
    let (db, engine) = setup(2).await;

    let mut expected = Vec::new();
    for i in 0..5 {
        let sale = engine.create_sale(tyre_sale(&format!("cust-{i}"))).await.unwrap();
        for _ in 0..i {
            seed_payment(&SqlitePayments::new(&db, 2), &sale.id, rs(57)).await;
        }
        expected.push((sale.id, rs(5090 - 57 * i as i64)));
    }

    let sales = engine.sales_store().get_sales(&SaleFilter::all()).await.unwrap();
    let derived = engine.derive_balances(sales).await;

    assert_eq!(derived.len(), 5);
    for (sale, (id, balance)) in derived.iter().zip(&expected) {
        assert_eq!(&sale.id, id);
        assert_eq!(sale.remaining_balance(), *balance);
    }

    let ids: Vec<String> = expected.iter().map(|(id, _)| id.clone()).collect();
    let all = engine.payments_store().get_payments_for_sales(&ids).await.unwrap();
    assert_eq!(all.len(), 10);
}

#[tokio::test]
async fn recompute_all_repairs_sqlite_drift() {
    let (db, engine) = setup(500).await;
    let sale = engine.create_sale(tyre_sale("cust-1")).await.unwrap();

    // Ledger written behind the engine's back, as a second process would
    db.payments()
        .insert(&payment_on(&sale.id, rs(5090), 2))
        .await
        .unwrap();

    let report = engine.recompute_all(&SaleFilter::all()).await.unwrap();
    assert_eq!(report.corrected, 1);
    assert!(report.is_clean());

    let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(stored.remaining_balance(), rs(0));
    assert_eq!(stored.status, SaleStatus::Completed);
}

#[tokio::test]
async fn closed_database_surfaces_store_errors() {
    let (db, engine) = setup(500).await;
    let sale = engine.create_sale(tyre_sale("cust-1")).await.unwrap();
    let sales = vec![sale.clone()];

    db.close().await;

    let err = engine.derive_sale_balance(&sale.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));

    // Display path keeps the cached figure
    let fallback = engine.derive_balances(sales.clone()).await;
    assert_eq!(fallback, sales);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_on_a_file_database_get_distinct_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(DbConfig::new(dir.path().join("tread.db")).max_connections(8))
        .await
        .unwrap();
    let engine = sqlite_engine(&db, &ReconcileConfig::default());

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.create_sale(tyre_sale(&format!("cust-{i}"))).await })
        })
        .collect();

    let mut numbers = HashSet::new();
    for task in tasks {
        let sale = task.await.unwrap().unwrap();
        numbers.insert(sale.sale_number);
    }

    assert_eq!(numbers.len(), 20);
    assert!(numbers.contains("S-20260301-0001"));
    assert!(numbers.contains("S-20260301-0020"));
    assert_eq!(db.sales().count().await.unwrap(), 20);

    db.close().await;
}
