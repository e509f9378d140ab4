//! # tread-reconcile: Remaining-Balance Reconciliation for Tread Installments
//!
//! A sale's `remaining_balance` and `status` are a cache. The payment ledger
//! is the truth. This crate owns the only code paths that write that cache.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Reconciliation Layer                             │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 BalanceEngine (Main Entry Point)                 │  │
//! │  │                                                                  │  │
//! │  │  create_sale        record_payment      edit_payment             │  │
//! │  │  delete_payment     edit_sale_terms     recompute_and_persist    │  │
//! │  │  derive_sale_balance  derive_balances   recompute_all            │  │
//! │  └────────────┬─────────────────────────────────┬───────────────────┘  │
//! │               │                                 │                       │
//! │               ▼                                 ▼                       │
//! │  ┌────────────────────────┐       ┌──────────────────────────────────┐ │
//! │  │       SaleLocks        │       │   SalesStore / PaymentsStore     │ │
//! │  │                        │       │                                  │ │
//! │  │ One async mutex per    │       │  MemoryStore    (tests)          │ │
//! │  │ sale: a mutation and   │       │  SqliteSales    ──► tread-db     │ │
//! │  │ its sync never         │       │  SqlitePayments ──► tread-db     │ │
//! │  │ interleave             │       │                                  │ │
//! │  └────────────────────────┘       └──────────────────────────────────┘ │
//! │                                                                         │
//! │  BALANCE RULE (tread-core):                                            │
//! │  remaining = max(0, total − initial − Σ payments)                      │
//! │  status    = completed when remaining hits 0, defaulted is sticky      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`engine`] - `BalanceEngine` and its result types
//! - [`store`] - Store traits the engine is generic over
//! - [`memory`] - In-memory store
//! - [`sqlite`] - Store adapters over `tread-db`
//! - [`locks`] - Per-sale mutation queue
//! - [`config`] - Rules, database and batch settings (TOML + env)
//! - [`error`] - Store and engine error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tread_reconcile::{sqlite_engine, ReconcileConfig};
//! use tread_db::{Database, DbConfig};
//!
//! let config = ReconcileConfig::load(None)?;
//! let db = Database::new(DbConfig::new(config.database_path())).await?;
//! let engine = sqlite_engine(&db, &config);
//!
//! let outcome = engine.record_payment(NewPayment::cash(&sale_id, Money::from_major(57))).await?;
//! println!("Remaining: {}", outcome.reconciliation.remaining_balance);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod locks;
pub mod memory;
pub mod sqlite;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{BalanceRules, BatchSettings, ConfigError, DatabaseSettings, ReconcileConfig};
pub use engine::{BalanceEngine, PaymentOutcome, RecomputeFailure, RecomputeReport, Reconciliation};
pub use error::{EngineError, EngineResult, Mutation, StoreError, StoreResult};
pub use locks::SaleLocks;
pub use memory::MemoryStore;
pub use sqlite::{sqlite_engine, SqliteEngine, SqlitePayments, SqliteSales};
pub use store::{PaymentsStore, SalesStore};
