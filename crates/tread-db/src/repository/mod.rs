//! # Repository Module
//!
//! Database repository implementations for sales and payments.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  SqliteSales / SqlitePayments (tread-reconcile store adapters)         │
//! │       │                                                                 │
//! │       │  db.payments().list_for_sales(&ids, 500)                       │
//! │       ▼                                                                 │
//! │  PaymentRepository                                                     │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── list_for_sale(&self, sale_id)                                     │
//! │  ├── list_for_sales(&self, ids, chunk_size)                            │
//! │  ├── insert / update / delete                                          │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories never derive balances; they store whatever they are given.
//!
//! ## Available Repositories
//!
//! - [`SaleRepository`](sale::SaleRepository) - Sale lookup, listing, insert, partial update
//! - [`PaymentRepository`](payment::PaymentRepository) - Payment ledger CRUD

pub mod payment;
pub mod sale;
