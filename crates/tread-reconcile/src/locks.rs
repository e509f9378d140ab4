//! # Per-Sale Mutation Queue
//!
//! One async mutex per sale id. A mutation and the synchronization that
//! follows it run under the sale's lock, so the last sync to finish has seen
//! every payment committed before it.
//!
//! ```text
//!   record_payment(s1, 57) ──► lock(s1) ──► write ──► sync ──► unlock
//!   record_payment(s1, 57) ──────────────── waits ──────────► lock(s1) ...
//!   record_payment(s2, 57) ──► lock(s2) ──► write ──► sync ──► unlock
//! ```
//!
//! Only mutations inside one process are ordered. Two processes sharing a
//! database need `recompute_and_persist` to repair any interleaving.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Idle entries are pruned once the registry grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

/// Registry of per-sale locks.
#[derive(Debug, Default)]
pub struct SaleLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Held while a sale (or a pair of sales) is being mutated.
#[derive(Debug)]
pub struct SaleGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl SaleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, sale_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;

        if locks.len() > PRUNE_THRESHOLD {
            // Only the registry holds an idle lock
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }

        locks
            .entry(sale_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Waits for exclusive access to one sale.
    pub async fn lock(&self, sale_id: &str) -> SaleGuard {
        let guard = self.entry(sale_id).await.lock_owned().await;
        SaleGuard {
            _guards: vec![guard],
        }
    }

    /// Waits for exclusive access to two sales, always acquiring in id order
    /// so that two opposite moves cannot deadlock.
    pub async fn lock_pair(&self, a: &str, b: &str) -> SaleGuard {
        if a == b {
            return self.lock(a).await;
        }

        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first = self.entry(first).await.lock_owned().await;
        let second = self.entry(second).await.lock_owned().await;
        SaleGuard {
            _guards: vec![first, second],
        }
    }

    /// Number of sales with a registered lock.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
