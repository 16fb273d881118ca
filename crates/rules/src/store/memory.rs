//! In-process rule store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreError;

use super::{GlobalRuleRow, GlobalRuleStore};

/// Rule rows held in memory; replaceable at runtime.
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rows: RwLock<Vec<GlobalRuleRow>>,
    fetches: AtomicUsize,
}

impl MemoryRuleStore {
    pub fn new(rows: Vec<GlobalRuleRow>) -> Self {
        Self {
            rows: RwLock::new(rows),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Replace all rows.
    pub fn set_rows(&self, rows: Vec<GlobalRuleRow>) {
        *self.rows.write().unwrap_or_else(|e| e.into_inner()) = rows;
    }

    /// Append a row.
    pub fn push(&self, row: GlobalRuleRow) {
        self.rows.write().unwrap_or_else(|e| e.into_inner()).push(row);
    }

    /// Flip the `enabled` flag of the row with `id`. Returns whether it existed.
    pub fn set_enabled(&self, id: u64, enabled: bool) -> bool {
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
        match rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Number of [`all_enabled`](GlobalRuleStore::all_enabled) calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl GlobalRuleStore for MemoryRuleStore {
    async fn all_enabled(&self) -> Result<Vec<GlobalRuleRow>, StoreError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let rows = self
            .rows
            .read()
            .map_err(|e| StoreError::Unavailable(format!("rows lock poisoned: {}", e)))?;
        Ok(rows.iter().filter(|r| r.enabled).cloned().collect())
    }
}
