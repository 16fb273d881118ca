//! Backing stores for globally enabled rules.
//!
//! The refresher only needs [`GlobalRuleStore::all_enabled`]. Rows carry the
//! serialized descriptor as opaque bytes; the store never interprets them.

mod file;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::descriptor::RuleDescriptor;
use crate::error::{Result, StoreError};

pub use self::file::FileRuleStore;
pub use self::memory::MemoryRuleStore;

/// One row of the global rule table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalRuleRow {
    pub id: u64,
    pub enabled: bool,
    /// JSON-encoded [`RuleDescriptor`].
    pub descriptor: Vec<u8>,
}

impl GlobalRuleRow {
    /// Build an enabled row from a descriptor.
    pub fn new(id: u64, desc: &RuleDescriptor) -> Result<Self> {
        Ok(Self {
            id,
            enabled: true,
            descriptor: desc.to_json()?,
        })
    }

    /// Build a row around raw descriptor bytes.
    pub fn raw(id: u64, enabled: bool, descriptor: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            enabled,
            descriptor: descriptor.into(),
        }
    }
}

/// Source of global rule rows.
#[async_trait]
pub trait GlobalRuleStore: Send + Sync {
    /// All enabled rows, in the store's order.
    async fn all_enabled(&self) -> std::result::Result<Vec<GlobalRuleRow>, StoreError>;
}
