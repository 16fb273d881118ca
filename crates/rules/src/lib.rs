//! Rule execution engine.
//!
//! This crate provides:
//! - Serializable rule descriptors (action, `random(min,max)` schedule, args)
//! - An action registry resolving descriptors to executable actions
//! - The once/periodic executor with debounce and per-run timeouts
//! - A global rule refresher that polls a store and hot-swaps the running set
//! - YAML-file and in-memory rule stores

pub mod action;
pub mod clock;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod global;
pub mod period;
pub mod store;

#[cfg(test)]
mod testutil;

pub use action::{Action, ActionError, ActionRegistry, ResolveContext, RunContext};
pub use clock::{Clock, ManualClock, SystemClock};
pub use descriptor::{ActionKind, RuleDescriptor};
pub use error::{Result, RuleError, StoreError};
pub use executor::{Executor, Rule};
pub use global::{Generation, GlobalRulesArgs, RuleRefresher};
pub use period::Period;
pub use store::{FileRuleStore, GlobalRuleRow, GlobalRuleStore, MemoryRuleStore};
