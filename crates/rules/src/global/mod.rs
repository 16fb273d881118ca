//! Global rule refresh and hot-swap.
//!
//! A [`RuleRefresher`] polls a [`GlobalRuleStore`](crate::store::GlobalRuleStore)
//! at most once per update interval. When the enabled rows change it parses
//! them into a new [`Generation`] with its own cancellation scope and cancels
//! the previous one, which stops every periodic loop started under it.
//!
//! The builtin `global_rules` action wraps a refresher so the whole mechanism
//! can itself be driven by a (usually periodic) root rule.

mod action;
mod fingerprint;
mod generation;
mod refresher;


pub(crate) use self::action::register;
pub use self::action::{GlobalRulesAction, GlobalRulesArgs};
pub use self::fingerprint::{fingerprint, Fingerprint};
pub use self::generation::{Generation, LoadedRule};
pub use self::refresher::{RuleRefresher, DEFAULT_UPDATE_INTERVAL};
