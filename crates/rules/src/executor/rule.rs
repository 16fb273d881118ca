//! Runtime rule: a descriptor bound to its resolved action.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::action::Action;
use crate::descriptor::{ActionKind, RuleDescriptor};
use crate::error::Result;
use crate::period::Period;

/// A descriptor bound to a resolved action, plus last-run bookkeeping.
///
/// Owned by whoever drives it; `last_run` is only touched by the execution
/// path, which takes the rule by `&mut`.
pub struct Rule {
    pub(crate) desc: RuleDescriptor,
    pub(crate) action: Box<dyn Action>,
    pub(crate) period: Option<Period>,
    pub(crate) last_run: Option<DateTime<Utc>>,
}

impl Rule {
    pub(crate) fn new(desc: RuleDescriptor, action: Box<dyn Action>) -> Result<Self> {
        let period = if desc.is_periodic() {
            Some(Period::parse(&desc.periodic)?)
        } else {
            None
        };
        Ok(Self {
            desc,
            action,
            period,
            last_run: None,
        })
    }

    pub fn descriptor(&self) -> &RuleDescriptor {
        &self.desc
    }

    pub fn kind(&self) -> &ActionKind {
        &self.desc.action
    }

    pub fn period(&self) -> Option<&Period> {
        self.period.as_ref()
    }

    pub fn is_periodic(&self) -> bool {
        self.period.is_some()
    }

    /// When the action last started or finished, whichever is later.
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("action", &self.desc.action)
            .field("period", &self.period)
            .field("last_run", &self.last_run)
            .finish_non_exhaustive()
    }
}
