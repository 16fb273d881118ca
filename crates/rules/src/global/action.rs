//! The builtin `global_rules` action.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::action::{parse_args, Action, ActionError, ActionRegistry, RunContext};
use crate::descriptor::duration::opt_duration;
use crate::descriptor::ActionKind;
use crate::store::GlobalRuleStore;

use super::refresher::{RuleRefresher, DEFAULT_UPDATE_INTERVAL};

/// Arguments of a `global_rules` descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRulesArgs {
    /// Staleness window of the cached rule set; defaults to five seconds.
    #[serde(
        default,
        alias = "UpdateInterval",
        with = "opt_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub update_interval: Option<Duration>,
}

/// Runs the current global rule set on every invocation.
pub struct GlobalRulesAction {
    refresher: RuleRefresher,
}

impl GlobalRulesAction {
    pub fn new(refresher: RuleRefresher) -> Self {
        Self { refresher }
    }

    pub fn refresher(&self) -> &RuleRefresher {
        &self.refresher
    }
}

#[async_trait]
impl Action for GlobalRulesAction {
    async fn run(&self, ctx: &RunContext) -> Result<(), ActionError> {
        self.refresher
            .execute(&ctx.scope, ctx.nested_periodic)
            .await
            .map_err(ActionError::from)
    }
}

/// Register the `global_rules` factory, reading rows from `store`.
pub(crate) fn register(registry: &mut ActionRegistry, store: Arc<dyn GlobalRuleStore>) {
    registry.register(ActionKind::GlobalRules, move |ctx, args| {
        let args: GlobalRulesArgs = parse_args(&ActionKind::GlobalRules, args)?;
        let refresher = RuleRefresher::new(Arc::clone(ctx.executor), Arc::clone(&store))
            .with_update_interval(args.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL));
        Ok(Box::new(GlobalRulesAction::new(refresher)) as Box<dyn Action>)
    });
}
