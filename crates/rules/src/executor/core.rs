//! [`Executor`]: builds runtime rules and drives their execution.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::action::{ActionRegistry, ResolveContext, RunContext};
use crate::clock::{self, Clock, SystemClock};
use crate::descriptor::RuleDescriptor;
use crate::error::{Result, RuleError};
use crate::period::Period;

use super::rule::Rule;

/// Turns descriptors into runtime [`Rule`]s and executes them.
///
/// Always handled through an `Arc` so actions that run other rules (such as
/// `global_rules`) can keep a handle to the executor that built them.
pub struct Executor {
    registry: ActionRegistry,
    clock: Arc<dyn Clock>,
}

impl Executor {
    /// Create an executor using the system clock.
    pub fn new(registry: ActionRegistry) -> Arc<Self> {
        Self::with_clock(registry, Arc::new(SystemClock))
    }

    /// Create an executor with an injected clock.
    pub fn with_clock(registry: ActionRegistry, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self { registry, clock })
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Decode a JSON descriptor and build the rule it describes.
    pub fn parse_json(self: &Arc<Self>, data: &[u8]) -> Result<Rule> {
        let desc = RuleDescriptor::from_json(data)?;
        self.create_from_desc(desc)
    }

    /// Resolve the descriptor's action and parse its schedule.
    pub fn create_from_desc(self: &Arc<Self>, desc: RuleDescriptor) -> Result<Rule> {
        let ctx = ResolveContext { executor: self };
        let action = self.registry.resolve(&desc.action, &desc.args, &ctx)?;
        Rule::new(desc, action)
    }

    /// Execute `rule` under `scope`.
    ///
    /// A rule with a period runs in a loop until `scope` is cancelled, unless
    /// `nested_periodic` is set, in which case it gets exactly one attempt.
    /// Callers inside a periodic loop must pass `nested_periodic = true`.
    pub async fn execute(
        &self,
        scope: &CancellationToken,
        rule: &mut Rule,
        nested_periodic: bool,
    ) -> Result<()> {
        if scope.is_cancelled() {
            return Err(RuleError::Canceled);
        }

        match (rule.period, nested_periodic) {
            (Some(period), false) => self.execute_periodic(scope, rule, period).await,
            _ => self.execute_once(scope, rule, nested_periodic).await,
        }
    }

    /// One debounced attempt.
    async fn execute_once(
        &self,
        scope: &CancellationToken,
        rule: &mut Rule,
        nested_periodic: bool,
    ) -> Result<()> {
        let now = self.clock.now();
        if let (Some(last), Some(min_interval)) = (rule.last_run, rule.desc.min_interval) {
            let recent = clock::elapsed(last, now).map_or(true, |e| e < min_interval);
            if recent {
                debug!(action = %rule.desc.action, "skipping rule, ran less than min_interval ago");
                return Ok(());
            }
        }

        // Stamp before running so a slow action is debounced against concurrent ticks.
        rule.last_run = Some(now);

        let run_scope = scope.child_token();
        if let Some(timeout) = rule.desc.timeout {
            arm_timeout(&run_scope, timeout);
        }
        let ctx = RunContext {
            scope: run_scope,
            nested_periodic,
        };

        debug!(action = %rule.desc.action, "running rule");
        let result = rule.action.run(&ctx).await;
        rule.last_run = Some(self.clock.now());

        result.map_err(|source| match source.downcast_ref::<RuleError>() {
            Some(RuleError::Canceled) => RuleError::Canceled,
            _ => RuleError::Action {
                action: rule.desc.action.clone(),
                source,
            },
        })
    }

    /// Run attempts forever on `period`, until `scope` is cancelled.
    async fn execute_periodic(
        &self,
        scope: &CancellationToken,
        rule: &mut Rule,
        period: Period,
    ) -> Result<()> {
        info!(action = %rule.desc.action, period = %period, "periodic rule started");

        loop {
            if scope.is_cancelled() {
                info!(action = %rule.desc.action, "periodic rule stopped");
                return Err(RuleError::Canceled);
            }

            match self.execute_once(scope, rule, true).await {
                Ok(()) => {}
                Err(e) if e.is_canceled() => {
                    debug!(action = %rule.desc.action, "rule execution canceled");
                }
                Err(e) => {
                    error!(action = %rule.desc.action, error = %e, "rule execution failed");
                }
            }

            // Cancellation is picked up at the top of the loop.
            let _ = period.wait(scope).await;
        }
    }
}

/// Cancel `scope` after `timeout`. The parent scope is untouched and the
/// running action is not aborted; it only observes cancellation.
fn arm_timeout(scope: &CancellationToken, timeout: Duration) {
    let scope = scope.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = scope.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                debug!(?timeout, "rule run timed out");
                scope.cancel();
            }
        }
    });
}
