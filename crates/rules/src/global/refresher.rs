//! [`RuleRefresher`]: cached, hot-swappable view of the global rule table.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::clock::{self, Clock};
use crate::error::Result;
use crate::executor::Executor;
use crate::store::{GlobalRuleRow, GlobalRuleStore};

use super::fingerprint::fingerprint;
use super::generation::{Generation, LoadedRule};

/// Default staleness window for the cached rule set.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Default)]
struct RefreshState {
    last_update: Option<DateTime<Utc>>,
    current: Option<Arc<Generation>>,
    next_id: u64,
}

/// Polls the rule store, republishes the rule set when it changes, and runs it.
///
/// The internal lock only guards the cache bookkeeping; it is never held
/// across the store fetch or rule parsing. Two concurrent refreshes may both
/// fetch, and the fingerprint re-check under the lock turns the later one
/// into a no-op.
pub struct RuleRefresher {
    executor: Arc<Executor>,
    store: Arc<dyn GlobalRuleStore>,
    clock: Arc<dyn Clock>,
    update_interval: Duration,
    state: Mutex<RefreshState>,
}

impl RuleRefresher {
    /// Create a refresher using the executor's clock and the default interval.
    pub fn new(executor: Arc<Executor>, store: Arc<dyn GlobalRuleStore>) -> Self {
        let clock = executor.clock();
        Self {
            executor,
            store,
            clock,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            state: Mutex::new(RefreshState::default()),
        }
    }

    pub fn with_update_interval(mut self, update_interval: Duration) -> Self {
        self.update_interval = update_interval;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// The currently published generation, if any.
    pub async fn current(&self) -> Option<Arc<Generation>> {
        self.state.lock().await.current.clone()
    }

    /// Return the current generation, reloading it from the store when the
    /// cache is stale and the enabled rows changed.
    ///
    /// A generation whose scope was cancelled from outside (its caller's scope
    /// ended) is never reused; the rows are reloaded under the new caller.
    ///
    /// A failed fetch or an unparseable row leaves the current generation
    /// untouched and returns the error.
    pub async fn refresh(&self, caller_scope: &CancellationToken) -> Result<Arc<Generation>> {
        {
            let state = self.state.lock().await;
            if let (Some(last), Some(current)) = (state.last_update, &state.current) {
                let fresh = clock::elapsed(last, self.clock.now())
                    .map_or(false, |e| e < self.update_interval);
                if fresh && !current.is_cancelled() {
                    return Ok(Arc::clone(current));
                }
            }
        }

        let rows = self.store.all_enabled().await?;
        let fetched_at = self.clock.now();
        let fp = fingerprint(&rows);

        {
            let mut state = self.state.lock().await;
            if let Some(current) = state.current.clone() {
                if current.matches(&fp, &rows) && !current.is_cancelled() {
                    state.last_update = Some(fetched_at);
                    return Ok(current);
                }
            }
        }

        info!(count = rows.len(), "global rules updated, loading");
        let rules = self.load(&rows)?;

        let mut state = self.state.lock().await;
        if let Some(current) = state.current.clone() {
            if current.matches(&fp, &rows) && !current.is_cancelled() {
                // A concurrent refresh already published this row set.
                state.last_update = Some(fetched_at);
                return Ok(current);
            }
            current.cancel();
        }

        state.next_id += 1;
        let generation = Arc::new(Generation::new(
            state.next_id,
            rows,
            fp,
            rules,
            fetched_at,
            caller_scope.child_token(),
        ));
        state.current = Some(Arc::clone(&generation));
        state.last_update = Some(fetched_at);
        info!(generation = generation.id(), count = generation.len(), "published global rules");
        Ok(generation)
    }

    /// Parse every row; the first failure aborts the whole batch.
    fn load(&self, rows: &[GlobalRuleRow]) -> Result<Vec<LoadedRule>> {
        let mut loaded = Vec::with_capacity(rows.len());
        for row in rows {
            debug!(rule_id = row.id, desc = %String::from_utf8_lossy(&row.descriptor), "loading rule");
            match self.executor.parse_json(&row.descriptor) {
                Ok(rule) => loaded.push(LoadedRule::new(row.id, rule)),
                Err(e) => {
                    error!(rule_id = row.id, error = %e, "failed to load rule");
                    return Err(e);
                }
            }
        }
        Ok(loaded)
    }

    /// Refresh, then run every rule of the current generation.
    ///
    /// Without `nested_periodic`, periodic rules get their own task (started
    /// once per generation) and the remaining rules run here, in store order.
    /// With it, every rule gets one attempt in this pass.
    pub async fn execute(&self, caller_scope: &CancellationToken, nested_periodic: bool) -> Result<()> {
        let generation = self.refresh(caller_scope).await?;

        if !nested_periodic {
            generation.launch_periodic(&self.executor);
        }

        for loaded in generation.rules() {
            if loaded.is_periodic() && !nested_periodic {
                continue;
            }
            let Ok(mut rule) = loaded.rule().try_lock() else {
                debug!(rule_id = loaded.row_id(), "rule is busy, skipping this pass");
                continue;
            };
            match self
                .executor
                .execute(generation.scope(), &mut rule, nested_periodic)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_canceled() => {
                    debug!(rule_id = loaded.row_id(), "rule execution canceled");
                }
                Err(e) => {
                    error!(rule_id = loaded.row_id(), error = %e, "failed to execute rule");
                }
            }
        }

        info!(generation = generation.id(), count = generation.len(), "executed global rules");
        Ok(())
    }

    /// Cancel the current generation and wait for its periodic tasks.
    pub async fn shutdown(&self) {
        let current = self.state.lock().await.current.clone();
        if let Some(generation) = current {
            generation.cancel();
            generation.join().await;
        }
    }
}
