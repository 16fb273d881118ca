//! One published snapshot of the global rule set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::executor::{Executor, Rule};
use crate::store::GlobalRuleRow;

use super::fingerprint::Fingerprint;

/// A runtime rule loaded from one store row.
#[derive(Debug)]
pub struct LoadedRule {
    row_id: u64,
    periodic: bool,
    rule: Arc<Mutex<Rule>>,
}

impl LoadedRule {
    pub(crate) fn new(row_id: u64, rule: Rule) -> Self {
        Self {
            row_id,
            periodic: rule.is_periodic(),
            rule: Arc::new(Mutex::new(rule)),
        }
    }

    pub fn row_id(&self) -> u64 {
        self.row_id
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// The rule, locked by whichever task is currently driving it.
    pub fn rule(&self) -> &Arc<Mutex<Rule>> {
        &self.rule
    }
}

/// Rules parsed from one row set, plus the scope their work runs under.
///
/// Superseding a generation cancels its scope; periodic loops started under
/// it notice at their next cancellation check.
#[derive(Debug)]
pub struct Generation {
    id: u64,
    rows: Vec<GlobalRuleRow>,
    fingerprint: Fingerprint,
    rules: Vec<LoadedRule>,
    loaded_at: DateTime<Utc>,
    scope: CancellationToken,
    launched: AtomicBool,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl Generation {
    pub(crate) fn new(
        id: u64,
        rows: Vec<GlobalRuleRow>,
        fingerprint: Fingerprint,
        rules: Vec<LoadedRule>,
        loaded_at: DateTime<Utc>,
        scope: CancellationToken,
    ) -> Self {
        Self {
            id,
            rows,
            fingerprint,
            rules,
            loaded_at,
            scope,
            launched: AtomicBool::new(false),
            tasks: StdMutex::new(Vec::new()),
        }
    }

    /// Monotonic generation number, starting at 1.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn rows(&self) -> &[GlobalRuleRow] {
        &self.rows
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn rules(&self) -> &[LoadedRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn scope(&self) -> &CancellationToken {
        &self.scope
    }

    pub fn is_cancelled(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Whether `rows` is exactly the row set this generation was built from.
    pub(crate) fn matches(&self, fingerprint: &Fingerprint, rows: &[GlobalRuleRow]) -> bool {
        &self.fingerprint == fingerprint && self.rows == rows
    }

    pub(crate) fn cancel(&self) {
        if !self.scope.is_cancelled() {
            info!(generation = self.id, "canceling superseded global rules");
            self.scope.cancel();
        }
    }

    /// Start one task per periodic rule. Only the first call has any effect.
    pub(crate) fn launch_periodic(&self, executor: &Arc<Executor>) {
        if self.launched.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut handles = Vec::new();
        for loaded in self.rules.iter().filter(|r| r.periodic) {
            let executor = Arc::clone(executor);
            let rule = Arc::clone(&loaded.rule);
            let scope = self.scope.clone();
            let row_id = loaded.row_id;
            let generation = self.id;

            handles.push(tokio::spawn(async move {
                let mut rule = rule.lock().await;
                match executor.execute(&scope, &mut rule, false).await {
                    Err(e) if !e.is_canceled() => {
                        warn!(generation, rule_id = row_id, error = %e, "periodic rule exited");
                    }
                    _ => debug!(generation, rule_id = row_id, "periodic rule finished"),
                }
            }));
        }

        if !handles.is_empty() {
            info!(generation = self.id, count = handles.len(), "launched periodic global rules");
        }
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.extend(handles);
        }
    }

    /// Number of periodic tasks started for this generation.
    pub fn periodic_tasks(&self) -> usize {
        self.tasks.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Wait for every periodic task of this generation to finish.
    pub(crate) async fn join(&self) {
        let handles: Vec<JoinHandle<()>> = match self.tasks.lock() {
            Ok(mut tasks) => tasks.drain(..).collect(),
            Err(_) => return,
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(generation = self.id, error = %e, "periodic rule task panicked");
            }
        }
    }
}
