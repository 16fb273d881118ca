//! Shared test utilities
//!
//! A probe action that records how it was run. Only compiled in test builds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use serde::Deserialize;

use crate::action::{parse_args, Action, ActionError, ActionRegistry, RunContext};
use crate::descriptor::ActionKind;

/// Shared record of every probe run.
#[derive(Debug, Default)]
pub struct Probe {
    runs: AtomicUsize,
    cancelled: AtomicUsize,
    nested: Mutex<Vec<bool>>,
}

impl Probe {
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Runs that observed their scope being cancelled.
    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// The `nested_periodic` flag of every run, in order.
    pub fn nested_flags(&self) -> Vec<bool> {
        self.nested.lock().unwrap().clone()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeArgs {
    #[serde(default)]
    pub fail: bool,
    #[serde(default)]
    pub sleep_ms: u64,
    #[serde(default)]
    pub wait_for_cancel: bool,
}

struct ProbeAction {
    probe: Arc<Probe>,
    args: ProbeArgs,
}

#[async_trait]
impl Action for ProbeAction {
    async fn run(&self, ctx: &RunContext) -> Result<(), ActionError> {
        self.probe.runs.fetch_add(1, Ordering::SeqCst);
        self.probe.nested.lock().unwrap().push(ctx.nested_periodic);

        if self.args.wait_for_cancel {
            ctx.scope.cancelled().await;
            self.probe.cancelled.fetch_add(1, Ordering::SeqCst);
        } else if self.args.sleep_ms > 0 {
            tokio::select! {
                _ = ctx.scope.cancelled() => {
                    self.probe.cancelled.fetch_add(1, Ordering::SeqCst);
                }
                _ = tokio::time::sleep(Duration::from_millis(self.args.sleep_ms)) => {}
            }
        }

        if self.args.fail {
            bail!("probe failure");
        }
        Ok(())
    }
}

pub fn probe_kind() -> ActionKind {
    ActionKind::Other("probe".to_string())
}

/// Register a probe action under `kind`.
pub fn register_probe_as(registry: &mut ActionRegistry, kind: ActionKind, probe: &Arc<Probe>) {
    let probe = Arc::clone(probe);
    registry.register(kind.clone(), move |_, args| {
        let args: ProbeArgs = parse_args(&kind, args)?;
        Ok(Box::new(ProbeAction {
            probe: Arc::clone(&probe),
            args,
        }) as Box<dyn Action>)
    });
}

/// Register the probe under `probe`, `create_project` and `delete_project`.
pub fn register_probe(registry: &mut ActionRegistry, probe: &Arc<Probe>) {
    for kind in [probe_kind(), ActionKind::CreateProject, ActionKind::DeleteProject] {
        register_probe_as(registry, kind, probe);
    }
}

/// A registry holding only the probe actions.
pub fn probe_registry(probe: &Arc<Probe>) -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    register_probe(&mut registry, probe);
    registry
}

/// Poll `cond` every few milliseconds until it holds or `within` elapses.
pub async fn eventually(within: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
