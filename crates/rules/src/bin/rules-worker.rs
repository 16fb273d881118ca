//! rules-worker: runs a root rule until interrupted.
//!
//! The root rule is read from `RULES_ROOT` (JSON or YAML). Without one, the
//! worker runs a periodic `global_rules` root over the rows in `RULES_STORE`,
//! so editing that file hot-swaps the running rule set.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use lights_core::{load_dotenv, Config};
use lights_rules::descriptor::parse_duration;
use lights_rules::{ActionKind, ActionRegistry, Executor, FileRuleStore, RuleDescriptor};

// ── CLI ─────────────────────────────────────────────────────────────

/// Rule execution worker.
#[derive(Parser, Debug)]
#[command(name = "rules-worker", version, about)]
struct Cli {
    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first.
    #[arg(long, env = "LIGHTS_PROFILE")]
    profile: Option<String>,

    /// Root rule descriptor file (JSON or YAML).
    #[arg(long)]
    root: Option<PathBuf>,

    /// YAML file holding the global rule rows.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Staleness window of the global rule cache, e.g. `5s`.
    #[arg(long)]
    update_interval: Option<String>,

    /// Shutdown timeout in seconds.
    #[arg(long)]
    shutdown_timeout: Option<u64>,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = match self.profile.as_deref() {
            Some(profile) => Config::for_profile(profile),
            None => Config::from_env(),
        };
        if let Some(root) = self.root {
            config.rules.root_rule = Some(root);
        }
        if let Some(store) = self.store {
            config.rules.store_path = store;
        }
        if let Some(interval) = self.update_interval {
            config.rules.update_interval = interval;
        }
        if let Some(secs) = self.shutdown_timeout {
            config.rules.shutdown_timeout_secs = secs;
        }
        config
    }
}

/// The root used when no root rule file is configured.
fn default_root(update_interval: &str) -> RuleDescriptor {
    RuleDescriptor::new(ActionKind::GlobalRules)
        .with_periodic("random(1,2)")
        .with_args(json!({ "updateInterval": update_interval }))
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let config = Cli::parse().into_config();
    config.log_summary();

    // Fail fast on a bad interval instead of at the first refresh.
    parse_duration(&config.rules.update_interval)?;

    let store = Arc::new(FileRuleStore::new(config.rules.store_path.clone()));
    let executor = Executor::new(ActionRegistry::with_builtins(store));

    let desc = match &config.rules.root_rule {
        Some(path) => {
            info!(path = %path.display(), "loading root rule");
            RuleDescriptor::from_file(path)?
        }
        None => default_root(&config.rules.update_interval),
    };
    info!(action = %desc.action, periodic = %desc.periodic, "rules-worker starting");
    let mut root = executor.create_from_desc(desc)?;

    let scope = CancellationToken::new();
    let root_scope = scope.clone();
    let root_executor = Arc::clone(&executor);
    let mut handle = tokio::spawn(async move {
        root_executor.execute(&root_scope, &mut root, false).await
    });

    tokio::select! {
        result = &mut handle => {
            match result {
                Ok(Ok(())) => info!("root rule finished"),
                Ok(Err(e)) => error!(error = %e, "root rule failed"),
                Err(e) => error!(error = %e, "root rule task panicked"),
            }
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown requested");
        }
    }

    scope.cancel();
    let timeout = Duration::from_secs(config.rules.shutdown_timeout_secs);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(Err(e))) if !e.is_canceled() => error!(error = %e, "root rule failed"),
        Ok(Err(e)) => error!(error = %e, "root rule task panicked"),
        Ok(_) => info!("rules-worker exited cleanly"),
        Err(_) => warn!(?timeout, "root rule did not stop in time, exiting"),
    }
    Ok(())
}
