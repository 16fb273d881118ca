use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub rules: RulesConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `LIGHTS_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("LIGHTS_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            rules: RulesConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  rules:       root={}, store={}",
            self.rules
                .root_rule
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(builtin)".to_string()),
            self.rules.store_path.display(),
        );
        tracing::info!(
            "  refresh:     update_interval={}, shutdown_timeout={}s",
            self.rules.update_interval,
            self.rules.shutdown_timeout_secs,
        );
    }

    /// Return a JSON view of the effective configuration.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "rules": {
                "root_rule": self.rules.root_rule,
                "store_path": self.rules.store_path,
                "update_interval": self.rules.update_interval,
                "shutdown_timeout_secs": self.rules.shutdown_timeout_secs,
            },
        })
    }
}

// ── Rules ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Root rule descriptor file (JSON or YAML). `None` runs the builtin
    /// periodic `global_rules` root.
    pub root_rule: Option<PathBuf>,
    /// YAML file holding the global rule rows.
    pub store_path: PathBuf,
    /// Staleness window for the global rule cache, as a duration string.
    pub update_interval: String,
    /// How long to wait for the root rule to stop after shutdown is requested.
    pub shutdown_timeout_secs: u64,
}

impl RulesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            root_rule: profiled_env_opt(p, "RULES_ROOT").map(PathBuf::from),
            store_path: PathBuf::from(profiled_env_or(p, "RULES_STORE", "data/global_rules.yml")),
            update_interval: profiled_env_or(p, "RULES_UPDATE_INTERVAL", "5s"),
            shutdown_timeout_secs: profiled_env_u64(p, "RULES_SHUTDOWN_TIMEOUT", 10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_unknown_profile() {
        let config = Config::for_profile("lights_test_no_such_profile");
        assert_eq!(config.profile, "LIGHTS_TEST_NO_SUCH_PROFILE");
        assert_eq!(config.profile_label(), "LIGHTS_TEST_NO_SUCH_PROFILE");
        assert!(!config.rules.store_path.as_os_str().is_empty());
    }

    #[test]
    fn profiled_key_wins_over_plain_key() {
        env::set_var("LIGHTSCFGTEST_RULES_SHUTDOWN_TIMEOUT", "42");
        let config = Config::for_profile("lightscfgtest");
        assert_eq!(config.rules.shutdown_timeout_secs, 42);
        env::remove_var("LIGHTSCFGTEST_RULES_SHUTDOWN_TIMEOUT");
    }

    #[test]
    fn summary_reports_default_label() {
        let mut config = Config::for_profile("");
        config.profile.clear();
        let summary = config.summary();
        assert_eq!(summary["profile"], "default");
    }
}
