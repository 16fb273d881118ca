//! Serializable rule descriptors.
//!
//! A descriptor names an action, its optional schedule, and the opaque
//! arguments handed to the action's factory. Descriptors are stored as JSON
//! inside global rule rows and in root rule files.

pub(crate) mod duration;
mod kind;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};

use self::duration::opt_duration;

pub use self::duration::{format_duration, parse_duration};
pub use self::kind::ActionKind;

/// Declarative description of a rule. Immutable once parsed.
///
/// Decoding goes through [`RuleDescriptor::from_json`] or
/// [`RuleDescriptor::from_yaml`] so a bad duration string surfaces as
/// [`RuleError::MalformedExpression`] rather than a generic decode error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDescriptor {
    /// Which action implementation to run.
    pub action: ActionKind,
    /// Schedule expression, e.g. `random(5,10)`. Empty means one-shot.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub periodic: String,
    /// Minimum time between two executions of the same runtime rule.
    #[serde(with = "opt_duration", skip_serializing_if = "Option::is_none")]
    pub min_interval: Option<Duration>,
    /// Upper bound on a single action run before its scope is cancelled.
    #[serde(with = "opt_duration", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Action-specific arguments, shape defined by `action`.
    pub args: serde_json::Value,
}

/// Wire shape of a descriptor, durations still unparsed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDescriptor {
    #[serde(alias = "Act", alias = "act")]
    action: ActionKind,
    #[serde(default, alias = "Periodic")]
    periodic: String,
    #[serde(default, alias = "MinInterval")]
    min_interval: Option<String>,
    #[serde(default, alias = "Timeout")]
    timeout: Option<String>,
    #[serde(default, alias = "Args")]
    args: serde_json::Value,
}

impl TryFrom<WireDescriptor> for RuleDescriptor {
    type Error = RuleError;

    fn try_from(wire: WireDescriptor) -> Result<Self> {
        Ok(Self {
            action: wire.action,
            periodic: wire.periodic,
            min_interval: optional_duration(wire.min_interval.as_deref())?,
            timeout: optional_duration(wire.timeout.as_deref())?,
            args: wire.args,
        })
    }
}

fn optional_duration(raw: Option<&str>) -> Result<Option<Duration>> {
    match raw {
        Some(s) => parse_duration(s),
        None => Ok(None),
    }
}

impl RuleDescriptor {
    /// A one-shot descriptor with no arguments.
    pub fn new(action: ActionKind) -> Self {
        Self {
            action,
            periodic: String::new(),
            min_interval: None,
            timeout: None,
            args: serde_json::Value::Null,
        }
    }

    pub fn with_periodic(mut self, periodic: impl Into<String>) -> Self {
        self.periodic = periodic.into();
        self
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = Some(min_interval);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_args(mut self, args: serde_json::Value) -> Self {
        self.args = args;
        self
    }

    /// Decode a descriptor from its JSON wire form.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let wire: WireDescriptor = serde_json::from_slice(data)?;
        wire.try_into()
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let wire: WireDescriptor = serde_yaml::from_str(content)?;
        wire.try_into()
    }

    /// Read a descriptor file. `.json` files are decoded as JSON, anything
    /// else as YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(content.as_bytes()),
            _ => Self::from_yaml(&content),
        }
    }

    /// Encode the descriptor into its JSON wire form.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Whether the descriptor carries a schedule.
    pub fn is_periodic(&self) -> bool {
        !self.periodic.trim().is_empty()
    }
}
