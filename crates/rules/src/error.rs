//! Error types for rule loading, execution, and the rule store.

use crate::action::ActionError;
use crate::descriptor::ActionKind;

/// Errors that can occur while loading or executing rules.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Bad `periodic` or duration syntax.
    #[error("malformed expression '{expr}': {reason}")]
    MalformedExpression { expr: String, reason: String },

    /// The serialized descriptor could not be decoded.
    #[error("descriptor parse error: {0}")]
    Descriptor(#[from] serde_json::Error),

    /// No factory is registered for the action kind.
    #[error("unknown action: '{0}'")]
    UnknownAction(ActionKind),

    /// The action's factory rejected the descriptor's `args`.
    #[error("invalid arguments for action '{action}': {reason}")]
    InvalidArguments { action: ActionKind, reason: String },

    /// Fetching rows from the rule store failed.
    #[error("rule store error: {0}")]
    Store(#[from] StoreError),

    /// The execution scope was cancelled.
    #[error("execution canceled")]
    Canceled,

    /// The action itself returned an error.
    #[error("action '{action}' failed: {source}")]
    Action {
        action: ActionKind,
        #[source]
        source: ActionError,
    },

    /// Reading a descriptor file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML descriptor file could not be decoded.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RuleError {
    pub(crate) fn malformed(expr: &str, reason: impl Into<String>) -> Self {
        RuleError::MalformedExpression {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a cooperative cancellation rather than a failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, RuleError::Canceled)
    }
}

/// Errors raised by [`GlobalRuleStore`](crate::store::GlobalRuleStore) backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A stored descriptor could not be re-encoded as JSON.
    #[error("descriptor encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Backend-specific failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
