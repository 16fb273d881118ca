//! Action kind tag selecting which action implementation a rule runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Action identifier carried by a [`RuleDescriptor`](super::RuleDescriptor).
///
/// Unrecognised names deserialize into [`ActionKind::Other`] so a descriptor
/// can always be decoded; resolving it fails later with
/// [`RuleError::UnknownAction`](crate::RuleError::UnknownAction) unless a
/// factory was registered for that name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    CreateProject,
    DeleteProject,
    GlobalRules,
    Other(String),
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::CreateProject => "create_project",
            ActionKind::DeleteProject => "delete_project",
            ActionKind::GlobalRules => "global_rules",
            ActionKind::Other(name) => name,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(ActionKind::from(s.to_string()))
    }
}

impl From<String> for ActionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "create_project" => ActionKind::CreateProject,
            "delete_project" => ActionKind::DeleteProject,
            "global_rules" => ActionKind::GlobalRules,
            _ => ActionKind::Other(s),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}
