//! Action resolution: the boundary between rules and the work they trigger.
//!
//! Concrete actions (creating or deleting projects, etc.) live outside this
//! crate and plug in by registering an [`ActionFactory`] for their
//! [`ActionKind`]. The only builtin is `global_rules`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::descriptor::ActionKind;
use crate::error::{Result, RuleError};
use crate::executor::Executor;
use crate::global;
use crate::store::GlobalRuleStore;

/// Opaque error returned by an action run.
pub type ActionError = anyhow::Error;

/// Per-run context handed to [`Action::run`].
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Scope bounding this run; cancelled on timeout or when the owner stops.
    pub scope: CancellationToken,
    /// Set when the run happens inside a periodic loop. Rules executed from
    /// such a run must not start their own periodic loops.
    pub nested_periodic: bool,
}

/// An executable unit of work bound to a rule.
#[async_trait]
pub trait Action: Send + Sync {
    /// Run the action once. Implementations should observe `ctx.scope`.
    async fn run(&self, ctx: &RunContext) -> std::result::Result<(), ActionError>;
}

/// Services available to a factory while it builds an action.
pub struct ResolveContext<'a> {
    /// The executor resolving the rule; actions that run other rules keep a handle to it.
    pub executor: &'a Arc<Executor>,
}

/// Builds an action instance from a descriptor's raw `args`.
pub type ActionFactory =
    Arc<dyn Fn(&ResolveContext<'_>, &serde_json::Value) -> Result<Box<dyn Action>> + Send + Sync>;

/// Maps action kinds to the factories that build them.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    factories: HashMap<ActionKind, ActionFactory>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the builtin `global_rules` action reading from `store`.
    pub fn with_builtins(store: Arc<dyn GlobalRuleStore>) -> Self {
        let mut registry = Self::new();
        global::register(&mut registry, store);
        registry
    }

    /// Register (or replace) the factory for `kind`.
    pub fn register<F>(&mut self, kind: ActionKind, factory: F)
    where
        F: Fn(&ResolveContext<'_>, &serde_json::Value) -> Result<Box<dyn Action>> + Send + Sync + 'static,
    {
        self.factories.insert(kind, Arc::new(factory));
    }

    pub fn contains(&self, kind: &ActionKind) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted by name.
    pub fn kinds(&self) -> Vec<&ActionKind> {
        let mut kinds: Vec<_> = self.factories.keys().collect();
        kinds.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        kinds
    }

    /// Build the action for `kind` from `args`.
    pub fn resolve(
        &self,
        kind: &ActionKind,
        args: &serde_json::Value,
        ctx: &ResolveContext<'_>,
    ) -> Result<Box<dyn Action>> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| RuleError::UnknownAction(kind.clone()))?;
        factory(ctx, args)
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Decode action arguments; missing (`null`) args decode to `T::default()`.
pub fn parse_args<T>(kind: &ActionKind, args: &serde_json::Value) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if args.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(args.clone()).map_err(|e| RuleError::InvalidArguments {
        action: kind.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct ProjectArgs {
        project_id: u64,
    }

    struct Noop;

    #[async_trait]
    impl Action for Noop {
        async fn run(&self, _ctx: &RunContext) -> std::result::Result<(), ActionError> {
            Ok(())
        }
    }

    #[test]
    fn parse_args_null_is_default() {
        let args: ProjectArgs = parse_args(&ActionKind::CreateProject, &serde_json::Value::Null).unwrap();
        assert_eq!(args, ProjectArgs::default());
    }

    #[test]
    fn parse_args_wrong_shape_is_invalid_arguments() {
        let err = parse_args::<ProjectArgs>(&ActionKind::CreateProject, &json!({"projectId": "x"}))
            .unwrap_err();
        match err {
            RuleError::InvalidArguments { action, .. } => assert_eq!(action, ActionKind::CreateProject),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn registry_lists_registered_kinds() {
        let mut registry = ActionRegistry::new();
        registry.register(ActionKind::DeleteProject, |_, _| Ok(Box::new(Noop) as Box<dyn Action>));
        registry.register(ActionKind::CreateProject, |_, _| Ok(Box::new(Noop) as Box<dyn Action>));

        assert!(registry.contains(&ActionKind::CreateProject));
        assert!(!registry.contains(&ActionKind::GlobalRules));
        assert_eq!(
            registry.kinds(),
            vec![&ActionKind::CreateProject, &ActionKind::DeleteProject]
        );
    }
}
