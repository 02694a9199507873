//! Deployment flags read from the process environment.

/// Set to `true` to refuse activation.
pub const DISABLE_VAR: &str = "CALLS_NODE_DISABLE";

/// Set to any non-empty value to mark this process as the maintenance node.
pub const IS_HANDLER_VAR: &str = "CALLS_NODE_IS_HANDLER";

/// Environment-style switches consulted during activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvFlags {
    /// Activation must fail without constructing anything.
    pub disabled: bool,

    /// This process tracks the cluster handler designation.
    pub is_handler: bool,
}

impl EnvFlags {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            disabled: lookup(DISABLE_VAR).as_deref() == Some("true"),
            is_handler: lookup(IS_HANDLER_VAR).is_some_and(|v| !v.is_empty()),
        }
    }
}
