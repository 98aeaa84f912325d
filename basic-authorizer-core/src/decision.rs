use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Effect::Allow)
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allow/deny outcome for one caller, scoped to a wildcard resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub identity: String,
    pub effect: Effect,
    pub resource: String,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        self.effect.is_allow()
    }
}

/// Receives one event per decision. Implementations must not block.
pub trait DecisionObserver: Send + Sync {
    fn decided(&self, identity: &str, effect: Effect);
}

/// Default observer: a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DecisionObserver for TracingObserver {
    fn decided(&self, identity: &str, effect: Effect) {
        info!(identity, effect = %effect, "authorization decision");
    }
}

/// Build a decision and report it to `observer`.
pub fn decide(
    observer: &dyn DecisionObserver,
    identity: &str,
    effect: Effect,
    resource: &str,
) -> Decision {
    observer.decided(identity, effect);
    Decision {
        identity: identity.to_string(),
        effect,
        resource: resource.to_string(),
    }
}
