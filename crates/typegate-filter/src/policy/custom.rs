//! Custom policy chain: deployment-registered hooks that get the first word
//! on every candidate type, ahead of baseline and structural rules.
//!
//! Verdicts from this chain are never cached; hooks may be context-sensitive.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use typegate_core::error::Result;
use typegate_core::types::TypeHandle;

use crate::config::PolicyConfig;

/// Tri-state verdict from a single hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyVerdict {
    Permit,
    Deny,
    Abstain,
}

impl PolicyVerdict {
    /// `Some(true)` = admitted, `Some(false)` = rejected, `None` = no opinion.
    pub fn decision(self) -> Option<bool> {
        match self {
            PolicyVerdict::Permit => Some(true),
            PolicyVerdict::Deny => Some(false),
            PolicyVerdict::Abstain => None,
        }
    }
}

/// Pluggable admission hook. Both methods abstain unless overridden.
pub trait CustomPolicy: Send + Sync {
    fn name(&self) -> &str;

    fn permits_type(&self, ty: &TypeHandle) -> Result<PolicyVerdict> {
        let _ = ty;
        Ok(PolicyVerdict::Abstain)
    }

    fn permits_name(&self, name: &str) -> Result<PolicyVerdict> {
        let _ = name;
        Ok(PolicyVerdict::Abstain)
    }
}

/// Ordered hook registry. First non-abstain verdict wins.
#[derive(Default)]
pub struct PolicyChain {
    hooks: RwLock<Vec<Arc<dyn CustomPolicy>>>,
}

impl PolicyChain {
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
        }
    }

    /// Append a hook; registration order is evaluation order.
    pub fn register(&self, hook: Arc<dyn CustomPolicy>) {
        // A poisoned lock cannot leave the vec half-updated.
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }

    pub fn registered(&self) -> Vec<String> {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|h| h.name().to_string())
            .collect()
    }

    pub fn verdict_for_type(&self, ty: &TypeHandle) -> Option<bool> {
        self.first_verdict(ty.name(), |h| h.permits_type(ty))
    }

    pub fn verdict_for_name(&self, name: &str) -> Option<bool> {
        self.first_verdict(name, |h| h.permits_name(name))
    }

    fn first_verdict<F>(&self, subject: &str, ask: F) -> Option<bool>
    where
        F: Fn(&dyn CustomPolicy) -> Result<PolicyVerdict>,
    {
        // Snapshot so a hook may register further hooks without deadlocking.
        let hooks = self.hooks.read().unwrap_or_else(PoisonError::into_inner).clone();
        for h in &hooks {
            match ask(h.as_ref()) {
                Ok(v) => {
                    if let Some(permit) = v.decision() {
                        tracing::trace!(policy = %h.name(), type_name = %subject, permit, "custom policy verdict");
                        return Some(permit);
                    }
                }
                // A failing hook never becomes an implicit permit.
                Err(e) => {
                    tracing::warn!(policy = %h.name(), type_name = %subject, error = %e, "custom policy failed; treating as abstain");
                }
            }
        }
        None
    }
}

/// Config-defined policy over exact names (`!name` denies).
#[derive(Debug, Clone)]
pub struct StaticPolicy {
    name: String,
    permit: HashSet<String>,
    deny: HashSet<String>,
}

impl StaticPolicy {
    pub fn new(name: impl Into<String>, rules: &[String]) -> Self {
        let mut permit = HashSet::new();
        let mut deny = HashSet::new();
        for r in rules {
            let r = r.trim();
            match r.strip_prefix('!') {
                Some(n) if !n.is_empty() => {
                    deny.insert(n.to_string());
                }
                Some(_) => {}
                None if !r.is_empty() => {
                    permit.insert(r.to_string());
                }
                None => {}
            }
        }
        Self {
            name: name.into(),
            permit,
            deny,
        }
    }

    pub fn from_config(cfg: &PolicyConfig) -> Self {
        Self::new(cfg.name.clone(), &cfg.rules)
    }
}

impl CustomPolicy for StaticPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn permits_type(&self, ty: &TypeHandle) -> Result<PolicyVerdict> {
        self.permits_name(ty.name())
    }

    fn permits_name(&self, name: &str) -> Result<PolicyVerdict> {
        if self.deny.contains(name) {
            Ok(PolicyVerdict::Deny)
        } else if self.permit.contains(name) {
            Ok(PolicyVerdict::Permit)
        } else {
            Ok(PolicyVerdict::Abstain)
        }
    }
}
