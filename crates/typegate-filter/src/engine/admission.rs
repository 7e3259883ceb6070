//! Decision engine: one yes/no admission verdict per candidate type.
//!
//! By handle:
//! 1. custom policy chain (never cached)
//! 2. disabled mode permits everything
//! 3. cached verdict, else classify and cache:
//!    mock proxy (test only) > array > throwable > enum > baseline deny >
//!    trusted origin > remote channel > allow-list > deny
//!
//! By name: mock proxy (test only) > custom policy > disabled > baseline.

use std::sync::Arc;

use typegate_core::types::{Provenance, TypeHandle};

use super::cache::TypeVerdictCache;
use super::mode::FilterState;
use crate::obs::FilterMetrics;
use crate::origin::OriginClassifier;
use crate::policy::{AllowList, BaselineDecision, PolicyChain};

/// Why a freshly classified type got its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rationale {
    MockProxy,
    Array,
    Throwable,
    Enum,
    Baseline,
    TrustedOrigin,
    RemoteChannel,
    AllowList,
    Untrusted,
}

impl Rationale {
    pub fn as_str(self) -> &'static str {
        match self {
            Rationale::MockProxy => "mock_proxy",
            Rationale::Array => "array",
            Rationale::Throwable => "throwable",
            Rationale::Enum => "enum",
            Rationale::Baseline => "baseline",
            Rationale::TrustedOrigin => "trusted_origin",
            Rationale::RemoteChannel => "remote_channel",
            Rationale::AllowList => "allowlist",
            Rationale::Untrusted => "untrusted",
        }
    }

    pub fn permits(self) -> bool {
        !matches!(self, Rationale::Baseline | Rationale::Untrusted)
    }
}

/// Settings carried from `filter:` config.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub mock_marker: String,
    pub advisory_url: String,
    pub throwable_roots: Vec<String>,
    pub enum_roots: Vec<String>,
}

/// Collaborators the engine is composed from.
pub struct EngineParts {
    pub settings: EngineSettings,
    pub baseline: Arc<dyn BaselineDecision>,
    pub allowlist: AllowList,
    pub classifier: OriginClassifier,
    pub policies: Arc<PolicyChain>,
    pub state: Arc<FilterState>,
    pub metrics: Arc<FilterMetrics>,
}

pub struct AdmissionEngine {
    settings: EngineSettings,
    baseline: Arc<dyn BaselineDecision>,
    allowlist: AllowList,
    classifier: OriginClassifier,
    policies: Arc<PolicyChain>,
    state: Arc<FilterState>,
    metrics: Arc<FilterMetrics>,
    cache: TypeVerdictCache,
}

impl AdmissionEngine {
    pub fn new(parts: EngineParts) -> Self {
        Self {
            settings: parts.settings,
            baseline: parts.baseline,
            allowlist: parts.allowlist,
            classifier: parts.classifier,
            policies: parts.policies,
            state: parts.state,
            metrics: parts.metrics,
            cache: TypeVerdictCache::new(),
        }
    }

    /// May an instance of `ty` be constructed from untrusted input?
    pub fn is_admitted(&self, ty: &Arc<TypeHandle>) -> bool {
        if let Some(permit) = self.policies.verdict_for_type(ty) {
            self.record("type", permit, "policy");
            return permit;
        }
        if self.state.is_disabled() {
            self.record("type", true, "disabled");
            return true;
        }

        let mut fresh = None;
        let permit = self.cache.get_or_compute(ty, || {
            let r = self.classify(ty);
            fresh = Some(r);
            r.permits()
        });
        self.record("type", permit, fresh.map_or("cached", Rationale::as_str));
        permit
    }

    /// Pre-resolution check on a bare type name. Not cached.
    pub fn is_name_admitted(&self, name: &str) -> bool {
        if self.is_mock_proxy(name) {
            self.state.disable("mock proxy type observed under test configuration");
            self.record("name", true, Rationale::MockProxy.as_str());
            return true;
        }
        if let Some(permit) = self.policies.verdict_for_name(name) {
            self.record("name", permit, "policy");
            return permit;
        }
        if self.state.is_disabled() {
            self.record("name", true, "disabled");
            return true;
        }
        self.baseline_admits("name", name, None)
    }

    /// Baseline denylist check alone, logged and counted under `path`.
    /// This is also the whole filter while the engine is not installed.
    pub fn baseline_admits(&self, path: &str, name: &str, origin: Option<&Provenance>) -> bool {
        if self.baseline.deny(name) {
            self.warn_baseline(name, origin);
            self.record(path, false, Rationale::Baseline.as_str());
            return false;
        }
        self.record(path, true, "baseline_clear");
        true
    }

    /// Full classification of a type not yet in the cache.
    pub fn classify(&self, ty: &TypeHandle) -> Rationale {
        let name = ty.name();

        if self.is_mock_proxy(name) {
            self.state.disable("mock proxy type observed under test configuration");
            return Rationale::MockProxy;
        }
        if ty.is_array() {
            tracing::debug!(type_name = %name, "permitting since it is an array");
            return Rationale::Array;
        }
        if ty.is_throwable() || has_root(ty, &self.settings.throwable_roots) {
            tracing::debug!(type_name = %name, "permitting since it is a throwable");
            return Rationale::Throwable;
        }
        if ty.is_enum() || has_root(ty, &self.settings.enum_roots) {
            tracing::debug!(type_name = %name, "permitting since it is an enum");
            return Rationale::Enum;
        }

        if self.baseline.deny(name) {
            self.warn_baseline(name, Some(ty.provenance()));
            return Rationale::Baseline;
        }

        match ty.provenance() {
            Provenance::Located(origin) => {
                if self.classifier.is_trusted(origin) {
                    tracing::debug!(type_name = %name, %origin, "permitting due to its origin");
                    return Rationale::TrustedOrigin;
                }
            }
            Provenance::RemoteChannel => {
                tracing::debug!(type_name = %name, "permitting since it was shipped over the remote channel");
                return Rationale::RemoteChannel;
            }
            Provenance::Platform => {}
        }

        if self.allowlist.contains(name) {
            tracing::info!(target: "typegate::audit", type_name = %name, origin = %ty.provenance(), "tolerating by allow-list");
            return Rationale::AllowList;
        }

        tracing::warn!(
            type_name = %name,
            origin = %ty.provenance(),
            advisory = %self.settings.advisory_url,
            "type might be dangerous, so rejecting"
        );
        Rationale::Untrusted
    }

    pub fn state(&self) -> &Arc<FilterState> {
        &self.state
    }
    pub fn classifier(&self) -> &OriginClassifier {
        &self.classifier
    }
    pub fn policies(&self) -> &Arc<PolicyChain> {
        &self.policies
    }
    pub fn metrics(&self) -> &Arc<FilterMetrics> {
        &self.metrics
    }
    pub fn baseline(&self) -> &Arc<dyn BaselineDecision> {
        &self.baseline
    }

    pub fn cached_types(&self) -> usize {
        self.cache.len()
    }

    /// Package-unload hook: forget verdicts for handles that were dropped.
    pub fn purge_unloaded(&self) -> usize {
        let n = self.cache.purge_unloaded();
        if n > 0 {
            tracing::debug!(purged = n, "dropped cached verdicts for unloaded types");
        }
        n
    }

    fn warn_baseline(&self, name: &str, origin: Option<&Provenance>) {
        match origin {
            Some(origin) => tracing::warn!(
                type_name = %name,
                %origin,
                advisory = %self.settings.advisory_url,
                "rejecting according to baseline denylist"
            ),
            None => tracing::warn!(
                type_name = %name,
                advisory = %self.settings.advisory_url,
                "rejecting according to baseline denylist"
            ),
        }
    }

    fn is_mock_proxy(&self, name: &str) -> bool {
        self.state.test_mode() && name.contains(self.settings.mock_marker.as_str())
    }

    fn record(&self, path: &str, permit: bool, reason: &str) {
        let verdict = if permit { "permit" } else { "deny" };
        self.metrics
            .decisions
            .inc(&[("path", path), ("verdict", verdict), ("reason", reason)]);
    }
}

fn has_root(ty: &TypeHandle, roots: &[String]) -> bool {
    roots.iter().any(|r| ty.is_subtype_of(r))
}
