//! Process-wide admission gate.
//!
//! The transport layer holds one `AdmissionGate` and calls it once per type
//! (and once per bare name) while decoding a stream; a `false` aborts the
//! message. Which filter answers is an administrative choice:
//! - before `activate()` and after `deactivate()`: baseline denylist only
//! - after `activate()`: the full decision engine
//! - once disabled (mocked test environment): everything is permitted

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use typegate_core::error::Result;
use typegate_core::types::TypeHandle;

use crate::config::FilterConfig;
use crate::engine::{AdmissionEngine, EngineParts, EngineSettings, FilterState};
use crate::obs::FilterMetrics;
use crate::origin::{ArchiveReader, DescriptorReader, OriginClassifier};
use crate::policy::{AllowList, BaselineDecision, CustomPolicy, PatternDenylist, PolicyChain, StaticPolicy};

/// Which filter currently answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installed {
    Baseline,
    Engine,
}

impl Installed {
    pub fn as_str(self) -> &'static str {
        match self {
            Installed::Baseline => "baseline",
            Installed::Engine => "engine",
        }
    }
}

const INSTALLED_BASELINE: u8 = 0;
const INSTALLED_ENGINE: u8 = 1;

pub struct AdmissionGate {
    engine: Arc<AdmissionEngine>,
    installed: AtomicU8,
}

impl AdmissionGate {
    pub fn new(engine: Arc<AdmissionEngine>) -> Self {
        Self {
            engine,
            installed: AtomicU8::new(INSTALLED_BASELINE),
        }
    }

    /// Build every collaborator from config, reading descriptors from disk.
    pub fn from_config(cfg: &FilterConfig) -> Result<Self> {
        Self::from_config_with_reader(cfg, Arc::new(ArchiveReader))
    }

    /// Like [`from_config`](Self::from_config) with a custom descriptor reader.
    pub fn from_config_with_reader(
        cfg: &FilterConfig,
        reader: Arc<dyn DescriptorReader>,
    ) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(FilterMetrics::default());
        let state = Arc::new(FilterState::new(cfg.filter.test_mode));
        let baseline: Arc<dyn BaselineDecision> = Arc::new(PatternDenylist::new(&cfg.baseline.patterns)?);
        let allowlist = AllowList::load(&cfg.allowlist)?;
        let classifier = OriginClassifier::new(
            &cfg.origins,
            &cfg.descriptor,
            cfg.filter.test_mode,
            reader,
            Arc::clone(&metrics),
        )?;

        let policies = Arc::new(PolicyChain::new());
        for p in &cfg.policies {
            policies.register(Arc::new(StaticPolicy::from_config(p)));
        }

        tracing::info!(
            allowlist = allowlist.len(),
            policies = cfg.policies.len(),
            test_mode = cfg.filter.test_mode,
            "type filter built"
        );

        let engine = AdmissionEngine::new(EngineParts {
            settings: EngineSettings {
                mock_marker: cfg.filter.mock_marker.clone(),
                advisory_url: cfg.filter.advisory_url.clone(),
                throwable_roots: cfg.filter.throwable_roots.clone(),
                enum_roots: cfg.filter.enum_roots.clone(),
            },
            baseline,
            allowlist,
            classifier,
            policies,
            state,
            metrics,
        });
        Ok(Self::new(Arc::new(engine)))
    }

    /// Install the engine as the active filter. In a mocked test environment
    /// (test configuration with no known core origin) filtering is disabled
    /// outright instead.
    pub fn activate(&self) {
        let state = self.engine.state();
        if state.test_mode() && self.engine.classifier().core_origin().is_none() {
            state.disable("no core origin under test configuration; mocked environment");
            return;
        }
        self.installed.store(INSTALLED_ENGINE, Ordering::Release);
        tracing::info!("type filter activated");
    }

    /// Revert to the baseline denylist alone.
    pub fn deactivate(&self) {
        self.installed.store(INSTALLED_BASELINE, Ordering::Release);
        tracing::info!("type filter deactivated; baseline denylist only");
    }

    pub fn installed(&self) -> Installed {
        match self.installed.load(Ordering::Acquire) {
            INSTALLED_ENGINE => Installed::Engine,
            _ => Installed::Baseline,
        }
    }

    /// Register a custom policy hook; evaluated after previously registered ones.
    pub fn register_policy(&self, hook: Arc<dyn CustomPolicy>) {
        tracing::debug!(policy = %hook.name(), "registering custom policy");
        self.engine.policies().register(hook);
    }

    pub fn is_admitted(&self, ty: &Arc<TypeHandle>) -> bool {
        if self.engine.state().is_disabled() {
            return true;
        }
        match self.installed() {
            Installed::Engine => self.engine.is_admitted(ty),
            Installed::Baseline => self.engine.baseline_admits("type", ty.name(), Some(ty.provenance())),
        }
    }

    pub fn is_name_admitted(&self, name: &str) -> bool {
        if self.engine.state().is_disabled() {
            return true;
        }
        match self.installed() {
            Installed::Engine => self.engine.is_name_admitted(name),
            Installed::Baseline => self.engine.baseline_admits("name", name, None),
        }
    }

    pub fn engine(&self) -> &Arc<AdmissionEngine> {
        &self.engine
    }

    /// Prometheus text for the decision counters plus gate state gauges.
    pub fn render_metrics(&self) -> String {
        let disabled = u64::from(self.engine.state().is_disabled());
        let active = u64::from(self.installed() == Installed::Engine);
        self.engine.metrics().render(&[
            ("typegate_filter_disabled", disabled),
            ("typegate_engine_installed", active),
            ("typegate_cached_types", self.engine.cached_types() as u64),
            ("typegate_cached_origins", self.engine.classifier().cached_origins() as u64),
        ])
    }
}
