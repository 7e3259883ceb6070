use std::collections::HashSet;

use serde::Deserialize;
use typegate_core::error::{Result, TypeGateError};

use crate::policy::baseline::DEFAULT_PATTERNS;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    pub version: u32,

    #[serde(default)]
    pub filter: FilterSection,

    #[serde(default)]
    pub origins: OriginsSection,

    #[serde(default)]
    pub descriptor: DescriptorSection,

    #[serde(default)]
    pub allowlist: AllowListSection,

    #[serde(default)]
    pub baseline: BaselineSection,

    #[serde(default)]
    pub policies: Vec<PolicyConfig>,
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TypeGateError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.filter.validate()?;
        self.origins.validate()?;
        self.descriptor.validate()?;

        let mut seen = HashSet::new();
        for p in &self.policies {
            if p.name.trim().is_empty() {
                return Err(TypeGateError::Config("policies[].name must not be empty".into()));
            }
            if !seen.insert(p.name.as_str()) {
                return Err(TypeGateError::Config(format!("duplicate policy name: {}", p.name)));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSection {
    /// Running under a recognized test configuration.
    #[serde(default)]
    pub test_mode: bool,

    #[serde(default = "default_mock_marker")]
    pub mock_marker: String,

    #[serde(default = "default_advisory_url")]
    pub advisory_url: String,

    /// A type with any of these among its supertypes is exempt as a throwable.
    #[serde(default = "default_throwable_roots")]
    pub throwable_roots: Vec<String>,

    /// A type with any of these among its supertypes is exempt as an enum.
    #[serde(default = "default_enum_roots")]
    pub enum_roots: Vec<String>,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            test_mode: false,
            mock_marker: default_mock_marker(),
            advisory_url: default_advisory_url(),
            throwable_roots: default_throwable_roots(),
            enum_roots: default_enum_roots(),
        }
    }
}

impl FilterSection {
    pub fn validate(&self) -> Result<()> {
        if self.mock_marker.is_empty() {
            return Err(TypeGateError::Config("filter.mock_marker must not be empty".into()));
        }
        if let Err(e) = url::Url::parse(&self.advisory_url) {
            return Err(TypeGateError::Config(format!(
                "filter.advisory_url is not an absolute url: {e}"
            )));
        }
        for (key, roots) in [
            ("filter.throwable_roots", &self.throwable_roots),
            ("filter.enum_roots", &self.enum_roots),
        ] {
            if roots.iter().any(|r| r.trim().is_empty()) {
                return Err(TypeGateError::Config(format!("{key} entries must not be empty")));
            }
        }
        Ok(())
    }
}

fn default_mock_marker() -> String {
    "$$EnhancerByMockitoWithCGLIB$$".into()
}
fn default_advisory_url() -> String {
    "https://jenkins.io/redirect/class-filter/".into()
}
fn default_throwable_roots() -> Vec<String> {
    vec!["java.lang.Throwable".into()]
}
fn default_enum_roots() -> Vec<String> {
    vec!["java.lang.Enum".into()]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OriginsSection {
    /// Origin of the application core package.
    #[serde(default)]
    pub core: Option<String>,

    /// Origin of the transport library package.
    #[serde(default)]
    pub transport: Option<String>,

    #[serde(default = "default_test_harness")]
    pub test_harness: String,
}

impl Default for OriginsSection {
    fn default() -> Self {
        Self {
            core: None,
            transport: None,
            test_harness: default_test_harness(),
        }
    }
}

impl OriginsSection {
    pub fn validate(&self) -> Result<()> {
        for (key, v) in [("origins.core", &self.core), ("origins.transport", &self.transport)] {
            if matches!(v, Some(s) if s.trim().is_empty()) {
                return Err(TypeGateError::Config(format!("{key} must not be empty when set")));
            }
        }
        if self.test_harness.is_empty() {
            return Err(TypeGateError::Config("origins.test_harness must not be empty".into()));
        }
        Ok(())
    }
}

fn default_test_harness() -> String {
    "jenkins-test-harness".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorSection {
    /// Descriptor location inside an archive (and relative to a legacy root).
    #[serde(default = "default_descriptor_path")]
    pub path: String,

    #[serde(default = "default_short_name")]
    pub short_name: String,

    /// Any one of these alongside the short name marks a plugin.
    #[serde(default = "default_versions")]
    pub versions: Vec<String>,
}

impl Default for DescriptorSection {
    fn default() -> Self {
        Self {
            path: default_descriptor_path(),
            short_name: default_short_name(),
            versions: default_versions(),
        }
    }
}

impl DescriptorSection {
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() || self.path.starts_with('/') {
            return Err(TypeGateError::Config(
                "descriptor.path must be a non-empty relative path".into(),
            ));
        }
        if self.short_name.is_empty() {
            return Err(TypeGateError::Config("descriptor.short_name must not be empty".into()));
        }
        if self.versions.is_empty() || self.versions.iter().any(String::is_empty) {
            return Err(TypeGateError::Config(
                "descriptor.versions must list at least one attribute".into(),
            ));
        }
        Ok(())
    }
}

fn default_descriptor_path() -> String {
    "META-INF/MANIFEST.MF".into()
}
fn default_short_name() -> String {
    "Short-Name".into()
}
fn default_versions() -> Vec<String> {
    vec!["Plugin-Version".into(), "Jenkins-Version".into()]
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AllowListSection {
    /// Newline-delimited file; the embedded list is used when unset.
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub extra: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaselineSection {
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
}

impl Default for BaselineSection {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }
}

fn default_patterns() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
}

/// Config-defined custom policy. `!name` denies, `name` permits.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<String>,
}
