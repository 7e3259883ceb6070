//! Origin classifier with a process-lifetime, append-only verdict cache.
//!
//! Rules, in order (first match wins):
//! 1. core package origin
//! 2. transport library origin
//! 3. archive whose descriptor names a plugin
//! 4. legacy unpacked layout (`.../WEB-INF/lib/classes.jar`) whose sibling
//!    descriptor names a plugin
//! 5. test configuration only: build output, test output, test harness
//!
//! Descriptor read failures are logged and fall through to the next rule.

use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;
use typegate_core::descriptor::{Attributes, Manifest};
use typegate_core::error::{Result, TypeGateError};
use typegate_core::types::OriginId;

use super::reader::{url_path, DescriptorReader};
use crate::config::{DescriptorSection, OriginsSection};
use crate::engine::cache::OriginVerdictCache;
use crate::obs::FilterMetrics;

const ARCHIVE_PATTERN: &str = r"^file:/.+[.]jar$";
const LEGACY_CLASSES_PATTERN: &str = r"^(file:/.+/)WEB-INF/lib/classes[.]jar$";

/// Two-attribute plugin test over descriptor main attributes.
#[derive(Debug, Clone)]
pub struct DescriptorRules {
    pub path: String,
    pub short_name: String,
    pub versions: Vec<String>,
}

impl DescriptorRules {
    pub fn from_config(cfg: &DescriptorSection) -> Self {
        Self {
            path: cfg.path.clone(),
            short_name: cfg.short_name.clone(),
            versions: cfg.versions.clone(),
        }
    }

    pub fn is_plugin(&self, attrs: &Attributes) -> bool {
        attrs.contains(&self.short_name) && self.versions.iter().any(|v| attrs.contains(v))
    }
}

impl Default for DescriptorRules {
    fn default() -> Self {
        Self::from_config(&DescriptorSection::default())
    }
}

pub struct OriginClassifier {
    core: Option<OriginId>,
    transport: Option<OriginId>,
    test_mode: bool,
    rules: DescriptorRules,
    archive_re: Regex,
    legacy_re: Regex,
    harness_re: Regex,
    reader: Arc<dyn DescriptorReader>,
    cache: OriginVerdictCache,
    metrics: Arc<FilterMetrics>,
}

impl OriginClassifier {
    pub fn new(
        origins: &OriginsSection,
        descriptor: &DescriptorSection,
        test_mode: bool,
        reader: Arc<dyn DescriptorReader>,
        metrics: Arc<FilterMetrics>,
    ) -> Result<Self> {
        let harness = format!(r"^.+/{}-.+[.]jar$", regex::escape(&origins.test_harness));
        Ok(Self {
            core: origins.core.as_deref().map(OriginId::from),
            transport: origins.transport.as_deref().map(OriginId::from),
            test_mode,
            rules: DescriptorRules::from_config(descriptor),
            archive_re: compile(ARCHIVE_PATTERN)?,
            legacy_re: compile(LEGACY_CLASSES_PATTERN)?,
            harness_re: compile(&harness)?,
            reader,
            cache: OriginVerdictCache::new(),
            metrics,
        })
    }

    pub fn core_origin(&self) -> Option<&OriginId> {
        self.core.as_ref()
    }

    /// Cached trust verdict for `origin`.
    pub fn is_trusted(&self, origin: &OriginId) -> bool {
        self.cache.get_or_compute(origin, || {
            let (trusted, rule) = self.evaluate(origin.as_str());
            let trusted_s = if trusted { "true" } else { "false" };
            self.metrics
                .origin_classifications
                .inc(&[("rule", rule), ("trusted", trusted_s)]);
            trusted
        })
    }

    /// Number of origins classified so far.
    pub fn cached_origins(&self) -> usize {
        self.cache.len()
    }

    fn evaluate(&self, loc: &str) -> (bool, &'static str) {
        if self.core.as_ref().is_some_and(|c| c.as_str() == loc) {
            tracing::debug!(origin = %loc, "location of application core, OK");
            return (true, "core");
        }
        if self.transport.as_ref().is_some_and(|t| t.as_str() == loc) {
            tracing::debug!(origin = %loc, "location of transport library, OK");
            return (true, "transport");
        }

        if self.archive_re.is_match(loc) {
            match self.archive_is_plugin(loc) {
                Ok(true) => {
                    tracing::debug!(origin = %loc, "looks like a plugin archive, OK");
                    return (true, "plugin_archive");
                }
                Ok(false) => {}
                Err(e) => {
                    self.metrics.descriptor_errors.inc(&[("source", "archive")]);
                    tracing::warn!(origin = %loc, error = %e, "problem checking archive descriptor");
                }
            }
        }

        if let Some(caps) = self.legacy_re.captures(loc) {
            let root = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            match self.legacy_is_plugin(loc, root) {
                Ok(true) => return (true, "plugin_legacy"),
                Ok(false) => {}
                Err(e) => {
                    self.metrics.descriptor_errors.inc(&[("source", "legacy")]);
                    tracing::warn!(origin = %loc, error = %e, "problem checking legacy descriptor");
                }
            }
        }

        if self.test_mode {
            if loc.ends_with("/target/classes/") {
                tracing::debug!(origin = %loc, "current build output under test, OK");
                return (true, "build_output");
            }
            if loc.ends_with("/target/test-classes/") || loc.ends_with("-tests.jar") {
                tracing::debug!(origin = %loc, "test output, OK");
                return (true, "test_output");
            }
            if self.harness_re.is_match(loc) {
                tracing::debug!(origin = %loc, "test harness, OK");
                return (true, "test_harness");
            }
        }

        tracing::debug!(origin = %loc, "origin not recognized; rejecting");
        (false, "unrecognized")
    }

    fn archive_is_plugin(&self, loc: &str) -> Result<bool> {
        let path = file_path(loc)?;
        let Some(raw) = self.reader.read_archive(&path, &self.rules.path)? else {
            tracing::debug!(origin = %loc, "ignoring archive with no descriptor");
            return Ok(false);
        };
        let plugin = self.rules.is_plugin(Manifest::parse(&raw)?.main_attributes());
        if !plugin {
            tracing::debug!(origin = %loc, "archive does not look like a plugin");
        }
        Ok(plugin)
    }

    fn legacy_is_plugin(&self, loc: &str, root: &str) -> Result<bool> {
        let descriptor = file_path(&format!("{root}{}", self.rules.path))?;
        let Some(raw) = self.reader.read_file(&descriptor)? else {
            tracing::debug!(origin = %loc, descriptor = %descriptor.display(), "no matching legacy descriptor");
            return Ok(false);
        };
        let plugin = self.rules.is_plugin(Manifest::parse(&raw)?.main_attributes());
        if plugin {
            tracing::debug!(origin = %loc, descriptor = %descriptor.display(), "legacy layout looks like a plugin, OK");
        } else {
            tracing::debug!(descriptor = %descriptor.display(), "legacy descriptor does not look like a plugin");
        }
        Ok(plugin)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| TypeGateError::Init(format!("invalid origin pattern {pattern:?}: {e}")))
}

fn file_path(loc: &str) -> Result<PathBuf> {
    url_path(loc).ok_or_else(|| TypeGateError::Descriptor(format!("not a local file url: {loc}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory descriptors keyed by path, with an I/O counter.
    #[derive(Default)]
    struct FakeReader {
        archives: HashMap<PathBuf, Bytes>,
        files: HashMap<PathBuf, Bytes>,
        broken: Vec<PathBuf>,
        reads: AtomicUsize,
    }

    impl DescriptorReader for FakeReader {
        fn read_archive(&self, archive: &Path, _entry: &str) -> Result<Option<Bytes>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.broken.iter().any(|b| b == archive) {
                return Err(TypeGateError::Descriptor("corrupt archive".into()));
            }
            Ok(self.archives.get(archive).cloned())
        }
        fn read_file(&self, path: &Path) -> Result<Option<Bytes>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.files.get(path).cloned())
        }
    }

    const PLUGIN_MF: &str = "Short-Name: foo\nPlugin-Version: 1.0\n";
    const LIB_MF: &str = "Implementation-Title: foo\n";

    fn classifier(reader: Arc<FakeReader>, test_mode: bool) -> OriginClassifier {
        let origins = OriginsSection {
            core: Some("file:///opt/app/lib/app-core.jar".into()),
            transport: Some("file:///opt/app/lib/remoting.jar".into()),
            ..OriginsSection::default()
        };
        OriginClassifier::new(
            &origins,
            &DescriptorSection::default(),
            test_mode,
            reader,
            Arc::new(FilterMetrics::default()),
        )
        .unwrap()
    }

    #[test]
    fn core_and_transport_are_trusted_without_io() {
        let reader = Arc::new(FakeReader::default());
        let c = classifier(reader.clone(), false);
        assert!(c.is_trusted(&"file:///opt/app/lib/app-core.jar".into()));
        assert!(c.is_trusted(&"file:///opt/app/lib/remoting.jar".into()));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn plugin_descriptor_needs_short_name_and_a_version() {
        let rules = DescriptorRules::default();
        let attrs = |s: &str| Manifest::parse(s.as_bytes()).unwrap().main_attributes().clone();
        assert!(rules.is_plugin(&attrs("Short-Name: a\nPlugin-Version: 1\n")));
        assert!(rules.is_plugin(&attrs("Short-Name: a\nJenkins-Version: 2.1\n")));
        assert!(!rules.is_plugin(&attrs("Short-Name: a\n")));
        assert!(!rules.is_plugin(&attrs("Plugin-Version: 1\n")));
    }

    #[test]
    fn archive_descriptor_decides_and_is_cached() {
        let mut reader = FakeReader::default();
        reader.archives.insert("/plugins/foo.jar".into(), Bytes::from_static(PLUGIN_MF.as_bytes()));
        reader.archives.insert("/lib/commons.jar".into(), Bytes::from_static(LIB_MF.as_bytes()));
        let reader = Arc::new(reader);
        let c = classifier(reader.clone(), false);

        assert!(c.is_trusted(&"file:///plugins/foo.jar".into()));
        assert!(!c.is_trusted(&"file:///lib/commons.jar".into()));
        let reads = reader.reads.load(Ordering::SeqCst);

        assert!(c.is_trusted(&"file:///plugins/foo.jar".into()));
        assert!(!c.is_trusted(&"file:///lib/commons.jar".into()));
        assert_eq!(reader.reads.load(Ordering::SeqCst), reads);
        assert_eq!(c.cached_origins(), 2);
    }

    #[test]
    fn read_failure_falls_through_to_untrusted() {
        let mut reader = FakeReader::default();
        reader.broken.push("/lib/broken.jar".into());
        let c = classifier(Arc::new(reader), false);
        assert!(!c.is_trusted(&"file:///lib/broken.jar".into()));
        assert_eq!(c.metrics.descriptor_errors.get(&[("source", "archive")]), 1);
    }

    #[test]
    fn legacy_layout_uses_sibling_descriptor() {
        let mut reader = FakeReader::default();
        reader.files.insert(
            "/var/app/plugins/old/META-INF/MANIFEST.MF".into(),
            Bytes::from_static(PLUGIN_MF.as_bytes()),
        );
        let c = classifier(Arc::new(reader), false);
        assert!(c.is_trusted(&"file:///var/app/plugins/old/WEB-INF/lib/classes.jar".into()));
        assert!(!c.is_trusted(&"file:///var/app/plugins/gone/WEB-INF/lib/classes.jar".into()));
    }

    #[test]
    fn test_outputs_only_under_test_configuration() {
        let locs = [
            "file:///src/foo/target/classes/",
            "file:///src/foo/target/test-classes/",
            "file:///repo/foo/1.0/foo-1.0-tests.jar",
            "file:///repo/jenkins-test-harness/2.0/jenkins-test-harness-2.0.jar",
        ];
        let prod = classifier(Arc::new(FakeReader::default()), false);
        let test = classifier(Arc::new(FakeReader::default()), true);
        for loc in locs {
            assert!(!prod.is_trusted(&loc.into()), "{loc} trusted outside tests");
            assert!(test.is_trusted(&loc.into()), "{loc} not trusted under tests");
        }
        assert!(!test.is_trusted(&"file:///src/foo/target/other/".into()));
    }
}
