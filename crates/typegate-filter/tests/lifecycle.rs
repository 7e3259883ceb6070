//! Gate lifecycle and the one-way disabled mode.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;

use common::{base_yaml, gate, CORE};
use typegate_core::types::TypeHandle;
use typegate_filter::config;
use typegate_filter::engine::FilterMode;
use typegate_filter::{AdmissionGate, Installed};

const UNTRUSTED: &str = "file:///opt/app/lib/commons-collections-3.2.1.jar";
const GADGET: &str = "org.apache.commons.collections.functors.InvokerTransformer";
const MOCK: &str = "org.app.model.Job$$EnhancerByMockitoWithCGLIB$$5f2a";

fn fabricated() -> Arc<TypeHandle> {
    TypeHandle::located("org.acme.lib.Fabricated", UNTRUSTED).into_shared()
}

#[test]
fn baseline_only_until_activated() {
    let cfg = config::load_from_str(&base_yaml(false)).unwrap();
    let g = AdmissionGate::from_config(&cfg).unwrap();
    assert_eq!(g.installed(), Installed::Baseline);

    // untrusted origin is not checked before activation
    assert!(g.is_admitted(&fabricated()));
    assert!(!g.is_name_admitted(GADGET));

    g.activate();
    assert_eq!(g.installed(), Installed::Engine);
    assert!(!g.is_admitted(&fabricated()));

    g.deactivate();
    assert_eq!(g.installed(), Installed::Baseline);
    assert!(g.is_admitted(&fabricated()));
    assert!(!g.is_admitted(&TypeHandle::located(GADGET, CORE).into_shared()));
}

#[test]
fn mock_proxy_by_type_disables_filtering_under_tests() {
    let g = gate(&base_yaml(true));
    let denied = fabricated();
    assert!(!g.is_admitted(&denied));
    assert!(!g.is_name_admitted(GADGET));

    let mock = TypeHandle::located(MOCK, UNTRUSTED).into_shared();
    assert!(g.is_admitted(&mock));
    assert_eq!(g.engine().state().mode(), FilterMode::Disabled);

    // everything afterwards is permitted, including cached denials
    assert!(g.is_admitted(&denied));
    assert!(g.is_name_admitted(GADGET));
    assert!(g.engine().is_admitted(&denied));
    assert!(g.engine().is_name_admitted(GADGET));
}

#[test]
fn mock_proxy_by_name_disables_filtering_under_tests() {
    let g = gate(&base_yaml(true));
    assert!(g.is_name_admitted(MOCK));
    assert_eq!(g.engine().state().mode(), FilterMode::Disabled);
    assert!(g.is_admitted(&TypeHandle::located(GADGET, CORE).into_shared()));

    // irreversible: deactivate/activate do not re-enable filtering
    g.deactivate();
    g.activate();
    assert!(g.is_name_admitted(GADGET));
}

#[test]
fn mock_marker_ignored_outside_tests() {
    let g = gate(&base_yaml(false));
    let mock = TypeHandle::located(MOCK, UNTRUSTED).into_shared();
    assert!(!g.is_admitted(&mock));
    assert!(g.is_name_admitted(MOCK));
    assert_eq!(g.engine().state().mode(), FilterMode::Active);
    assert!(!g.is_name_admitted(GADGET));
}

#[test]
fn activation_without_core_origin_under_tests_disables() {
    let cfg = config::load_from_str("version: 1\nfilter:\n  test_mode: true\n").unwrap();
    let g = AdmissionGate::from_config(&cfg).unwrap();
    g.activate();
    assert_eq!(g.engine().state().mode(), FilterMode::Disabled);
    assert!(g.is_name_admitted(GADGET));
    assert!(g.is_admitted(&fabricated()));
}

#[test]
fn activation_without_core_origin_in_production_stays_active() {
    let cfg = config::load_from_str("version: 1\n").unwrap();
    let g = AdmissionGate::from_config(&cfg).unwrap();
    g.activate();
    assert_eq!(g.installed(), Installed::Engine);
    assert_eq!(g.engine().state().mode(), FilterMode::Active);
    assert!(!g.is_admitted(&fabricated()));
}

#[test]
fn missing_allowlist_file_aborts_startup() {
    let yaml = format!("{}allowlist:\n  path: \"/nonexistent/allowed-types.txt\"\n", base_yaml(false));
    let cfg = config::load_from_str(&yaml).unwrap();
    let err = AdmissionGate::from_config(&cfg).err().expect("must fail");
    assert_eq!(err.kind().as_str(), "INIT");
}

#[test]
fn invalid_baseline_pattern_aborts_startup() {
    let yaml = format!("{}baseline:\n  patterns: [\"(unclosed\"]\n", base_yaml(false));
    let cfg = config::load_from_str(&yaml).unwrap();
    let err = AdmissionGate::from_config(&cfg).err().expect("must fail");
    assert_eq!(err.kind().as_str(), "INIT");
}

#[test]
fn metrics_render_reflects_decisions() {
    let g = gate(&base_yaml(false));
    assert!(!g.is_admitted(&fabricated()));
    let out = g.render_metrics();
    assert!(out.contains("reason=\"untrusted\""));
    assert!(out.contains("typegate_engine_installed 1"));
    assert!(out.contains("typegate_filter_disabled 0"));
}

#[test]
fn baseline_only_denials_are_counted() {
    let cfg = config::load_from_str(&base_yaml(false)).unwrap();
    let g = AdmissionGate::from_config(&cfg).unwrap();
    assert_eq!(g.installed(), Installed::Baseline);

    assert!(!g.is_admitted(&TypeHandle::located(GADGET, UNTRUSTED).into_shared()));
    assert!(!g.is_name_admitted(GADGET));
    assert!(g.is_admitted(&fabricated()));

    let decisions = &g.engine().metrics().decisions;
    for path in ["type", "name"] {
        assert_eq!(
            decisions.get(&[("path", path), ("verdict", "deny"), ("reason", "baseline")]),
            1,
            "{path}"
        );
    }
    assert_eq!(
        decisions.get(&[("path", "type"), ("verdict", "permit"), ("reason", "baseline_clear")]),
        1
    );
}

#[test]
fn unloaded_handles_do_not_accumulate_in_the_cache() {
    let g = gate(&base_yaml(false));
    // a fresh handle per lookup, as a decoder without a type registry would do
    for _ in 0..10_000 {
        assert!(!g.is_admitted(&fabricated()));
    }
    assert!(g.engine().cached_types() <= 1024, "{}", g.engine().cached_types());
}

#[test]
fn mock_marker_is_checked_ahead_of_the_baseline() {
    let g = gate(&base_yaml(true));
    let name = "com.google.inject.Injector$$EnhancerByMockitoWithCGLIB$$9c1d";
    assert!(g.engine().baseline().deny(name));

    let mock = TypeHandle::located(name, UNTRUSTED).into_shared();
    assert!(g.is_admitted(&mock));
    assert_eq!(g.engine().state().mode(), FilterMode::Disabled);
    assert_eq!(
        g.engine().metrics().decisions.get(&[("path", "type"), ("verdict", "permit"), ("reason", "mock_proxy")]),
        1
    );
}

#[test]
fn mock_marker_outside_tests_is_just_a_name() {
    let g = gate(&base_yaml(false));
    let name = "com.google.inject.Injector$$EnhancerByMockitoWithCGLIB$$9c1d";
    assert!(!g.is_admitted(&TypeHandle::located(name, UNTRUSTED).into_shared()));
    assert_eq!(g.engine().state().mode(), FilterMode::Active);
}
