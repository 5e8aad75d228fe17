//! Integration tests for plugin discovery.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use hookline::DiscoveryConfig;
use hookline::prelude::*;

use crate::helpers;

fn sources(pm: &mut PluginManager) {
    pm.add_source(
        StaticSource::prefix("example_")
            .namespace("example_prefixed", helpers::greeter("example_prefixed", "prefix"))
            .namespace("shared", helpers::greeter("shared", "from prefix")),
    );
    pm.add_source(
        StaticSource::entry_points("example.plugins")
            .namespace("entry", helpers::greeter("entry", "entry"))
            .namespace("shared", helpers::greeter("shared", "from entry point")),
    );
}

fn failing_source() -> StaticSource {
    StaticSource::entry_points("example.plugins")
        .loader("broken", "broken_module", || {
            Err(anyhow::anyhow!("ImportError: no module named broken"))
        })
        .namespace("fine", helpers::greeter("fine", "fine"))
}

#[test]
fn test_entry_points_load_before_prefix() {
    let mut pm = helpers::manager_with_specs();
    sources(&mut pm);

    let report = pm.discover(true).expect("discover");
    assert_eq!(report.count, 3);
    assert!(report.errors.is_empty());

    let result = helpers::call(&pm, "greet", &hook_args! { "name" => "x" });
    assert!(result.contains(&json!("from entry point x")));
    assert!(!result.contains(&json!("from prefix x")));
}

#[test]
fn test_registered_names_are_skipped() {
    let mut pm = helpers::manager_with_specs();
    pm.register(helpers::greeter("entry", "manual"), None)
        .expect("register");
    sources(&mut pm);

    let report = pm.discover(true).expect("discover");
    assert_eq!(report.count, 2);
}

#[test]
fn test_already_registered_namespace_is_not_counted() {
    let mut pm = helpers::manager_with_specs();
    let ns = helpers::greeter("original", "hi");
    pm.register(ns.clone(), None).expect("register");
    pm.add_source(StaticSource::prefix("example_").namespace("alias", ns));

    let report = pm.discover(true).expect("discover");
    assert_eq!(report.count, 0);
    assert!(!pm.has_plugin("alias"));
}

#[test]
fn test_errors_are_collected_and_blocked() {
    let mut pm = helpers::manager_with_specs();
    pm.add_source(failing_source());

    let report = pm.discover(true).expect("errors are collected");
    assert_eq!(report.count, 1);
    assert_eq!(report.errors.len(), 1);

    let err = &report.errors[0];
    assert_eq!(err.kind, PluginErrorKind::Import);
    assert_eq!(err.plugin_name.as_deref(), Some("broken"));
    assert_eq!(err.manager.as_deref(), Some(helpers::PROJECT));
    assert!(err.message.contains("broken_module"));
    assert!(pm.is_blocked("broken"));
    assert!(pm.is_registered("fine"));

    assert_eq!(pm.errors().len(), 1);
    assert_eq!(pm.get_errors(Some("broken"), None).len(), 1);
    assert_eq!(pm.get_errors(None, Some(PluginErrorKind::Import)).len(), 1);
    assert!(pm.get_errors(Some("fine"), None).is_empty());
    assert!(pm.get_errors(None, Some(PluginErrorKind::Validation)).is_empty());
}

#[test]
fn test_fail_fast_raises_first_error() {
    let mut pm = helpers::manager_with_specs();
    pm.add_source(failing_source());

    let err = pm.discover(false).expect_err("fail fast");
    assert_eq!(err.kind, PluginErrorKind::Import);
    assert!(pm.is_blocked("broken"));
    assert!(!pm.is_registered("fine"));

    let report = pm.discover(false).expect("blocked name is skipped");
    assert_eq!(report.count, 1);
}

#[test]
fn test_validation_failures_pass_through() {
    let mut pm = helpers::manager_with_specs();
    let greedy = Arc::new(Namespace::new("greedy").hookimpl(
        "greet",
        helpers::impl_mark(),
        HookCallable::new(&["name", "unknown"], |_| Ok(None)),
    ));
    pm.add_source(StaticSource::prefix("example_").namespace("greedy", greedy));

    let report = pm.discover(true).expect("discover");
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, PluginErrorKind::Validation);
    assert!(pm.is_blocked("greedy"));
}

#[test]
fn test_disable_plugins_skips_everything() {
    let mut pm = PluginManager::with_config(
        helpers::PROJECT,
        DiscoveryConfig {
            disable_plugins: true,
            ..DiscoveryConfig::default()
        },
    );
    sources(&mut pm);

    let report = pm.discover(true).expect("discover");
    assert_eq!(report.count, 0);
    assert!(pm.plugins().next().is_none());
    assert!(!pm.hooks().needs_discovery());
}

#[test]
fn test_phase_toggles() {
    let mut pm = PluginManager::with_config(
        helpers::PROJECT,
        DiscoveryConfig {
            disable_entrypoint_plugins: true,
            ..DiscoveryConfig::default()
        },
    );
    sources(&mut pm);
    let report = pm.discover(true).expect("discover");
    assert_eq!(report.count, 2);
    assert!(!pm.has_plugin("entry"));

    let mut pm = PluginManager::with_config(
        helpers::PROJECT,
        DiscoveryConfig {
            disable_prefix_plugins: true,
            ..DiscoveryConfig::default()
        },
    );
    sources(&mut pm);
    let report = pm.discover(true).expect("discover");
    assert_eq!(report.count, 2);
    assert!(!pm.has_plugin("example_prefixed"));
}

#[test]
fn test_lazy_discovery_runs_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let mut pm = helpers::manager_with_specs();
    pm.add_source(
        StaticSource::entry_points("example.plugins").loader("counted", "counted_module", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(helpers::greeter("counted", "lazy"))
        }),
    );

    assert!(pm.hooks().needs_discovery());
    assert!(pm.hook("greet").is_some());
    assert!(pm.hook("greet").is_some());
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(pm.is_registered("counted"));
}

#[test]
fn test_discovery_blocked_suspends_lazy_discovery() {
    let mut pm = helpers::manager_with_specs();
    pm.add_source(StaticSource::prefix("example_").namespace("lazy", helpers::greeter("lazy", "hi")));

    {
        let mut blocked = pm.discovery_blocked();
        assert!(blocked.hook("greet").is_some());
        assert!(!blocked.is_registered("lazy"));
    }
    assert!(pm.hooks().needs_discovery());

    pm.hook("greet");
    assert!(pm.is_registered("lazy"));
}
