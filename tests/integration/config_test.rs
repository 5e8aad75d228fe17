//! Integration tests for configuration loading and bootstrap.

use hookline::HooklineConfig;

#[test]
fn test_load_fixture_config() {
    let config = HooklineConfig::load("tests/fixtures/hookline").expect("load fixture");
    assert!(config.discovery.disable_prefix_plugins);
    assert!(!config.discovery.disable_plugins);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_bootstrap_applies_discovery_config() {
    let pm = hookline::bootstrap("example", "tests/fixtures/hookline").expect("bootstrap");
    assert_eq!(pm.project_name(), "example");
    assert!(pm.discovery_config().disable_prefix_plugins);
}

#[test]
fn test_environment_toggles_reach_loaded_config() {
    let env = [
        ("HOOKLINE_DISABLE_ENTRYPOINT_PLUGINS", "1"),
        ("HOOKLINE_LOGGING__LEVEL", "warn"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let config =
        HooklineConfig::load_with_env("tests/fixtures/hookline", Some(env)).expect("load");
    assert!(config.discovery.disable_entrypoint_plugins);
    assert!(config.discovery.disable_prefix_plugins);
    assert!(!config.discovery.disable_plugins);
    assert_eq!(config.logging.level, "warn");

    let pm = hookline::PluginManager::with_config("example", config.discovery);
    assert!(pm.discovery_config().disable_entrypoint_plugins);
}
