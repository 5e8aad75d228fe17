//! Integration tests for historic hooks.

use std::sync::Arc;

use serde_json::{Value, json};

use hookline::prelude::*;

use crate::helpers::{self, EventLog, impl_mark};

fn listener(plugin: &str, log: &EventLog) -> Arc<Namespace> {
    let log = log.clone();
    let name = plugin.to_string();
    Arc::new(Namespace::new(plugin).hookimpl(
        "announce",
        impl_mark(),
        HookCallable::new(&["event"], move |args| {
            let event = args.get_str("event").unwrap_or_default().to_string();
            log.push(format!("{name}:{event}"));
            Ok(Some(json!(format!("{name} saw {event}"))))
        }),
    ))
}

#[test]
fn test_late_plugin_replays_history_once_before_live_calls() {
    let mut pm = helpers::manager_with_specs();
    let log = EventLog::new();
    pm.register(listener("early", &log), None).expect("register");

    let results = EventLog::new();
    let sink = results.clone();
    let callback: ResultCallback = Arc::new(move |value: &Value| {
        sink.push(value.as_str().unwrap_or_default());
    });
    let caller = pm.hooks().get("announce").expect("caller");
    caller
        .call_historic(&hook_args! { "event" => "start" }, Some(callback))
        .expect("call");
    caller
        .call(&hook_args! { "event" => "ready" })
        .expect("call");
    assert_eq!(log.entries(), vec!["early:start", "early:ready"]);
    assert_eq!(results.entries(), vec!["early saw start"]);

    pm.register(listener("late", &log), None).expect("register");
    assert_eq!(
        log.entries(),
        vec!["early:start", "early:ready", "late:start", "late:ready"]
    );
    assert_eq!(results.entries(), vec!["early saw start", "late saw start"]);

    pm.hooks()
        .get("announce")
        .expect("caller")
        .call(&hook_args! { "event" => "live" })
        .expect("call");
    assert_eq!(
        log.entries()[4..],
        ["late:live".to_string(), "early:live".to_string()]
    );
}

#[test]
fn test_replay_failure_aborts_registration() {
    let mut pm = helpers::manager_with_specs();
    pm.hooks()
        .get("announce")
        .expect("caller")
        .call(&hook_args! { "event" => "start" })
        .expect("call");

    let failing = Arc::new(Namespace::new("failing").hookimpl(
        "announce",
        impl_mark(),
        HookCallable::new(&["event"], |_| Err(anyhow::anyhow!("cannot handle"))),
    ));
    let err = pm.register(failing, None).expect_err("replay fails");
    assert_eq!(err.kind, PluginErrorKind::Registration);
    assert!(std::error::Error::source(&err).is_some());
    assert!(!pm.is_registered("failing"));
    assert!(pm.hooks().get("announce").expect("caller").is_empty());
}

#[test]
fn test_history_is_kept_without_implementations() {
    let mut pm = helpers::manager_with_specs();
    let caller = pm.hooks().get("announce").expect("caller");
    caller.call(&hook_args! { "event" => "one" }).expect("call");
    caller.call(&hook_args! { "event" => "two" }).expect("call");
    assert_eq!(caller.history_len(), 2);

    let log = EventLog::new();
    pm.register(listener("late", &log), None).expect("register");
    assert_eq!(log.entries(), vec!["late:one", "late:two"]);
}
