//! Integration tests for registration, blocking, and validation.

use std::sync::Arc;

use serde_json::json;

use hookline::prelude::*;

use crate::helpers::{self, impl_mark, spec_mark};

#[test]
fn test_greet_end_to_end() {
    let mut pm = helpers::manager_with_specs();
    pm.register(helpers::greeter("hello", "hello"), None)
        .expect("register hello");
    pm.register(helpers::greeter("howdy", "howdy"), None)
        .expect("register howdy");

    let result = helpers::call(&pm, "greet", &hook_args! { "name" => "world" });
    assert_eq!(result, vec![json!("howdy world"), json!("hello world")]);
}

fn greet_plugins(pm: &mut PluginManager) {
    let greeting = |plugin: &str, mark: ImplMark, word: &'static str| {
        Arc::new(Namespace::new(plugin).hookimpl(
            "greet",
            mark,
            HookCallable::new(&["name"], move |args| {
                let name = args.get_str("name").unwrap_or_default();
                Ok(Some(json!(format!("{word} {name}"))))
            }),
        ))
    };
    pm.register(greeting("a", impl_mark().tryfirst(), "hi"), None)
        .expect("register a");
    pm.register(greeting("b", impl_mark(), "hello"), None)
        .expect("register b");
}

#[test]
fn test_greet_tryfirst_runs_before_normal() {
    let mut pm = helpers::manager_with_specs();
    greet_plugins(&mut pm);

    let result = helpers::call(&pm, "greet", &hook_args! { "name" => "Sam" });
    assert_eq!(result, vec![json!("hi Sam"), json!("hello Sam")]);
}

#[test]
fn test_greet_firstresult_returns_tryfirst_value() {
    let mut pm = helpers::manager();
    pm.add_hookspecs(
        &Namespace::new("firstresult.specs").hookspec("greet", spec_mark().firstresult(), &["name"]),
    )
    .expect("add specs");
    greet_plugins(&mut pm);

    let result = pm
        .hooks()
        .get("greet")
        .expect("caller")
        .call(&hook_args! { "name" => "Sam" })
        .expect("call");
    assert_eq!(result, HookReturn::First(Some(json!("hi Sam"))));
}

#[test]
fn test_register_returns_canonical_name() {
    let mut pm = helpers::manager();
    let declared = pm
        .register(helpers::greeter("declared", "hi"), None)
        .expect("register");
    assert_eq!(declared.as_deref(), Some("declared"));

    let explicit = pm
        .register(helpers::greeter("ignored", "hi"), Some("explicit"))
        .expect("register");
    assert_eq!(explicit.as_deref(), Some("explicit"));

    let anonymous = Arc::new(Namespace::anonymous());
    let derived = pm.register(anonymous.clone(), None).expect("register");
    assert_eq!(derived, Some(pm.get_canonical_name(&anonymous)));
    assert_eq!(pm.get_name(&anonymous), derived.as_deref());
}

#[test]
fn test_duplicate_object_is_rejected_under_any_name() {
    let mut pm = helpers::manager();
    let ns = helpers::greeter("hello", "hi");
    pm.register(ns.clone(), None).expect("register");

    let err = pm.register(ns, Some("alias")).expect_err("duplicate object");
    assert_eq!(err.kind, PluginErrorKind::DuplicateObject);
    assert!(!pm.has_plugin("alias"));
}

#[test]
fn test_duplicate_name_is_rejected() {
    let mut pm = helpers::manager();
    pm.register(helpers::greeter("hello", "hi"), None)
        .expect("register");

    let err = pm
        .register(helpers::greeter("hello", "hey"), None)
        .expect_err("duplicate name");
    assert_eq!(err.kind, PluginErrorKind::DuplicateName);
    assert_eq!(err.plugin_name.as_deref(), Some("hello"));
}

#[test]
fn test_blocked_name_cannot_register() {
    let mut pm = helpers::manager_with_specs();
    pm.set_blocked("hello", true);

    let result = pm
        .register(helpers::greeter("hello", "hi"), None)
        .expect("blocked is not an error");
    assert!(result.is_none());
    assert!(!pm.is_registered("hello"));

    pm.set_blocked("hello", false);
    assert!(!pm.is_blocked("hello"));
    let result = pm
        .register(helpers::greeter("hello", "hi"), None)
        .expect("register");
    assert_eq!(result.as_deref(), Some("hello"));
}

#[test]
fn test_blocking_unregisters_registered_plugin() {
    let mut pm = helpers::manager_with_specs();
    pm.register(helpers::greeter("hello", "hi"), None)
        .expect("register");
    pm.register(helpers::greeter("other", "yo"), None)
        .expect("register");

    pm.set_blocked("hello", true);
    assert!(pm.is_blocked("hello"));
    assert!(!pm.is_registered("hello"));
    assert_eq!(
        helpers::call(&pm, "greet", &hook_args! { "name" => "x" }),
        vec![json!("yo x")]
    );
}

#[test]
fn test_unregister_preserves_remaining_order() {
    let mut pm = helpers::manager_with_specs();
    for (name, value) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
        pm.register(helpers::returning(name, "greet", json!(value)), None)
            .expect("register");
    }

    let removed = pm.unregister("b").expect("registered");
    assert_eq!(removed.name(), "b");
    assert_eq!(removed.hook_names(), ["greet".to_string()]);

    let result = helpers::call(&pm, "greet", &hook_args! { "name" => "x" });
    assert_eq!(result, vec![json!(4), json!(3), json!(1)]);
    assert!(pm.unregister("b").is_none());
}

#[test]
fn test_argument_superset_is_rejected() {
    let mut pm = helpers::manager_with_specs();
    let ns = Arc::new(Namespace::new("greedy").hookimpl(
        "greet",
        impl_mark(),
        HookCallable::new(&["name", "shout"], |_| Ok(None)),
    ));

    let err = pm.register(ns, None).expect_err("validation");
    assert_eq!(err.kind, PluginErrorKind::Validation);
    assert!(err.message.contains("shout"));
    assert!(!pm.is_registered("greedy"));
    assert!(pm.hooks().get("greet").expect("caller").is_empty());
}

#[test]
fn test_argument_subset_is_accepted() {
    let mut pm = helpers::manager_with_specs();
    let ns = helpers::returning("quiet", "greet", json!("quiet"));
    pm.register(ns, None).expect("fewer arguments are fine");
    assert_eq!(
        helpers::call(&pm, "greet", &hook_args! { "name" => "x" }),
        vec![json!("quiet")]
    );
}

#[test]
fn test_historic_hook_rejects_wrappers() {
    let mut pm = helpers::manager_with_specs();
    let ns = Arc::new(Namespace::new("wrapping").hookwrapper(
        "announce",
        impl_mark(),
        HookCallable::wrapper(&[], |_| Ok(teardown(|_| {}))),
    ));

    let err = pm.register(ns, None).expect_err("validation");
    assert_eq!(err.kind, PluginErrorKind::Validation);
    assert!(err.message.contains("historic incompatible to hookwrapper"));
}

#[test]
fn test_historic_firstresult_spec_is_rejected() {
    let mut pm = helpers::manager();
    let ns = Namespace::new("bad.specs").hookspec("both", spec_mark().historic().firstresult(), &[]);
    let err = pm.add_hookspecs(&ns).expect_err("validation");
    assert_eq!(err.kind, PluginErrorKind::Validation);
    assert!(!pm.hooks().contains("both"));
}

#[test]
fn test_late_spec_binding_validates_existing_impls() {
    let mut pm = helpers::manager();
    let ns = Arc::new(Namespace::new("early").hookimpl(
        "greet",
        impl_mark(),
        HookCallable::new(&["name", "extra"], |_| Ok(None)),
    ));
    pm.register(ns, None).expect("no spec yet");

    let err = pm.add_hookspecs(&helpers::specs()).expect_err("late validation");
    assert_eq!(err.kind, PluginErrorKind::Validation);
    assert_eq!(err.plugin_name.as_deref(), Some("early"));
    assert!(!pm.hooks().get("greet").expect("caller").has_spec());
    assert!(!pm.hooks().contains("pick"));
}

#[test]
fn test_late_spec_binding_applies_flags() {
    let mut pm = helpers::manager();
    pm.register(helpers::returning("a", "pick", json!("a")), None)
        .expect("register");
    pm.register(helpers::returning("b", "pick", json!("b")), None)
        .expect("register");
    assert_eq!(
        helpers::call(&pm, "pick", &HookArgs::new()),
        vec![json!("b"), json!("a")]
    );

    pm.add_hookspecs(&helpers::specs()).expect("specs");
    assert_eq!(
        helpers::call(&pm, "pick", &hook_args! { "value" => 1 }),
        vec![json!("b")]
    );
}

#[test]
fn test_second_spec_for_same_hook_is_rejected() {
    let mut pm = helpers::manager_with_specs();
    let again = Namespace::new("again").hookspec("greet", spec_mark(), &["name"]);
    let err = pm.add_hookspecs(&again).expect_err("already specified");
    assert_eq!(err.kind, PluginErrorKind::Validation);
}

#[test]
fn test_specs_only_count_for_own_project() {
    let mut pm = helpers::manager();
    let foreign = Namespace::new("foreign").hookspec(
        "greet",
        HookspecMarker::new("someone-else").mark(),
        &["name"],
    );
    let err = pm.add_hookspecs(&foreign).expect_err("no hooks");
    assert_eq!(err.kind, PluginErrorKind::NoHooksFound);
}

#[test]
fn test_check_pending_names_offending_plugin() {
    let mut pm = helpers::manager_with_specs();
    pm.register(helpers::returning("typo", "gret", json!(1)), None)
        .expect("register");

    let err = pm.check_pending().expect_err("unknown hook");
    assert_eq!(err.kind, PluginErrorKind::UnknownHook);
    assert!(err.kind.is_validation());
    assert_eq!(err.plugin_name.as_deref(), Some("typo"));
    assert!(err.message.contains("gret"));

    pm.unregister("typo");
    pm.register(
        helpers::returning_with("maybe", "gret", impl_mark().optional(), json!(1)),
        None,
    )
    .expect("register");
    pm.check_pending().expect("optional hooks pass");
}

#[test]
fn test_register_map_and_identifiers() {
    let mut pm = helpers::manager_with_specs();
    let name = pm
        .register_map(
            vec![(
                "greet",
                HookCallable::new(&["name"], |_| Ok(Some(json!("mapped")))),
            )],
            Some("mapped"),
        )
        .expect("register");
    assert_eq!(name.as_deref(), Some("mapped"));
    assert_eq!(
        helpers::call(&pm, "greet", &hook_args! { "name" => "x" }),
        vec![json!("mapped")]
    );

    let err = pm
        .register_map(vec![("not-an-ident", HookCallable::new(&[], |_| Ok(None)))], None)
        .expect_err("invalid key");
    assert_eq!(err.kind, PluginErrorKind::InvalidNamespace);
}

#[test]
fn test_add_hookspecs_map() {
    let mut pm = helpers::manager();
    pm.add_hookspecs_map(
        "mapped.specs",
        vec![("first", &["x"][..]), ("second", &[][..])],
        HookSpecOpts {
            firstresult: true,
            ..HookSpecOpts::default()
        },
    )
    .expect("specs");
    let caller = pm.hooks().get("first").expect("caller");
    assert!(caller.is_firstresult());
    assert_eq!(caller.spec().expect("spec").namespace(), "mapped.specs");
    assert!(pm.hooks().contains("second"));
}

#[test]
fn test_warn_on_impl_does_not_fail_registration() {
    let mut pm = helpers::manager();
    let ns = Namespace::new("deprecated.specs").hookspec(
        "old_hook",
        spec_mark().warn_on_impl("old_hook is deprecated"),
        &[],
    );
    pm.add_hookspecs(&ns).expect("specs");
    pm.register(helpers::returning("user", "old_hook", json!(1)), None)
        .expect("warning only");
}

#[test]
fn test_queries() {
    let mut pm = helpers::manager_with_specs();
    pm.register(helpers::greeter("zeta", "z"), None).expect("register");
    pm.register(helpers::greeter("alpha", "a"), None).expect("register");

    let names: Vec<&str> = pm.list_name_plugin().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
    assert_eq!(pm.plugins().count(), 2);
    assert_eq!(pm.project_name(), helpers::PROJECT);

    let callers = pm.get_hookcallers("alpha").expect("registered");
    assert_eq!(callers.len(), 1);
    assert_eq!(callers[0].name(), "greet");
    assert!(pm.get_hookcallers("missing").is_none());

    let ns = pm.get_plugin("zeta").expect("plugin").clone();
    assert!(pm.is_registered(&ns));
}
