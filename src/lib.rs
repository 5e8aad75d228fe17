//! # hookline
//!
//! A host declares hook specifications; plugins register namespaces of hook
//! implementations; calling a hook runs every implementation in a defined
//! order and collects the results.
//!
//! ```rust,ignore
//! use hookline::prelude::*;
//!
//! let mut pm = PluginManager::new("demo");
//! let spec = HookspecMarker::new("demo");
//! pm.add_hookspecs(&Namespace::new("specs").hookspec("greet", spec.mark(), &["name"]))?;
//!
//! let hookimpl = HookimplMarker::new("demo");
//! pm.register(
//!     Arc::new(Namespace::new("hello").hookimpl(
//!         "greet",
//!         hookimpl.mark(),
//!         HookCallable::new(&["name"], |args| {
//!             Ok(Some(format!("hello {}", args.get_str("name").unwrap_or("?")).into()))
//!         }),
//!     )),
//!     None,
//! )?;
//!
//! let result = pm.hooks().get("greet").unwrap().call(&hook_args! { "name" => "world" })?;
//! ```

pub use hookline_core::config::{DiscoveryConfig, HooklineConfig, LoggingConfig};
pub use hookline_core::error::{HookCallError, PluginError, PluginErrorKind};
pub use hookline_core::result::{CallResult, PluginResult};
pub use hookline_plugin::hook_args;
pub use hookline_plugin::prelude;
pub use hookline_plugin::{
    DiscoveryReport, HookArgs, HookCallable, HookCaller, HookOutcome, HookReturn, HookimplMarker,
    HookspecMarker, Namespace, PluginManager, PluginSource, Priority, SourceKind, StaticSource,
};

/// Loads [`HooklineConfig`] from `path` and the environment, installs the
/// logging subscriber it describes, and returns a manager for `project_name`
/// configured with its discovery toggles.
pub fn bootstrap(project_name: &str, path: &str) -> PluginResult<PluginManager> {
    let config = HooklineConfig::load(path)?;
    hookline_core::logging::init(&config.logging)?;
    tracing::info!(project = %project_name, "Starting hookline");
    Ok(PluginManager::with_config(project_name, config.discovery))
}
