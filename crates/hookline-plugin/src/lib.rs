//! # hookline-plugin
//!
//! Hook engine for hookline. Provides:
//!
//! - Markers binding hook implementations and specifications to a project
//! - Namespaces as explicit registration tables
//! - Per-hook callers with priority slots, wrappers, and historic replay
//! - The multicall executor behind a swappable, monitorable indirection
//! - The plugin manager: registration, validation, blocking, discovery

pub mod hooks;
pub mod loader;
pub mod macros;
pub mod manager;
pub mod namespace;
pub mod prelude;
pub mod registry;

pub use hooks::caller::HookCaller;
pub use hooks::definitions::{HookArgs, HookOutcome, HookReturn};
pub use hooks::exec::{HookExec, Undo};
pub use hooks::implementation::{HookCallable, HookImpl, HookSpec};
pub use hooks::markers::{HookimplMarker, HookspecMarker, Priority};
pub use hooks::relay::HookRelay;
pub use loader::{DiscoveryReport, PluginSource, SourceKind, StaticSource};
pub use manager::{DiscoveryGuard, PluginManager, PluginRef};
pub use namespace::{Namespace, NamespaceId};
pub use registry::Plugin;
