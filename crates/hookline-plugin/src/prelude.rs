//! Prelude for convenient imports.

pub use hookline_core::error::{HookCallError, PluginError, PluginErrorKind};
pub use hookline_core::result::{CallResult, PluginResult};

pub use crate::hooks::caller::{HookCaller, ResultCallback};
pub use crate::hooks::definitions::{HookArgs, HookOutcome, HookReturn};
pub use crate::hooks::exec::Undo;
pub use crate::hooks::implementation::{HookCallable, Teardown, teardown};
pub use crate::hooks::markers::{
    HookImplOpts, HookSpecOpts, HookimplMarker, HookspecMarker, ImplMark, Priority, SpecMark,
};
pub use crate::loader::{Candidate, DiscoveryReport, PluginSource, SourceKind, StaticSource};
pub use crate::manager::{PluginManager, PluginRef};
pub use crate::namespace::Namespace;

pub use crate::hook_args;
