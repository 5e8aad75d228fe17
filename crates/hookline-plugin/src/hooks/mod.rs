//! Hook system: markers, descriptors, callers, the multicall executor, and
//! the execution indirection.

pub mod caller;
pub mod definitions;
pub mod dispatcher;
pub mod exec;
pub mod implementation;
pub mod markers;
pub mod relay;

pub use caller::{HookCaller, ResultCallback};
pub use definitions::{HookArgs, HookOutcome, HookReturn};
pub use dispatcher::multicall;
pub use exec::{HookExec, Undo};
pub use implementation::{HookCallable, HookFunction, HookImpl, HookSpec, Teardown, teardown};
pub use markers::{
    HookImplOpts, HookSpecOpts, HookimplMarker, HookspecMarker, ImplMark, Priority, SpecMark,
};
pub use relay::HookRelay;
