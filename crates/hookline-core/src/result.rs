//! Convenience result type aliases for hookline.

use crate::error::{HookCallError, PluginError};

/// A specialized `Result` type for registry operations (register,
/// unregister, specification binding, discovery).
pub type PluginResult<T> = Result<T, PluginError>;

/// A specialized `Result` type for hook dispatch.
pub type CallResult<T> = Result<T, HookCallError>;
