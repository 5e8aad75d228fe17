//! # hookline-core
//!
//! Core crate for hookline. Contains the unified error system, result
//! aliases, configuration schemas, and the logging bootstrap.
//!
//! This crate has **no** internal dependencies on other hookline crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;

pub use error::{HookCallError, PluginError, PluginErrorKind};
pub use result::{CallResult, PluginResult};
