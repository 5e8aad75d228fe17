//! Unified error types for hookline.
//!
//! Registry operations (registration, specification binding, discovery)
//! fail with [`PluginError`]. Hook dispatch fails with [`HookCallError`],
//! which carries whatever error the failing implementation returned.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Shared, cloneable error cause attached to a [`PluginError`].
pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Categorization of registry errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PluginErrorKind {
    /// A candidate namespace failed to load.
    Import,
    /// A hook implementation is incompatible with its specification.
    Validation,
    /// A hook implementation names a hook that has no specification and is
    /// not marked optional.
    UnknownHook,
    /// Registration failed after the namespace was loaded.
    Registration,
    /// The canonical name is already registered.
    DuplicateName,
    /// The namespace object is already registered under some name.
    DuplicateObject,
    /// A namespace passed as a specification source declares no hooks.
    NoHooksFound,
    /// A mapping could not be turned into a namespace.
    InvalidNamespace,
    /// Configuration could not be loaded.
    Configuration,
}

impl PluginErrorKind {
    /// Returns whether this kind belongs to the validation class.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation | Self::UnknownHook)
    }
}

impl fmt::Display for PluginErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => write!(f, "IMPORT"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::UnknownHook => write!(f, "UNKNOWN_HOOK"),
            Self::Registration => write!(f, "REGISTRATION"),
            Self::DuplicateName => write!(f, "DUPLICATE_NAME"),
            Self::DuplicateObject => write!(f, "DUPLICATE_OBJECT"),
            Self::NoHooksFound => write!(f, "NO_HOOKS_FOUND"),
            Self::InvalidNamespace => write!(f, "INVALID_NAMESPACE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
        }
    }
}

/// The error returned by every registry operation.
///
/// Carries the offending plugin name (when known) and the project name of
/// the manager that raised it, so errors collected during a discovery pass
/// can be filtered afterwards.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct PluginError {
    /// The category of error.
    pub kind: PluginErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Canonical name of the plugin involved, if any.
    pub plugin_name: Option<String>,
    /// Project name of the manager that raised the error.
    pub manager: Option<String>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<ErrorSource>,
}

impl PluginError {
    /// Create a new plugin error.
    pub fn new(kind: PluginErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            plugin_name: None,
            manager: None,
            source: None,
        }
    }

    /// Attach the offending plugin name.
    pub fn for_plugin(mut self, plugin_name: impl Into<String>) -> Self {
        self.plugin_name = Some(plugin_name.into());
        self
    }

    /// Attach the project name of the raising manager.
    pub fn in_manager(mut self, manager: impl Into<String>) -> Self {
        self.manager = Some(manager.into());
        self
    }

    /// Attach an underlying cause.
    pub fn with_cause(mut self, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        self.source = Some(Arc::from(cause.into()));
        self
    }

    /// Create an import error.
    pub fn import(message: impl Into<String>) -> Self {
        Self::new(PluginErrorKind::Import, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(PluginErrorKind::Validation, message)
    }

    /// Create an unknown-hook error.
    pub fn unknown_hook(message: impl Into<String>) -> Self {
        Self::new(PluginErrorKind::UnknownHook, message)
    }

    /// Create a registration error.
    pub fn registration(message: impl Into<String>) -> Self {
        Self::new(PluginErrorKind::Registration, message)
    }

    /// Create a duplicate-name error.
    pub fn duplicate_name(message: impl Into<String>) -> Self {
        Self::new(PluginErrorKind::DuplicateName, message)
    }

    /// Create a duplicate-object error.
    pub fn duplicate_object(message: impl Into<String>) -> Self {
        Self::new(PluginErrorKind::DuplicateObject, message)
    }

    /// Create a no-hooks-found error.
    pub fn no_hooks_found(message: impl Into<String>) -> Self {
        Self::new(PluginErrorKind::NoHooksFound, message)
    }

    /// Create an invalid-namespace error.
    pub fn invalid_namespace(message: impl Into<String>) -> Self {
        Self::new(PluginErrorKind::InvalidNamespace, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(PluginErrorKind::Configuration, message)
    }
}

impl From<config::ConfigError> for PluginError {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(format!("Configuration error: {err}")).with_cause(err)
    }
}

/// Errors raised while dispatching a hook call.
///
/// The executor never swallows an implementation error: it is wrapped here
/// and handed to every active wrapper before it reaches the caller.
#[derive(Debug, Error)]
pub enum HookCallError {
    /// The call did not supply an argument an implementation requires.
    #[error("hook '{hook}' call must provide argument '{argument}'")]
    MissingArgument {
        /// Hook name.
        hook: String,
        /// The missing argument name.
        argument: String,
    },
    /// An ordinary implementation returned an error.
    #[error("hook '{hook}' implementation from plugin '{plugin}' failed: {source}")]
    Implementation {
        /// Hook name.
        hook: String,
        /// Owning plugin.
        plugin: String,
        /// The error returned by the implementation.
        #[source]
        source: anyhow::Error,
    },
    /// A wrapper failed before yielding control to the wrapped call.
    #[error("hook '{hook}' wrapper from plugin '{plugin}' failed: {source}")]
    Wrapper {
        /// Hook name.
        hook: String,
        /// Owning plugin.
        plugin: String,
        /// The error returned by the wrapper.
        #[source]
        source: anyhow::Error,
    },
}

impl HookCallError {
    /// Returns the hook name the failed call was made on.
    pub fn hook(&self) -> &str {
        match self {
            Self::MissingArgument { hook, .. }
            | Self::Implementation { hook, .. }
            | Self::Wrapper { hook, .. } => hook,
        }
    }

    /// Returns the plugin whose implementation failed, if any.
    pub fn plugin(&self) -> Option<&str> {
        match self {
            Self::MissingArgument { .. } => None,
            Self::Implementation { plugin, .. } | Self::Wrapper { plugin, .. } => Some(plugin),
        }
    }
}
