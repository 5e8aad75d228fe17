//! Marker protocol: per-member annotations identifying hook implementations
//! and hook specifications.
//!
//! Markers are bound to a project name. A [`PluginManager`] only picks up
//! members marked for its own project, so one namespace can carry hooks for
//! several hosts.
//!
//! [`PluginManager`]: crate::manager::PluginManager

use serde::{Deserialize, Serialize};

/// Relative execution slot of an implementation among its peers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Middle slot; the most recently registered runs first.
    #[default]
    Normal,
    /// Runs before every normal and try-last implementation.
    TryFirst,
    /// Runs after every other implementation.
    TryLast,
}

/// Options attached to a hook implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookImplOpts {
    /// Hook name override; defaults to the member name.
    pub specname: Option<String>,
    /// Execution slot.
    pub priority: Priority,
    /// Whether the implementation wraps the others.
    pub hookwrapper: bool,
    /// Whether a missing specification is acceptable.
    pub optionalhook: bool,
}

/// Options attached to a hook specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSpecOpts {
    /// Stop at the first non-null result.
    pub firstresult: bool,
    /// Replay every past call to late implementations.
    pub historic: bool,
    /// Warning emitted for every implementation of this hook.
    pub warn_on_impl: Option<String>,
}

/// Implementation annotation bound to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplMark {
    /// Project the mark belongs to.
    pub project: String,
    /// The implementation options.
    pub opts: HookImplOpts,
}

impl ImplMark {
    /// Run before normal implementations.
    pub fn tryfirst(mut self) -> Self {
        self.opts.priority = Priority::TryFirst;
        self
    }

    /// Run after every other implementation.
    pub fn trylast(mut self) -> Self {
        self.opts.priority = Priority::TryLast;
        self
    }

    /// Sets the priority slot.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.opts.priority = priority;
        self
    }

    /// Mark as a wrapper around the ordinary implementations.
    pub fn hookwrapper(mut self) -> Self {
        self.opts.hookwrapper = true;
        self
    }

    /// Tolerate a missing specification.
    pub fn optional(mut self) -> Self {
        self.opts.optionalhook = true;
        self
    }

    /// Implement the hook `name` instead of the member name.
    pub fn specname(mut self, name: impl Into<String>) -> Self {
        self.opts.specname = Some(name.into());
        self
    }
}

/// Specification annotation bound to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMark {
    /// Project the mark belongs to.
    pub project: String,
    /// The specification options.
    pub opts: HookSpecOpts,
}

impl SpecMark {
    /// Stop at the first non-null result.
    pub fn firstresult(mut self) -> Self {
        self.opts.firstresult = true;
        self
    }

    /// Replay past calls to implementations registered later.
    pub fn historic(mut self) -> Self {
        self.opts.historic = true;
        self
    }

    /// Emit `message` as a warning for each implementation.
    pub fn warn_on_impl(mut self, message: impl Into<String>) -> Self {
        self.opts.warn_on_impl = Some(message.into());
        self
    }
}

/// Produces [`ImplMark`]s for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookimplMarker {
    project_name: String,
}

impl HookimplMarker {
    /// Creates a marker for `project_name`.
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
        }
    }

    /// The project this marker belongs to.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// A mark with default options.
    pub fn mark(&self) -> ImplMark {
        self.with_opts(HookImplOpts::default())
    }

    /// A mark with explicit options.
    pub fn with_opts(&self, opts: HookImplOpts) -> ImplMark {
        ImplMark {
            project: self.project_name.clone(),
            opts,
        }
    }
}

/// Produces [`SpecMark`]s for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookspecMarker {
    project_name: String,
}

impl HookspecMarker {
    /// Creates a marker for `project_name`.
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
        }
    }

    /// The project this marker belongs to.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// A mark with default options.
    pub fn mark(&self) -> SpecMark {
        self.with_opts(HookSpecOpts::default())
    }

    /// A mark with explicit options.
    pub fn with_opts(&self, opts: HookSpecOpts) -> SpecMark {
        SpecMark {
            project: self.project_name.clone(),
            opts,
        }
    }
}
