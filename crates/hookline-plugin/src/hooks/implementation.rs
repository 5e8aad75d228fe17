//! Hook descriptors: callables, implementations, and specifications.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use serde_json::Value;

use super::definitions::{HookArgs, HookOutcome};
use super::markers::{HookImplOpts, HookSpecOpts, Priority};
use crate::namespace::NamespaceId;

/// Signature of an ordinary implementation.
pub type ImplFn = dyn Fn(&HookArgs) -> anyhow::Result<Option<Value>> + Send + Sync;

/// Signature of a wrapper: runs before the wrapped call and returns the
/// [`Teardown`] that resumes after it.
pub type WrapperFn = dyn Fn(&HookArgs) -> anyhow::Result<Teardown> + Send + Sync;

/// Second half of a wrapper, invoked with the outcome of the wrapped call.
pub type Teardown = Box<dyn FnOnce(&mut HookOutcome) + Send>;

/// Boxes a closure as a [`Teardown`].
pub fn teardown<F>(f: F) -> Teardown
where
    F: FnOnce(&mut HookOutcome) + Send + 'static,
{
    Box::new(f)
}

/// The body of a hook implementation.
#[derive(Clone)]
pub enum HookFunction {
    /// An ordinary implementation.
    Call(Arc<ImplFn>),
    /// A wrapper.
    Wrap(Arc<WrapperFn>),
}

impl HookFunction {
    /// Returns whether this is a wrapper body.
    pub fn is_wrapper(&self) -> bool {
        matches!(self, Self::Wrap(_))
    }

    /// Identity comparison of the underlying closures.
    pub fn same_as(&self, other: &HookFunction) -> bool {
        match (self, other) {
            (Self::Call(a), Self::Call(b)) => Arc::ptr_eq(a, b),
            (Self::Wrap(a), Self::Wrap(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for HookFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call(_) => f.write_str("Call(<fn>)"),
            Self::Wrap(_) => f.write_str("Wrap(<fn>)"),
        }
    }
}

/// A function together with the argument names it accepts and the source
/// location it was defined at.
#[derive(Debug, Clone)]
pub struct HookCallable {
    argnames: Vec<String>,
    function: HookFunction,
    location: &'static Location<'static>,
}

impl HookCallable {
    /// Creates an ordinary callable accepting `argnames`.
    #[track_caller]
    pub fn new<F>(argnames: &[&str], f: F) -> Self
    where
        F: Fn(&HookArgs) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        Self {
            argnames: argnames.iter().map(|s| s.to_string()).collect(),
            function: HookFunction::Call(Arc::new(f)),
            location: Location::caller(),
        }
    }

    /// Creates a wrapper callable accepting `argnames`.
    #[track_caller]
    pub fn wrapper<F>(argnames: &[&str], f: F) -> Self
    where
        F: Fn(&HookArgs) -> anyhow::Result<Teardown> + Send + Sync + 'static,
    {
        Self {
            argnames: argnames.iter().map(|s| s.to_string()).collect(),
            function: HookFunction::Wrap(Arc::new(f)),
            location: Location::caller(),
        }
    }

    /// Declared argument names.
    pub fn argnames(&self) -> &[String] {
        &self.argnames
    }

    /// The function body.
    pub fn function(&self) -> &HookFunction {
        &self.function
    }

    /// Returns whether this is a wrapper.
    pub fn is_wrapper(&self) -> bool {
        self.function.is_wrapper()
    }

    /// Where the callable was defined.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

/// A hook implementation bound to its owning plugin.
#[derive(Debug, Clone)]
pub struct HookImpl {
    hook_name: String,
    plugin_name: String,
    namespace_id: NamespaceId,
    callable: HookCallable,
    opts: HookImplOpts,
}

impl HookImpl {
    /// Creates a descriptor for `callable`, owned by the namespace
    /// `namespace_id` registered as `plugin_name`.
    pub fn new(
        hook_name: impl Into<String>,
        plugin_name: impl Into<String>,
        namespace_id: NamespaceId,
        callable: HookCallable,
        opts: HookImplOpts,
    ) -> Self {
        Self {
            hook_name: hook_name.into(),
            plugin_name: plugin_name.into(),
            namespace_id,
            callable,
            opts,
        }
    }

    /// The hook this implementation is registered under.
    pub fn hook_name(&self) -> &str {
        &self.hook_name
    }

    /// Canonical name of the owning plugin.
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// Identity of the owning namespace.
    pub fn namespace_id(&self) -> NamespaceId {
        self.namespace_id
    }

    /// Declared argument names.
    pub fn argnames(&self) -> &[String] {
        self.callable.argnames()
    }

    /// The function body.
    pub fn function(&self) -> &HookFunction {
        self.callable.function()
    }

    /// Marker options.
    pub fn opts(&self) -> &HookImplOpts {
        &self.opts
    }

    /// Execution slot.
    pub fn priority(&self) -> Priority {
        self.opts.priority
    }

    /// Whether the body is a wrapper.
    pub fn is_wrapper(&self) -> bool {
        self.callable.is_wrapper()
    }

    /// Whether a missing specification is acceptable.
    pub fn is_optional(&self) -> bool {
        self.opts.optionalhook
    }

    /// Where the implementation was defined.
    pub fn location(&self) -> &'static Location<'static> {
        self.callable.location()
    }

    /// Same owner and same function body.
    pub fn same_as(&self, other: &HookImpl) -> bool {
        self.namespace_id == other.namespace_id && self.function().same_as(other.function())
    }
}

/// A declared hook specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookSpec {
    namespace: String,
    name: String,
    argnames: Vec<String>,
    opts: HookSpecOpts,
}

impl HookSpec {
    /// Creates a specification declared by `namespace`.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        argnames: Vec<String>,
        opts: HookSpecOpts,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            argnames,
            opts,
        }
    }

    /// Label of the declaring namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Hook name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted argument names.
    pub fn argnames(&self) -> &[String] {
        &self.argnames
    }

    /// Marker options.
    pub fn opts(&self) -> &HookSpecOpts {
        &self.opts
    }

    /// Whether past calls are replayed to late implementations.
    pub fn is_historic(&self) -> bool {
        self.opts.historic
    }

    /// Whether dispatch stops at the first non-null result.
    pub fn is_firstresult(&self) -> bool {
        self.opts.firstresult
    }

    /// Argument names of `hookimpl` that this specification does not accept.
    pub fn unknown_argnames<'a>(&self, hookimpl: &'a HookImpl) -> Vec<&'a str> {
        hookimpl
            .argnames()
            .iter()
            .filter(|name| !self.argnames.contains(*name))
            .map(String::as_str)
            .collect()
    }
}
