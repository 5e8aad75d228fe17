//! Plugin discovery sources.
//!
//! A [`PluginSource`] enumerates candidates: a name, an origin used in error
//! messages, and a deferred loader producing the namespace. Sources come in
//! two kinds mirroring the two discovery phases of a manager. Entry-point
//! sources run first, then prefix sources.

use std::fmt;
use std::sync::Arc;

use hookline_core::error::PluginError;

use crate::namespace::Namespace;

/// Loader of a candidate namespace.
pub type LoadFn = Box<dyn FnOnce() -> anyhow::Result<Arc<Namespace>> + Send>;

/// Which discovery phase a source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Declared package metadata.
    EntryPoint,
    /// Naming-convention scan.
    Prefix,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntryPoint => write!(f, "entry_point"),
            Self::Prefix => write!(f, "prefix"),
        }
    }
}

/// One discoverable plugin.
pub struct Candidate {
    /// Name to register the plugin under.
    pub name: String,
    /// Where the namespace comes from.
    pub origin: String,
    /// Produces the namespace; only called if the name is neither
    /// registered nor blocked.
    pub loader: LoadFn,
}

impl Candidate {
    /// Creates a candidate.
    pub fn new<F>(name: impl Into<String>, origin: impl Into<String>, loader: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<Arc<Namespace>> + Send + 'static,
    {
        Self {
            name: name.into(),
            origin: origin.into(),
            loader: Box::new(loader),
        }
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Something that enumerates plugin candidates.
pub trait PluginSource: Send + Sync {
    /// The discovery phase this source takes part in.
    fn kind(&self) -> SourceKind;

    /// Human-readable label for logs.
    fn label(&self) -> &str;

    /// Candidates in discovery order.
    fn candidates(&self) -> Vec<Candidate>;
}

type Factory = Arc<dyn Fn() -> anyhow::Result<Arc<Namespace>> + Send + Sync>;

/// A source over a fixed list of candidates.
///
/// Hosts that link their plugins statically use this to feed them through
/// the regular discovery pass.
pub struct StaticSource {
    kind: SourceKind,
    label: String,
    entries: Vec<(String, String, Factory)>,
}

impl StaticSource {
    /// An entry-point source labelled `group`.
    pub fn entry_points(group: impl Into<String>) -> Self {
        Self::new(SourceKind::EntryPoint, group)
    }

    /// A prefix source labelled `prefix`.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::new(SourceKind::Prefix, prefix)
    }

    fn new(kind: SourceKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            entries: Vec::new(),
        }
    }

    /// Adds an already built namespace.
    pub fn namespace(self, name: impl Into<String>, namespace: Arc<Namespace>) -> Self {
        let origin = format!("{}:{}", self.label, namespace.label());
        self.loader(name, origin, move || Ok(namespace.clone()))
    }

    /// Adds a candidate loaded by `f` on every discovery pass.
    pub fn loader<F>(mut self, name: impl Into<String>, origin: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<Namespace>> + Send + Sync + 'static,
    {
        self.entries.push((name.into(), origin.into(), Arc::new(f)));
        self
    }
}

impl PluginSource for StaticSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn candidates(&self) -> Vec<Candidate> {
        self.entries
            .iter()
            .map(|(name, origin, factory)| {
                let factory = factory.clone();
                Candidate::new(name.clone(), origin.clone(), move || factory())
            })
            .collect()
    }
}

impl fmt::Debug for StaticSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSource")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("candidates", &self.entries.len())
            .finish()
    }
}

/// Outcome of a discovery pass.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Number of plugins registered by the pass.
    pub count: usize,
    /// Errors collected while discovery continued past them.
    pub errors: Vec<PluginError>,
}

impl DiscoveryReport {
    pub(crate) fn merge(&mut self, other: DiscoveryReport) {
        self.count += other.count;
        self.errors.extend(other.errors);
    }
}
