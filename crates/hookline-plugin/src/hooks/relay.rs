//! Hook relay: the explicit hook-name → caller map of a manager.

use std::collections::BTreeMap;

use super::caller::HookCaller;
use super::exec::HookExec;
use super::implementation::HookSpec;

/// Callers by hook name, plus the lazy-discovery flag.
#[derive(Debug)]
pub struct HookRelay {
    callers: BTreeMap<String, HookCaller>,
    needs_discovery: bool,
}

impl HookRelay {
    /// Creates an empty relay that still needs discovery.
    pub fn new() -> Self {
        Self {
            callers: BTreeMap::new(),
            needs_discovery: true,
        }
    }

    /// Looks up the caller for `name`.
    pub fn get(&self, name: &str) -> Option<&HookCaller> {
        self.callers.get(name)
    }

    /// Whether a caller exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.callers.contains_key(name)
    }

    /// Hook names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.callers.keys().map(String::as_str)
    }

    /// `(name, caller)` pairs in name order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &HookCaller)> {
        self.callers.iter().map(|(name, caller)| (name.as_str(), caller))
    }

    /// Number of callers.
    pub fn len(&self) -> usize {
        self.callers.len()
    }

    /// Whether no caller exists.
    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }

    /// Whether the next guarded lookup runs discovery first.
    pub fn needs_discovery(&self) -> bool {
        self.needs_discovery
    }

    pub(crate) fn set_needs_discovery(&mut self, value: bool) {
        self.needs_discovery = value;
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut HookCaller> {
        self.callers.get_mut(name)
    }

    pub(crate) fn get_or_create(&mut self, name: &str, exec: &HookExec) -> &mut HookCaller {
        self.callers
            .entry(name.to_string())
            .or_insert_with(|| HookCaller::new(name, exec.clone(), None))
    }

    pub(crate) fn insert_with_spec(&mut self, spec: HookSpec, exec: &HookExec) {
        let name = spec.name().to_string();
        self.callers
            .insert(name.clone(), HookCaller::new(name, exec.clone(), Some(spec)));
    }
}

impl Default for HookRelay {
    fn default() -> Self {
        Self::new()
    }
}
