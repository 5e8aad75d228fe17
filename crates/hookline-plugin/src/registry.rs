//! Plugin records kept by a manager.

use std::sync::Arc;

use crate::namespace::{Namespace, NamespaceId};

/// A registered namespace under its canonical name.
///
/// `hook_names` lists the callers the plugin has implementations in, so
/// unregistration only touches those.
#[derive(Debug, Clone)]
pub struct Plugin {
    name: String,
    namespace: Arc<Namespace>,
    hook_names: Vec<String>,
}

impl Plugin {
    pub(crate) fn new(name: String, namespace: Arc<Namespace>, hook_names: Vec<String>) -> Self {
        Self {
            name,
            namespace,
            hook_names,
        }
    }

    /// The name the plugin was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registered namespace.
    pub fn namespace(&self) -> &Arc<Namespace> {
        &self.namespace
    }

    /// Identity of the registered namespace.
    pub fn namespace_id(&self) -> NamespaceId {
        self.namespace.id()
    }

    /// Hooks this plugin implements.
    pub fn hook_names(&self) -> &[String] {
        &self.hook_names
    }
}
