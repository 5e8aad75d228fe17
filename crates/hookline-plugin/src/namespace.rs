//! Namespaces: explicit registration tables of named members.
//!
//! A namespace is the unit a plugin registers. Each member is either a plain
//! function, a hook implementation, or a hook specification, carrying a
//! marker bound to a project name. Members are kept in name order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use hookline_core::error::PluginError;
use hookline_core::result::PluginResult;

use crate::hooks::implementation::HookCallable;
use crate::hooks::markers::{ImplMark, SpecMark};

static NEXT_NAMESPACE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a namespace object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(u64);

impl NamespaceId {
    /// Allocates a fresh identity.
    pub fn next() -> Self {
        Self(NEXT_NAMESPACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
enum Member {
    Function(HookCallable),
    Implementation { mark: ImplMark, callable: HookCallable },
    Specification { mark: SpecMark, argnames: Vec<String> },
}

/// An implementation member as seen by a manager.
#[derive(Debug, Clone, Copy)]
pub struct ImplMember<'a> {
    /// Member name.
    pub member: &'a str,
    /// Hook name (the specname override, else the member name).
    pub hook_name: &'a str,
    /// The mark.
    pub mark: &'a ImplMark,
    /// The callable.
    pub callable: &'a HookCallable,
}

/// A specification member as seen by a manager.
#[derive(Debug, Clone, Copy)]
pub struct SpecMember<'a> {
    /// Hook name.
    pub hook_name: &'a str,
    /// The mark.
    pub mark: &'a SpecMark,
    /// Accepted argument names.
    pub argnames: &'a [String],
}

/// A registrable table of named members.
///
/// Namespaces are compared by identity: two namespaces built from the same
/// members are still distinct objects.
pub struct Namespace {
    id: NamespaceId,
    name: Option<String>,
    members: BTreeMap<String, Member>,
}

impl Namespace {
    /// Creates an empty namespace declaring `name` as its plugin name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NamespaceId::next(),
            name: Some(name.into()),
            members: BTreeMap::new(),
        }
    }

    /// Creates an empty namespace without declared name.
    pub fn anonymous() -> Self {
        Self {
            id: NamespaceId::next(),
            name: None,
            members: BTreeMap::new(),
        }
    }

    /// Builds a namespace where every entry of `map` implements the hook
    /// named by its key.
    ///
    /// Keys must be identifiers.
    pub fn from_map<I, K>(name: Option<&str>, map: I, mark: ImplMark) -> PluginResult<Self>
    where
        I: IntoIterator<Item = (K, HookCallable)>,
        K: Into<String>,
    {
        let entries: Vec<(String, HookCallable)> =
            map.into_iter().map(|(k, v)| (k.into(), v)).collect();
        check_identifiers(entries.iter().map(|(k, _)| k.as_str()))?;

        let mut namespace = match name {
            Some(name) => Self::new(name),
            None => Self::anonymous(),
        };
        for (key, callable) in entries {
            let mark = mark.clone().specname(key.clone());
            namespace = namespace.hookimpl(key, mark, callable);
        }
        Ok(namespace)
    }

    /// Builds a namespace where every entry of `map` declares a
    /// specification accepting the listed argument names.
    pub fn specs_from_map<'a, I, K>(name: &str, map: I, mark: SpecMark) -> PluginResult<Self>
    where
        I: IntoIterator<Item = (K, &'a [&'a str])>,
        K: Into<String>,
    {
        let entries: Vec<(String, &[&str])> =
            map.into_iter().map(|(k, v)| (k.into(), v)).collect();
        check_identifiers(entries.iter().map(|(k, _)| k.as_str()))?;

        let mut namespace = Self::new(name);
        for (key, argnames) in entries {
            namespace = namespace.hookspec(key, mark.clone(), argnames);
        }
        Ok(namespace)
    }

    /// Adds an unmarked member.
    pub fn function(mut self, member: impl Into<String>, callable: HookCallable) -> Self {
        self.members.insert(member.into(), Member::Function(callable));
        self
    }

    /// Adds a hook implementation member.
    pub fn hookimpl(
        mut self,
        member: impl Into<String>,
        mark: ImplMark,
        callable: HookCallable,
    ) -> Self {
        self.members
            .insert(member.into(), Member::Implementation { mark, callable });
        self
    }

    /// Adds a hook wrapper member; the mark is flagged as a wrapper.
    pub fn hookwrapper(
        self,
        member: impl Into<String>,
        mark: ImplMark,
        callable: HookCallable,
    ) -> Self {
        self.hookimpl(member, mark.hookwrapper(), callable)
    }

    /// Adds a hook specification member.
    pub fn hookspec(mut self, member: impl Into<String>, mark: SpecMark, argnames: &[&str]) -> Self {
        let argnames = argnames.iter().map(|s| s.to_string()).collect();
        self.members
            .insert(member.into(), Member::Specification { mark, argnames });
        self
    }

    /// Identity of this namespace.
    pub fn id(&self) -> NamespaceId {
        self.id
    }

    /// Declared plugin name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared name, or a name derived from the identity.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("namespace-{}", self.id))
    }

    /// Member names in iteration order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the namespace has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Implementation members marked for `project`.
    pub fn implementations<'a>(&'a self, project: &'a str) -> impl Iterator<Item = ImplMember<'a>> {
        self.members.iter().filter_map(move |(member, m)| match m {
            Member::Implementation { mark, callable } if mark.project == project => {
                Some(ImplMember {
                    member,
                    hook_name: mark.opts.specname.as_deref().unwrap_or(member),
                    mark,
                    callable,
                })
            }
            _ => None,
        })
    }

    /// Unmarked members. These never take part in hook dispatch.
    pub fn functions(&self) -> impl Iterator<Item = (&str, &HookCallable)> {
        self.members.iter().filter_map(|(member, m)| match m {
            Member::Function(callable) => Some((member.as_str(), callable)),
            _ => None,
        })
    }

    /// Specification members marked for `project`.
    pub fn specifications<'a>(&'a self, project: &'a str) -> impl Iterator<Item = SpecMember<'a>> {
        self.members.iter().filter_map(move |(member, m)| match m {
            Member::Specification { mark, argnames } if mark.project == project => {
                Some(SpecMember {
                    hook_name: member,
                    mark,
                    argnames,
                })
            }
            _ => None,
        })
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn check_identifiers<'a>(keys: impl Iterator<Item = &'a str>) -> PluginResult<()> {
    let bad: Vec<&str> = keys.filter(|k| !is_identifier(k)).collect();
    if bad.is_empty() {
        Ok(())
    } else {
        Err(PluginError::invalid_namespace(format!(
            "mapping contained invalid identifiers: {}",
            bad.join(", ")
        )))
    }
}
