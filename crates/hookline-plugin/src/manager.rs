//! Plugin manager: registration, validation, blocking, and discovery.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::{debug, info, warn};

use hookline_core::config::DiscoveryConfig;
use hookline_core::error::{PluginError, PluginErrorKind};
use hookline_core::result::PluginResult;

use crate::hooks::caller::HookCaller;
use crate::hooks::definitions::{HookArgs, HookOutcome};
use crate::hooks::exec::{HookExec, Undo};
use crate::hooks::implementation::{HookCallable, HookImpl, HookSpec};
use crate::hooks::markers::{HookSpecOpts, HookimplMarker, HookspecMarker};
use crate::hooks::relay::HookRelay;
use crate::loader::{Candidate, DiscoveryReport, PluginSource, SourceKind};
use crate::namespace::Namespace;
use crate::registry::Plugin;

/// Identifies a registered plugin by name or by namespace object.
#[derive(Debug, Clone, Copy)]
pub enum PluginRef<'a> {
    /// Canonical name.
    Name(&'a str),
    /// Namespace identity.
    Namespace(&'a Namespace),
}

impl<'a> From<&'a str> for PluginRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for PluginRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a Namespace> for PluginRef<'a> {
    fn from(namespace: &'a Namespace) -> Self {
        Self::Namespace(namespace)
    }
}

impl<'a> From<&'a Arc<Namespace>> for PluginRef<'a> {
    fn from(namespace: &'a Arc<Namespace>) -> Self {
        Self::Namespace(namespace.as_ref())
    }
}

/// Owns the plugins of one project and the hook callers they feed.
///
/// Every manager has its own execution indirection; monitoring installed on
/// one manager never affects another.
pub struct PluginManager {
    project_name: String,
    impl_marker: HookimplMarker,
    plugins: HashMap<String, Plugin>,
    blocked: HashSet<String>,
    hook: HookRelay,
    hookexec: HookExec,
    sources: Vec<Box<dyn PluginSource>>,
    discovery: DiscoveryConfig,
    errors: Vec<PluginError>,
}

impl PluginManager {
    /// Creates a manager for `project_name` with every discovery phase
    /// enabled.
    pub fn new(project_name: impl Into<String>) -> Self {
        Self::with_config(project_name, DiscoveryConfig::default())
    }

    /// Creates a manager with explicit discovery toggles.
    pub fn with_config(project_name: impl Into<String>, discovery: DiscoveryConfig) -> Self {
        let project_name = project_name.into();
        Self {
            impl_marker: HookimplMarker::new(project_name.clone()),
            project_name,
            plugins: HashMap::new(),
            blocked: HashSet::new(),
            hook: HookRelay::new(),
            hookexec: HookExec::new(),
            sources: Vec::new(),
            discovery,
            errors: Vec::new(),
        }
    }

    /// Creates a manager reading the discovery toggles from `HOOKLINE_*`
    /// environment variables.
    pub fn from_env(project_name: impl Into<String>) -> PluginResult<Self> {
        Ok(Self::with_config(project_name, DiscoveryConfig::from_env()?))
    }

    /// The project whose markers this manager recognises.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// The discovery toggles in effect.
    pub fn discovery_config(&self) -> &DiscoveryConfig {
        &self.discovery
    }

    fn tag(&self, err: PluginError) -> PluginError {
        err.in_manager(&self.project_name)
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Registers `namespace` and returns its canonical name.
    ///
    /// The name is `name`, else the namespace's declared name, else one
    /// derived from its identity. Returns `Ok(None)` if the name is blocked.
    /// Every implementation is validated, and historic calls are replayed to
    /// it, before anything is committed: on error the manager is unchanged.
    ///
    /// Replay itself is not undone. If a namespace has several historic
    /// implementations and a later one fails its replay, the earlier ones
    /// (and their result callbacks) have already run, and will run again
    /// when the namespace is registered anew.
    pub fn register(
        &mut self,
        namespace: Arc<Namespace>,
        name: Option<&str>,
    ) -> PluginResult<Option<String>> {
        let plugin_name = name.map_or_else(|| namespace.label(), str::to_string);

        if self.blocked.contains(&plugin_name) {
            debug!(plugin = %plugin_name, "Plugin is blocked; not registering");
            return Ok(None);
        }
        if self.plugins.contains_key(&plugin_name) {
            return Err(self.tag(
                PluginError::duplicate_name(format!(
                    "Plugin name already registered: {plugin_name}"
                ))
                .for_plugin(&plugin_name),
            ));
        }
        if let Some(existing) = self
            .plugins
            .values()
            .find(|p| p.namespace_id() == namespace.id())
        {
            return Err(self.tag(
                PluginError::duplicate_object(format!(
                    "Plugin object already registered as {:?}",
                    existing.name()
                ))
                .for_plugin(&plugin_name),
            ));
        }

        let mut hookimpls: Vec<Arc<HookImpl>> = Vec::new();
        for member in namespace.implementations(&self.project_name) {
            let hookimpl = Arc::new(HookImpl::new(
                member.hook_name,
                plugin_name.as_str(),
                namespace.id(),
                member.callable.clone(),
                member.mark.opts.clone(),
            ));
            self.validate_hookimpl(member.member, &hookimpl, &hookimpls)?;
            hookimpls.push(hookimpl);
        }

        for hookimpl in &hookimpls {
            let Some(caller) = self.hook.get(hookimpl.hook_name()) else {
                continue;
            };
            caller.maybe_apply_history(hookimpl).map_err(|cause| {
                self.tag(
                    PluginError::registration(format!(
                        "Replaying historic calls of hook {:?} to plugin {plugin_name:?} failed",
                        hookimpl.hook_name()
                    ))
                    .for_plugin(&plugin_name)
                    .with_cause(cause),
                )
            })?;
        }

        let mut hook_names: Vec<String> = Vec::new();
        for hookimpl in hookimpls {
            let hook_name = hookimpl.hook_name().to_string();
            self.hook
                .get_or_create(&hook_name, &self.hookexec)
                .add_hookimpl(hookimpl);
            if !hook_names.contains(&hook_name) {
                hook_names.push(hook_name);
            }
        }

        info!(
            plugin = %plugin_name,
            hooks = ?hook_names,
            "Plugin registered"
        );
        self.plugins.insert(
            plugin_name.clone(),
            Plugin::new(plugin_name.clone(), namespace, hook_names),
        );
        Ok(Some(plugin_name))
    }

    /// Registers a `hook name → callable` mapping as a namespace.
    ///
    /// Keys must be identifiers.
    pub fn register_map<I, K>(&mut self, map: I, name: Option<&str>) -> PluginResult<Option<String>>
    where
        I: IntoIterator<Item = (K, HookCallable)>,
        K: Into<String>,
    {
        let namespace = Namespace::from_map(name, map, self.impl_marker.mark())
            .map_err(|err| self.tag(err))?;
        self.register(Arc::new(namespace), name)
    }

    fn validate_hookimpl(
        &self,
        member: &str,
        hookimpl: &Arc<HookImpl>,
        pending: &[Arc<HookImpl>],
    ) -> PluginResult<()> {
        let plugin = hookimpl.plugin_name();
        if hookimpl.opts().hookwrapper != hookimpl.is_wrapper() {
            let reason = if hookimpl.is_wrapper() {
                "provides a wrapper function but is not marked as hookwrapper"
            } else {
                "is marked as hookwrapper but does not provide a wrapper function"
            };
            return Err(self.tag(
                PluginError::validation(format!(
                    "Plugin {plugin:?} member {member:?} {reason}"
                ))
                .for_plugin(plugin),
            ));
        }

        let caller = self.hook.get(hookimpl.hook_name());
        let duplicate = pending
            .iter()
            .any(|other| other.hook_name() == hookimpl.hook_name() && other.same_as(hookimpl))
            || caller.is_some_and(|c| c.contains(hookimpl));
        if duplicate {
            return Err(self.tag(
                PluginError::validation(format!(
                    "Plugin {plugin:?} implements hook {:?} twice with the same function",
                    hookimpl.hook_name()
                ))
                .for_plugin(plugin),
            ));
        }

        if let Some(spec) = caller.and_then(HookCaller::spec) {
            verify_hook(spec, hookimpl).map_err(|err| self.tag(err))?;
        }
        Ok(())
    }

    /// Binds the specifications declared in `namespace`.
    ///
    /// Callers are created for new hook names; existing callers get the
    /// specification late, after every implementation they already hold has
    /// been validated against it. Any violation fails the whole call and
    /// nothing is bound.
    pub fn add_hookspecs(&mut self, namespace: &Namespace) -> PluginResult<()> {
        let label = namespace.label();
        let specs: Vec<HookSpec> = namespace
            .specifications(&self.project_name)
            .map(|m| {
                HookSpec::new(
                    label.as_str(),
                    m.hook_name,
                    m.argnames.to_vec(),
                    m.mark.opts.clone(),
                )
            })
            .collect();

        if specs.is_empty() {
            return Err(self.tag(PluginError::no_hooks_found(format!(
                "did not find any {:?} hooks in {label:?}",
                self.project_name
            ))));
        }

        for spec in &specs {
            if spec.is_historic() && spec.is_firstresult() {
                return Err(self.tag(PluginError::validation(format!(
                    "hook {:?} cannot be both historic and firstresult",
                    spec.name()
                ))));
            }
            let Some(caller) = self.hook.get(spec.name()) else {
                continue;
            };
            if let Some(existing) = caller.spec() {
                return Err(self.tag(PluginError::validation(format!(
                    "hook {:?} already has a specification from {:?}",
                    spec.name(),
                    existing.namespace()
                ))));
            }
            for hookimpl in caller.get_hookimpls() {
                verify_hook(spec, &hookimpl).map_err(|err| self.tag(err))?;
            }
        }

        let names: Vec<String> = specs.iter().map(|s| s.name().to_string()).collect();
        for spec in specs {
            match self.hook.get_mut(spec.name()) {
                Some(caller) => caller.set_specification(spec),
                None => self.hook.insert_with_spec(spec, &self.hookexec),
            }
        }
        info!(source = %label, hooks = ?names, "Hook specifications added");
        Ok(())
    }

    /// Binds one specification per entry of a `hook name → argument names`
    /// mapping, all with `opts`.
    pub fn add_hookspecs_map<'a, I, K>(
        &mut self,
        name: &str,
        map: I,
        opts: HookSpecOpts,
    ) -> PluginResult<()>
    where
        I: IntoIterator<Item = (K, &'a [&'a str])>,
        K: Into<String>,
    {
        let mark = HookspecMarker::new(self.project_name.clone()).with_opts(opts);
        let namespace =
            Namespace::specs_from_map(name, map, mark).map_err(|err| self.tag(err))?;
        self.add_hookspecs(&namespace)
    }

    /// Removes a plugin and every implementation it contributed.
    ///
    /// Returns the removed record, or `None` (with a warning) if the plugin
    /// is not registered. Callers stay in place, even when left empty.
    pub fn unregister<'a>(&mut self, plugin: impl Into<PluginRef<'a>>) -> Option<Plugin> {
        let plugin = plugin.into();
        let Some(name) = self.resolve(plugin).map(str::to_string) else {
            warn!(plugin = ?plugin, "Cannot unregister a plugin that is not registered");
            return None;
        };
        let record = self.plugins.remove(&name)?;
        for hook_name in record.hook_names() {
            if let Some(caller) = self.hook.get_mut(hook_name) {
                caller.remove_plugin(record.namespace_id());
            }
        }
        info!(plugin = %name, "Plugin unregistered");
        Some(record)
    }

    /// Blocks (or unblocks) registrations under `name`.
    ///
    /// Blocking also unregisters the plugin currently registered under it.
    pub fn set_blocked(&mut self, name: &str, blocked: bool) {
        if blocked {
            self.blocked.insert(name.to_string());
            if self.plugins.contains_key(name) {
                self.unregister(name);
            }
            debug!(plugin = %name, "Plugin name blocked");
        } else if self.blocked.remove(name) {
            debug!(plugin = %name, "Plugin name unblocked");
        }
    }

    /// Fails with [`PluginErrorKind::UnknownHook`] if any non-optional
    /// implementation names a hook that has no specification.
    pub fn check_pending(&self) -> PluginResult<()> {
        for (name, caller) in self.hook.items() {
            if caller.has_spec() {
                continue;
            }
            if let Some(hookimpl) = caller.get_hookimpls().iter().find(|m| !m.is_optional()) {
                return Err(self.tag(
                    PluginError::unknown_hook(format!(
                        "unknown hook {name:?} in plugin {:?}",
                        hookimpl.plugin_name()
                    ))
                    .for_plugin(hookimpl.plugin_name()),
                ));
            }
        }
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    fn resolve(&self, plugin: PluginRef<'_>) -> Option<&str> {
        match plugin {
            PluginRef::Name(name) => self
                .plugins
                .get_key_value(name)
                .map(|(name, _)| name.as_str()),
            PluginRef::Namespace(namespace) => self.get_name(namespace),
        }
    }

    /// Whether the plugin is registered.
    pub fn is_registered<'a>(&self, plugin: impl Into<PluginRef<'a>>) -> bool {
        self.resolve(plugin.into()).is_some()
    }

    /// Whether registrations under `name` are blocked.
    pub fn is_blocked(&self, name: &str) -> bool {
        self.blocked.contains(name)
    }

    /// Whether a plugin is registered under `name`.
    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// The namespace registered under `name`.
    pub fn get_plugin(&self, name: &str) -> Option<&Arc<Namespace>> {
        self.plugins.get(name).map(Plugin::namespace)
    }

    /// The name `namespace` is registered under.
    pub fn get_name(&self, namespace: &Namespace) -> Option<&str> {
        self.plugins
            .values()
            .find(|p| p.namespace_id() == namespace.id())
            .map(Plugin::name)
    }

    /// The name `namespace` would be registered under by default.
    pub fn get_canonical_name(&self, namespace: &Namespace) -> String {
        namespace.label()
    }

    /// Registered plugin records, in no particular order.
    pub fn plugins(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.values()
    }

    /// `(name, namespace)` pairs sorted by name.
    pub fn list_name_plugin(&self) -> Vec<(&str, &Arc<Namespace>)> {
        let mut pairs: Vec<(&str, &Arc<Namespace>)> = self
            .plugins
            .values()
            .map(|p| (p.name(), p.namespace()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }

    /// Callers the plugin has implementations in, or `None` if it is not
    /// registered.
    pub fn get_hookcallers<'a>(&self, plugin: impl Into<PluginRef<'a>>) -> Option<Vec<&HookCaller>> {
        let name = self.resolve(plugin.into())?;
        let record = self.plugins.get(name)?;
        Some(
            record
                .hook_names()
                .iter()
                .filter_map(|hook_name| self.hook.get(hook_name))
                .collect(),
        )
    }

    /// All callers. Does not trigger discovery.
    pub fn hooks(&self) -> &HookRelay {
        &self.hook
    }

    /// Looks up a caller, running discovery first if it has not run yet.
    pub fn hook(&mut self, name: &str) -> Option<&HookCaller> {
        if self.hook.needs_discovery() {
            if let Err(err) = self.discover(true) {
                warn!(error = %err, "Lazy plugin discovery failed");
            }
        }
        self.hook.get(name)
    }

    /// Suspends lazy discovery until the returned guard is dropped.
    pub fn discovery_blocked(&mut self) -> DiscoveryGuard<'_> {
        let previous = self.hook.needs_discovery();
        self.hook.set_needs_discovery(false);
        DiscoveryGuard {
            manager: self,
            previous,
        }
    }

    // ── Monitoring ───────────────────────────────────────────────────

    /// Wraps every hook call of this manager with `before` and `after`.
    ///
    /// Returns the closure that removes the monitoring again.
    pub fn add_hookcall_monitoring<B, A>(&self, before: B, after: A) -> Undo
    where
        B: Fn(&str, &[Arc<HookImpl>], &HookArgs) + Send + Sync + 'static,
        A: Fn(&HookOutcome, &str, &[Arc<HookImpl>], &HookArgs) + Send + Sync + 'static,
    {
        self.hookexec.add_monitoring(before, after)
    }

    /// Emits a `tracing` event around every hook call of this manager.
    pub fn enable_tracing(&self) -> Undo {
        self.hookexec.enable_tracing()
    }

    // ── Discovery ────────────────────────────────────────────────────

    /// Adds a source of plugin candidates.
    pub fn add_source(&mut self, source: impl PluginSource + 'static) {
        self.sources.push(Box::new(source));
    }

    /// Loads and registers plugins from every source: entry-point sources
    /// first, then prefix sources.
    ///
    /// Names already registered or blocked are skipped. A failing candidate
    /// is blocked and its error logged; with `ignore_errors` discovery
    /// continues and the error is reported, otherwise it is returned.
    pub fn discover(&mut self, ignore_errors: bool) -> PluginResult<DiscoveryReport> {
        self.hook.set_needs_discovery(false);
        if self.discovery.disable_plugins {
            warn!("Plugin discovery disabled by HOOKLINE_DISABLE_PLUGINS");
            return Ok(DiscoveryReport::default());
        }

        let mut report = DiscoveryReport::default();
        for kind in [SourceKind::EntryPoint, SourceKind::Prefix] {
            if self.phase_disabled(kind) {
                debug!(kind = %kind, "Discovery phase disabled");
                continue;
            }
            report.merge(self.load_from(kind, ignore_errors)?);
        }

        if report.count > 0 {
            let names: Vec<&str> = self.list_name_plugin().into_iter().map(|(n, _)| n).collect();
            info!(count = report.count, plugins = ?names, "Loaded plugins");
        }
        Ok(report)
    }

    fn phase_disabled(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::EntryPoint => self.discovery.disable_entrypoint_plugins,
            SourceKind::Prefix => self.discovery.disable_prefix_plugins,
        }
    }

    fn load_from(&mut self, kind: SourceKind, ignore_errors: bool) -> PluginResult<DiscoveryReport> {
        let candidates: Vec<Candidate> = self
            .sources
            .iter()
            .filter(|source| source.kind() == kind)
            .flat_map(|source| source.candidates())
            .collect();

        let mut report = DiscoveryReport::default();
        for candidate in candidates {
            if self.has_plugin(&candidate.name) || self.is_blocked(&candidate.name) {
                continue;
            }
            let name = candidate.name.clone();
            match self.load_and_register(candidate) {
                Ok(Some(_)) => report.count += 1,
                Ok(None) => {}
                Err(err) => {
                    warn!(plugin = %name, error = %err, "Plugin failed to load");
                    self.errors.push(err.clone());
                    self.set_blocked(&name, true);
                    if !ignore_errors {
                        return Err(err);
                    }
                    report.errors.push(err);
                }
            }
        }
        Ok(report)
    }

    fn load_and_register(&mut self, candidate: Candidate) -> PluginResult<Option<String>> {
        let Candidate {
            name,
            origin,
            loader,
        } = candidate;
        let namespace = loader().map_err(|cause| {
            self.tag(
                PluginError::import(format!("Error while importing module {origin}"))
                    .for_plugin(&name)
                    .with_cause(cause),
            )
        })?;
        if self.is_registered(&namespace) {
            return Ok(None);
        }
        self.register(namespace, Some(&name))
    }

    // ── Error log ────────────────────────────────────────────────────

    /// Every error collected by discovery, oldest first.
    pub fn errors(&self) -> &[PluginError] {
        &self.errors
    }

    /// Collected errors, optionally filtered by plugin name and kind.
    pub fn get_errors(
        &self,
        plugin_name: Option<&str>,
        kind: Option<PluginErrorKind>,
    ) -> Vec<&PluginError> {
        self.errors
            .iter()
            .filter(|e| plugin_name.is_none_or(|name| e.plugin_name.as_deref() == Some(name)))
            .filter(|e| kind.is_none_or(|kind| e.kind == kind))
            .collect()
    }
}

impl fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager")
            .field("project_name", &self.project_name)
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .field("blocked", &self.blocked)
            .field("hooks", &self.hook.len())
            .field("sources", &self.sources.len())
            .field("discovery", &self.discovery)
            .finish_non_exhaustive()
    }
}

/// Checks `hookimpl` against `spec`.
fn verify_hook(spec: &HookSpec, hookimpl: &HookImpl) -> PluginResult<()> {
    let plugin = hookimpl.plugin_name();
    let hook = spec.name();

    if spec.is_historic() && hookimpl.is_wrapper() {
        return Err(PluginError::validation(format!(
            "Plugin {plugin:?}\nhook {hook:?}\nhistoric incompatible to hookwrapper"
        ))
        .for_plugin(plugin));
    }

    if let Some(message) = &spec.opts().warn_on_impl {
        let location = hookimpl.location();
        warn!(
            hook = %hook,
            plugin = %plugin,
            file = location.file(),
            line = location.line(),
            "{message}"
        );
    }

    let unknown = spec.unknown_argnames(hookimpl);
    if !unknown.is_empty() {
        return Err(PluginError::validation(format!(
            "Plugin {plugin:?} for hook {hook:?}\nhookimpl definition: {hook}({})\n\
             Argument(s) {unknown:?} are declared in the hookimpl but can not be found \
             in the hookspec",
            hookimpl.argnames().join(", ")
        ))
        .for_plugin(plugin));
    }
    Ok(())
}

/// Suspends lazy discovery for its lifetime.
///
/// Dereferences to the manager; dropping it restores the previous flag.
pub struct DiscoveryGuard<'a> {
    manager: &'a mut PluginManager,
    previous: bool,
}

impl Deref for DiscoveryGuard<'_> {
    type Target = PluginManager;

    fn deref(&self) -> &PluginManager {
        self.manager
    }
}

impl DerefMut for DiscoveryGuard<'_> {
    fn deref_mut(&mut self) -> &mut PluginManager {
        self.manager
    }
}

impl Drop for DiscoveryGuard<'_> {
    fn drop(&mut self) {
        self.manager.hook.set_needs_discovery(self.previous);
    }
}
