//! Hook caller: the ordered implementations of one hook name and its single
//! dispatch entry point.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::{debug, warn};

use hookline_core::result::CallResult;

use super::definitions::{HookArgs, HookReturn};
use super::exec::HookExec;
use super::implementation::{HookCallable, HookImpl, HookSpec};
use super::markers::{HookImplOpts, Priority};
use crate::namespace::NamespaceId;

/// Receives results of historic calls.
pub type ResultCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Plugin name given to implementations passed to [`HookCaller::call_extra`].
pub const TEMP_PLUGIN_NAME: &str = "<temp>";

struct HistoricCall {
    args: HookArgs,
    callback: Option<ResultCallback>,
}

/// All implementations of one hook, plus its optional specification.
///
/// Ordinary implementations and wrappers are kept in two lists; both are
/// ordered so that the implementation to run first sits at the back.
pub struct HookCaller {
    name: String,
    spec: Option<HookSpec>,
    nonwrappers: Vec<Arc<HookImpl>>,
    wrappers: Vec<Arc<HookImpl>>,
    history: Mutex<Vec<HistoricCall>>,
    exec: HookExec,
}

impl HookCaller {
    /// Creates an empty caller routed through `exec`.
    pub fn new(name: impl Into<String>, exec: HookExec, spec: Option<HookSpec>) -> Self {
        Self {
            name: name.into(),
            spec,
            nonwrappers: Vec::new(),
            wrappers: Vec::new(),
            history: Mutex::new(Vec::new()),
            exec,
        }
    }

    /// The hook name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound specification, if any.
    pub fn spec(&self) -> Option<&HookSpec> {
        self.spec.as_ref()
    }

    /// Whether a specification is bound.
    pub fn has_spec(&self) -> bool {
        self.spec.is_some()
    }

    /// Whether calls are recorded and replayed to late implementations.
    pub fn is_historic(&self) -> bool {
        self.spec.as_ref().is_some_and(HookSpec::is_historic)
    }

    /// Whether dispatch stops at the first non-null result.
    pub fn is_firstresult(&self) -> bool {
        self.spec.as_ref().is_some_and(HookSpec::is_firstresult)
    }

    /// Binds `spec` to this caller.
    pub fn set_specification(&mut self, spec: HookSpec) {
        self.spec = Some(spec);
    }

    /// All implementations: ordinary ones followed by wrappers.
    pub fn get_hookimpls(&self) -> Vec<Arc<HookImpl>> {
        self.nonwrappers
            .iter()
            .chain(self.wrappers.iter())
            .cloned()
            .collect()
    }

    /// Returns whether an identical implementation is already present.
    pub fn contains(&self, hookimpl: &HookImpl) -> bool {
        self.nonwrappers
            .iter()
            .chain(self.wrappers.iter())
            .any(|existing| existing.same_as(hookimpl))
    }

    /// Returns whether the caller has no implementations.
    pub fn is_empty(&self) -> bool {
        self.nonwrappers.is_empty() && self.wrappers.is_empty()
    }

    /// Adds `hookimpl` at the slot its priority selects.
    pub fn add_hookimpl(&mut self, hookimpl: Arc<HookImpl>) {
        if hookimpl.is_wrapper() {
            insert_wrapper(&mut self.wrappers, hookimpl);
        } else {
            insert_nonwrapper(&mut self.nonwrappers, hookimpl);
        }
    }

    /// Removes every implementation owned by the namespace `owner`.
    ///
    /// Returns the number of implementations removed.
    pub fn remove_plugin(&mut self, owner: NamespaceId) -> usize {
        let before = self.nonwrappers.len() + self.wrappers.len();
        self.nonwrappers.retain(|m| m.namespace_id() != owner);
        self.wrappers.retain(|m| m.namespace_id() != owner);
        before - self.nonwrappers.len() - self.wrappers.len()
    }

    /// Calls every implementation with `args`.
    ///
    /// On a historic hook the call is recorded as well, exactly as
    /// [`call_historic`](Self::call_historic) without a callback.
    pub fn call(&self, args: &HookArgs) -> CallResult<HookReturn> {
        if self.is_historic() {
            return self.call_historic(args, None);
        }
        self.verify_all_args_are_provided(args);
        let impls = self.get_hookimpls();
        self.exec.execute(self, &impls, args).into_result()
    }

    /// Records the call for replay to implementations registered later, then
    /// dispatches it. `callback` receives every non-null result.
    ///
    /// Only historic hooks keep a log; on any other hook the call is
    /// dispatched without being recorded.
    pub fn call_historic(
        &self,
        args: &HookArgs,
        callback: Option<ResultCallback>,
    ) -> CallResult<HookReturn> {
        if self.is_historic() {
            self.history
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(HistoricCall {
                    args: args.clone(),
                    callback: callback.clone(),
                });
        } else {
            debug!(hook = %self.name, "Hook is not historic; call is not recorded");
        }

        self.verify_all_args_are_provided(args);
        let impls = self.get_hookimpls();
        let result = self.exec.execute(self, &impls, args).into_result()?;
        if let Some(callback) = callback {
            result.values().for_each(|value| callback(value));
        }
        Ok(result)
    }

    /// Calls the registered implementations plus `methods`, which take part
    /// in this call only.
    ///
    /// The extra callables are placed as normal-priority implementations
    /// owned by [`TEMP_PLUGIN_NAME`]. The call is never recorded.
    pub fn call_extra(
        &self,
        methods: Vec<HookCallable>,
        args: &HookArgs,
    ) -> CallResult<HookReturn> {
        self.verify_all_args_are_provided(args);
        let mut nonwrappers = self.nonwrappers.clone();
        let mut wrappers = self.wrappers.clone();
        for callable in methods {
            let hookimpl = Arc::new(HookImpl::new(
                self.name.clone(),
                TEMP_PLUGIN_NAME,
                NamespaceId::next(),
                callable,
                HookImplOpts::default(),
            ));
            if hookimpl.is_wrapper() {
                insert_wrapper(&mut wrappers, hookimpl);
            } else {
                insert_nonwrapper(&mut nonwrappers, hookimpl);
            }
        }
        nonwrappers.extend(wrappers);
        self.exec.execute(self, &nonwrappers, args).into_result()
    }

    /// Replays every recorded call to `hookimpl` alone, oldest first.
    ///
    /// Callbacks receive the first non-null result of each replayed call.
    /// Does nothing unless the hook is historic.
    pub fn maybe_apply_history(&self, hookimpl: &Arc<HookImpl>) -> CallResult<()> {
        if !self.is_historic() {
            return Ok(());
        }
        let history: Vec<(HookArgs, Option<ResultCallback>)> = self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|call| (call.args.clone(), call.callback.clone()))
            .collect();

        debug!(
            hook = %self.name,
            plugin = %hookimpl.plugin_name(),
            calls = history.len(),
            "Replaying historic calls"
        );

        let impls = [hookimpl.clone()];
        for (args, callback) in history {
            let result = self.exec.execute(self, &impls, &args).into_result()?;
            if let (Some(callback), Some(first)) = (callback, result.first()) {
                callback(first);
            }
        }
        Ok(())
    }

    /// Number of recorded historic calls.
    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn verify_all_args_are_provided(&self, args: &HookArgs) {
        let Some(spec) = &self.spec else {
            return;
        };
        let missing: Vec<&str> = spec
            .argnames()
            .iter()
            .map(String::as_str)
            .filter(|name| !args.contains(name))
            .collect();
        if !missing.is_empty() {
            warn!(
                hook = %self.name,
                missing = ?missing,
                "Hook called without all declared arguments; implementations may fail"
            );
        }
    }
}

impl fmt::Debug for HookCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookCaller")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .field("nonwrappers", &self.nonwrappers.len())
            .field("wrappers", &self.wrappers.len())
            .finish_non_exhaustive()
    }
}

/// try-last at the front, try-first at the back, and a normal implementation
/// directly after the last entry that is not try-first, so the newest normal
/// implementation runs first among normals.
fn insert_nonwrapper(list: &mut Vec<Arc<HookImpl>>, hookimpl: Arc<HookImpl>) {
    match hookimpl.priority() {
        Priority::TryLast => list.insert(0, hookimpl),
        Priority::TryFirst => list.push(hookimpl),
        Priority::Normal => {
            let at = list
                .iter()
                .rposition(|m| m.priority() != Priority::TryFirst)
                .map_or(0, |i| i + 1);
            list.insert(at, hookimpl);
        }
    }
}

/// Like [`insert_nonwrapper`] except that normal wrappers go in front of the
/// normal ones already present, so the first registered wraps the others.
fn insert_wrapper(list: &mut Vec<Arc<HookImpl>>, hookimpl: Arc<HookImpl>) {
    match hookimpl.priority() {
        Priority::TryLast => list.insert(0, hookimpl),
        Priority::TryFirst => list.push(hookimpl),
        Priority::Normal => {
            let at = list
                .iter()
                .position(|m| m.priority() != Priority::TryLast)
                .unwrap_or(list.len());
            list.insert(at, hookimpl);
        }
    }
}
