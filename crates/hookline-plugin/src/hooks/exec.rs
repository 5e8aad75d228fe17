//! Execution indirection: the single swappable function every hook call is
//! routed through.
//!
//! The default function runs [`multicall`] directly. Monitoring decorates
//! the current function and hands back an undo closure that restores it,
//! so nested monitors unwind in LIFO order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::caller::HookCaller;
use super::definitions::{HookArgs, HookOutcome};
use super::dispatcher::multicall;
use super::implementation::HookImpl;

/// A dispatch function.
pub type HookExecFn =
    dyn Fn(&HookCaller, &[Arc<HookImpl>], &HookArgs) -> HookOutcome + Send + Sync;

/// Restores the dispatch function that was current before monitoring was
/// added.
pub type Undo = Box<dyn FnOnce() + Send + Sync>;

/// Shared handle to the current dispatch function.
///
/// Every [`HookCaller`] of a manager holds a clone, so replacing the
/// function affects all hooks at once.
#[derive(Clone)]
pub struct HookExec {
    current: Arc<RwLock<Arc<HookExecFn>>>,
}

impl HookExec {
    /// Creates an indirection delegating straight to [`multicall`].
    pub fn new() -> Self {
        let direct: Arc<HookExecFn> = Arc::new(
            |caller: &HookCaller, impls: &[Arc<HookImpl>], args: &HookArgs| {
                multicall(caller.name(), impls, args, caller.is_firstresult())
            },
        );
        Self {
            current: Arc::new(RwLock::new(direct)),
        }
    }

    /// Runs `impls` for `caller` through the current dispatch function.
    pub fn execute(
        &self,
        caller: &HookCaller,
        impls: &[Arc<HookImpl>],
        args: &HookArgs,
    ) -> HookOutcome {
        let exec = self.current();
        exec(caller, impls, args)
    }

    fn current(&self) -> Arc<HookExecFn> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, exec: Arc<HookExecFn>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = exec;
    }

    /// Decorates the current dispatch function with `before`/`after`
    /// callbacks.
    ///
    /// `before(hook_name, impls, args)` runs ahead of every call;
    /// `after(outcome, hook_name, impls, args)` runs once the call has
    /// produced its outcome, whether it succeeded or failed.
    pub fn add_monitoring<B, A>(&self, before: B, after: A) -> Undo
    where
        B: Fn(&str, &[Arc<HookImpl>], &HookArgs) + Send + Sync + 'static,
        A: Fn(&HookOutcome, &str, &[Arc<HookImpl>], &HookArgs) + Send + Sync + 'static,
    {
        let previous = self.current();
        let inner = previous.clone();
        let monitored: Arc<HookExecFn> = Arc::new(
            move |caller: &HookCaller, impls: &[Arc<HookImpl>], args: &HookArgs| {
                before(caller.name(), impls, args);
                let outcome = inner(caller, impls, args);
                after(&outcome, caller.name(), impls, args);
                outcome
            },
        );
        self.replace(monitored);

        let handle = self.clone();
        Box::new(move || handle.replace(previous))
    }

    /// Emits a `tracing` event before and after every hook call, indented
    /// by call depth.
    pub fn enable_tracing(&self) -> Undo {
        let depth = Arc::new(AtomicUsize::new(0));
        let after_depth = depth.clone();

        self.add_monitoring(
            move |hook_name, impls, args| {
                let indent = depth.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(
                    target: "hookline::hook",
                    hook = %hook_name,
                    indent,
                    implementations = impls.len(),
                    args = ?args,
                    "{}{}",
                    "  ".repeat(indent - 1),
                    hook_name
                );
            },
            move |outcome, hook_name, _impls, _args| {
                let indent = after_depth.load(Ordering::SeqCst);
                if let Ok(result) = outcome.get_result() {
                    debug!(
                        target: "hookline::hook",
                        hook = %hook_name,
                        indent,
                        result = ?result,
                        "{}finish {} -->",
                        "  ".repeat(indent.saturating_sub(1)),
                        hook_name
                    );
                }
                after_depth.fetch_sub(1, Ordering::SeqCst);
            },
        )
    }
}

impl Default for HookExec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookExec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookExec").finish_non_exhaustive()
    }
}
