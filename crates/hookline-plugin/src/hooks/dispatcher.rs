//! Hook dispatcher: the multicall loop.
//!
//! Implementations are stored with the first to run at the back, so the loop
//! walks the list in reverse:
//! - A wrapper runs its first half immediately and its [`Teardown`] is kept.
//! - An ordinary implementation receives only its declared arguments; a
//!   non-null result is collected, and in first-result mode ends the loop.
//! - The first error ends the loop.
//!
//! Teardowns then run innermost first, each seeing (and able to replace) the
//! outcome of everything it wrapped.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use hookline_core::error::HookCallError;

use super::definitions::{HookArgs, HookOutcome, HookReturn};
use super::implementation::{HookFunction, HookImpl, Teardown};

/// Calls `impls` with `args` and aggregates the results.
pub fn multicall(
    hook_name: &str,
    impls: &[Arc<HookImpl>],
    args: &HookArgs,
    firstresult: bool,
) -> HookOutcome {
    debug!(
        hook = %hook_name,
        implementations = impls.len(),
        firstresult,
        "Dispatching hook"
    );

    let mut results: Vec<Value> = Vec::new();
    let mut teardowns: Vec<Teardown> = Vec::new();
    let mut error: Option<HookCallError> = None;

    for hookimpl in impls.iter().rev() {
        let call_args = match args.select(hookimpl.argnames()) {
            Ok(call_args) => call_args,
            Err(missing) => {
                error = Some(HookCallError::MissingArgument {
                    hook: hook_name.to_string(),
                    argument: missing.to_string(),
                });
                break;
            }
        };

        match hookimpl.function() {
            HookFunction::Wrap(wrapper) => match wrapper(&call_args) {
                Ok(teardown) => teardowns.push(teardown),
                Err(source) => {
                    error = Some(HookCallError::Wrapper {
                        hook: hook_name.to_string(),
                        plugin: hookimpl.plugin_name().to_string(),
                        source,
                    });
                    break;
                }
            },
            HookFunction::Call(function) => match function(&call_args) {
                Ok(Some(value)) if !value.is_null() => {
                    results.push(value);
                    if firstresult {
                        break;
                    }
                }
                Ok(_) => {}
                Err(source) => {
                    error = Some(HookCallError::Implementation {
                        hook: hook_name.to_string(),
                        plugin: hookimpl.plugin_name().to_string(),
                        source,
                    });
                    break;
                }
            },
        }
    }

    let result = match error {
        Some(error) => Err(error),
        None if firstresult => Ok(HookReturn::First(results.into_iter().next())),
        None => Ok(HookReturn::All(results)),
    };

    let mut outcome = HookOutcome::new(result);
    for teardown in teardowns.into_iter().rev() {
        teardown(&mut outcome);
    }
    outcome
}
