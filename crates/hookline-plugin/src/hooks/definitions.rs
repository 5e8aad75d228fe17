//! Call arguments, aggregated results, and the outcome object handed to
//! wrappers and monitors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hookline_core::error::HookCallError;
use hookline_core::result::CallResult;

/// Keyword arguments of one hook call.
///
/// Each implementation only receives the subset it declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookArgs {
    /// Argument name → value.
    data: BTreeMap<String, Value>,
}

impl HookArgs {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an argument, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Inserts a value and returns `self`.
    pub fn with_data(mut self, key: &str, value: Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    /// Inserts a string value.
    pub fn with_string(self, key: &str, value: &str) -> Self {
        self.with_data(key, Value::from(value))
    }

    /// Inserts an integer value.
    pub fn with_int(self, key: &str, value: i64) -> Self {
        self.with_data(key, Value::from(value))
    }

    /// Inserts a boolean value.
    pub fn with_bool(self, key: &str, value: bool) -> Self {
        self.with_data(key, Value::from(value))
    }

    /// Gets a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Gets a string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    /// Gets an i64 value.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(|v| v.as_i64())
    }

    /// Gets a bool value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(|v| v.as_bool())
    }

    /// Returns whether an argument is present.
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Iterates over the argument names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Projects the arguments onto `argnames`.
    ///
    /// Returns the first missing name as the error.
    pub fn select<'n>(&self, argnames: &'n [String]) -> Result<HookArgs, &'n str> {
        let mut data = BTreeMap::new();
        for name in argnames {
            let value = self.data.get(name).ok_or(name.as_str())?;
            data.insert(name.clone(), value.clone());
        }
        Ok(HookArgs { data })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for HookArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<serde_json::Map<String, Value>> for HookArgs {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// Aggregated result of a hook call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HookReturn {
    /// Every non-null result, in execution order.
    All(Vec<Value>),
    /// The first non-null result of a first-result-only hook.
    First(Option<Value>),
}

impl HookReturn {
    /// Iterates over the collected values.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        let slice: &[Value] = match self {
            Self::All(values) => values,
            Self::First(value) => value.as_slice(),
        };
        slice.iter()
    }

    /// The first collected value.
    pub fn first(&self) -> Option<&Value> {
        self.values().next()
    }

    /// Number of collected values.
    pub fn len(&self) -> usize {
        self.values().count()
    }

    /// Returns whether nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes the return into a list of values.
    pub fn into_vec(self) -> Vec<Value> {
        match self {
            Self::All(values) => values,
            Self::First(value) => value.into_iter().collect(),
        }
    }
}

/// Success-or-error result object of one hook call.
///
/// Wrappers receive it mutably when they resume and may replace the
/// result or the error. Monitors receive it read-only.
#[derive(Debug)]
pub struct HookOutcome {
    /// The result or the error raised by an implementation.
    result: CallResult<HookReturn>,
}

impl HookOutcome {
    /// Wraps a call result.
    pub fn new(result: CallResult<HookReturn>) -> Self {
        Self { result }
    }

    /// Borrows the result, or the error that ended the call.
    pub fn get_result(&self) -> Result<&HookReturn, &HookCallError> {
        self.result.as_ref()
    }

    /// Returns the error, if the call failed.
    pub fn error(&self) -> Option<&HookCallError> {
        self.result.as_ref().err()
    }

    /// Returns whether the call succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Replaces the result, discarding any error.
    pub fn force_result(&mut self, result: HookReturn) {
        self.result = Ok(result);
    }

    /// Replaces the result with an error.
    pub fn force_error(&mut self, error: HookCallError) {
        self.result = Err(error);
    }

    /// Consumes the outcome.
    pub fn into_result(self) -> CallResult<HookReturn> {
        self.result
    }
}
