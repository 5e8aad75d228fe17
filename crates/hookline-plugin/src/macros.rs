//! Convenience macros for hosts and plugins.

/// Builds [`HookArgs`](crate::hooks::definitions::HookArgs) from
/// `key => value` pairs. Values go through `Into<serde_json::Value>`.
///
/// # Example
/// ```rust,ignore
/// let args = hook_args! {
///     "name" => "world",
///     "count" => 3,
/// };
/// ```
#[macro_export]
macro_rules! hook_args {
    () => {
        $crate::hooks::definitions::HookArgs::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut args = $crate::hooks::definitions::HookArgs::new();
        $(
            args.insert($key, $value);
        )+
        args
    }};
}
