//! Environment variable lookup
//!
//! Configuration and secrets are read through [`EnvSource`] so callers can
//! substitute a fixed map for the process environment.

use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// A source of environment-style key/value pairs.
pub trait EnvSource {
    /// Look up `key`. Absence is a normal result, not an error.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        // Non-UTF-8 values count as unset
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// Typed helpers on top of any [`EnvSource`].
pub trait EnvSourceExt: EnvSource {
    /// Get a variable, falling back to `default` when unset.
    ///
    /// # Example
    /// ```ignore
    /// let uri = ProcessEnv.var_or("MONGO_URI", "mongodb://localhost:27017");
    /// ```
    fn var_or(&self, key: &str, default: &str) -> String {
        self.var(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a required variable, returning an error naming it if unset.
    fn var_required(&self, key: &str) -> Result<String> {
        self.var(key).ok_or_else(|| anyhow!("{} must be set", key))
    }

    /// Get a variable only if it is set to a non-empty value.
    fn var_non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|v| !v.is_empty())
    }

    /// Get a boolean flag.
    ///
    /// `true`, `1`, `yes` and `on` (any case) are true; any other set value
    /// is false. Returns `default` when unset.
    fn var_flag(&self, key: &str, default: bool) -> bool {
        match self.var(key) {
            Some(v) => matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            ),
            None => default,
        }
    }

    /// Get a variable parsed as `T`.
    ///
    /// Returns `default` if the variable is not set or fails to parse.
    fn var_parse<T: FromStr>(&self, key: &str, default: T) -> T {
        self.var(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}

impl<S: EnvSource + ?Sized> EnvSourceExt for S {}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_var_or_uses_default_when_unset() {
        let env = env(&[("SET", "value")]);
        assert_eq!(env.var_or("SET", "fallback"), "value");
        assert_eq!(env.var_or("UNSET", "fallback"), "fallback");
    }

    #[test]
    fn test_var_required_names_missing_key() {
        let err = env(&[]).var_required("MONGO_URI").unwrap_err();
        assert!(err.to_string().contains("MONGO_URI"));
    }

    #[test]
    fn test_var_non_empty_treats_empty_as_unset() {
        let env = env(&[("EMPTY", ""), ("FULL", "x")]);
        assert_eq!(env.var_non_empty("EMPTY"), None);
        assert_eq!(env.var_non_empty("FULL").as_deref(), Some("x"));
        assert_eq!(env.var_non_empty("UNSET"), None);
    }

    #[test]
    fn test_var_flag() {
        let env = env(&[("A", "TRUE"), ("B", "on"), ("C", "no"), ("D", "1")]);
        assert!(env.var_flag("A", false));
        assert!(env.var_flag("B", false));
        assert!(!env.var_flag("C", true));
        assert!(env.var_flag("D", false));
        assert!(env.var_flag("UNSET", true));
    }

    #[test]
    fn test_var_parse_falls_back_on_garbage() {
        let env = env(&[("N", " 42 "), ("BAD", "forty")]);
        assert_eq!(env.var_parse("N", 0u64), 42);
        assert_eq!(env.var_parse("BAD", 7u64), 7);
        assert_eq!(env.var_parse("UNSET", 9u64), 9);
    }
}
