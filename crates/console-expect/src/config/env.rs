//! Environment-based configuration.

use std::collections::HashMap;
use std::time::Duration;

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "CONSOLE_EXPECT";

/// Environment variable reader.
///
/// Values are looked up as `{PREFIX}_{NAME}`. Explicit overrides, set with
/// [`EnvConfig::with_var`], take precedence over the process environment.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
    /// Values consulted before the process environment.
    overrides: HashMap<String, String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a new environment config reader.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides: HashMap::new(),
        }
    }

    /// Create without a prefix.
    #[must_use]
    pub fn no_prefix() -> Self {
        Self::new(String::new())
    }

    /// Supply a value for `name` without touching the process environment.
    #[must_use]
    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        let var_name = self.var_name(name);
        self.overrides.insert(var_name, value.into());
        self
    }

    /// Build the full environment variable name.
    #[must_use]
    pub fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Get a string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let var_name = self.var_name(name);
        self.overrides
            .get(&var_name)
            .cloned()
            .or_else(|| std::env::var(&var_name).ok())
    }

    /// Get a parsed value.
    #[must_use]
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.trim().parse().ok())
    }

    /// Get a boolean value.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| {
            matches!(
                v.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on" | "enabled"
            )
        })
    }

    /// Get a duration in milliseconds.
    #[must_use]
    pub fn duration_millis(&self, name: &str) -> Option<Duration> {
        self.parse::<u64>(name).map(Duration::from_millis)
    }

    /// Check if a variable is set.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Variables read by [`ConsoleConfig::from_env`](crate::ConsoleConfig::from_env).
pub mod vars {
    /// Default expect deadline in milliseconds.
    pub const TIMEOUT_MS: &str = "TIMEOUT_MS";
    /// Line ending for `send_line`: `lf`, `crlf` or `cr`.
    pub const LINE_ENDING: &str = "LINE_ENDING";
    /// Whether the terminal echoes input.
    pub const ECHO: &str = "ECHO";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_config_prefix() {
        let config = EnvConfig::new("TEST");
        assert_eq!(config.var_name("foo"), "TEST_FOO");
        assert_eq!(config.var_name("bar_baz"), "TEST_BAR_BAZ");
        assert_eq!(EnvConfig::default().var_name(vars::ECHO), "CONSOLE_EXPECT_ECHO");
    }

    #[test]
    fn env_config_no_prefix() {
        let config = EnvConfig::no_prefix();
        assert_eq!(config.var_name("foo"), "FOO");
    }

    #[test]
    fn overrides_win() {
        let config = EnvConfig::new("TEST_OVERRIDES")
            .with_var("ENABLED", "true")
            .with_var("DISABLED", "false")
            .with_var("WAIT", "1500");

        assert_eq!(config.bool("ENABLED"), Some(true));
        assert_eq!(config.bool("DISABLED"), Some(false));
        assert_eq!(config.duration_millis("WAIT"), Some(Duration::from_millis(1500)));
        assert!(config.is_set("wait"));
        assert!(!config.is_set("MISSING"));
    }

    #[test]
    fn process_environment_is_read() {
        // PATH is set in any environment that can run the test suite.
        let config = EnvConfig::no_prefix();
        assert_eq!(config.get("PATH"), std::env::var("PATH").ok());
    }
}
