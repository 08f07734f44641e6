//! Run configuration.
//!
//! The slow-motion factor and the default retry policy are fixed for the
//! duration of a test run. They are carried here and handed to the idle
//! waiter and the evaluator when a [`GuiCheck`](crate::GuiCheck) is built.

use crate::assertion::retry::RetryPolicy;
use crate::idle::IdleConfig;
use crate::result::{GuiCheckError, GuiCheckResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the slow-motion factor
pub const ENV_SLOW_MOTION: &str = "GUICHECK_SLOW_MOTION";
/// Environment variable overriding the number of evaluation attempts
pub const ENV_RETRIES: &str = "GUICHECK_RETRIES";
/// Environment variable overriding the delay between attempts (ms)
pub const ENV_RETRY_DELAY_MS: &str = "GUICHECK_RETRY_DELAY_MS";
/// Environment variable overriding the number of idle cycles
pub const ENV_IDLE_CYCLES: &str = "GUICHECK_IDLE_CYCLES";

/// Configuration for a GUIcheck session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiCheckConfig {
    /// Default retry policy for evaluations
    pub retry: RetryPolicy,
    /// Idle detection settings
    pub idle: IdleConfig,
    /// How often a blocked dispatch re-checks event-loop liveness
    pub dispatch_poll_interval_ms: u64,
    /// How long [`GuiCheck::await_startup`](crate::GuiCheck::await_startup) waits
    pub startup_timeout_ms: u64,
}

impl Default for GuiCheckConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            idle: IdleConfig::default(),
            dispatch_poll_interval_ms: 500,
            startup_timeout_ms: 60_000,
        }
    }
}

impl GuiCheckConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retry policy
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the idle detection settings
    #[must_use]
    pub const fn with_idle(mut self, idle: IdleConfig) -> Self {
        self.idle = idle;
        self
    }

    /// Set the slow-motion factor
    #[must_use]
    pub const fn with_slow_motion(mut self, factor: u32) -> Self {
        self.idle.slow_motion_factor = factor;
        self
    }

    /// Set the dispatcher liveness poll interval
    #[must_use]
    pub const fn with_dispatch_poll_interval_ms(mut self, ms: u64) -> Self {
        self.dispatch_poll_interval_ms = ms;
        self
    }

    /// Set the startup timeout
    #[must_use]
    pub const fn with_startup_timeout_ms(mut self, ms: u64) -> Self {
        self.startup_timeout_ms = ms;
        self
    }

    /// Dispatcher poll interval as a duration
    #[must_use]
    pub const fn dispatch_poll_interval(&self) -> Duration {
        Duration::from_millis(self.dispatch_poll_interval_ms)
    }

    /// Startup timeout as a duration
    #[must_use]
    pub const fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    /// Load configuration from a YAML string
    ///
    /// # Errors
    /// Returns error if YAML parsing or validation fails
    pub fn from_yaml_str(yaml: &str) -> GuiCheckResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is invalid
    pub fn from_file(path: impl AsRef<Path>) -> GuiCheckResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> GuiCheckResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `GUICHECK_*` environment overrides
    ///
    /// # Errors
    /// Returns error if a variable is set but not a valid number, or the
    /// resulting configuration is invalid
    pub fn with_env_overrides(self) -> GuiCheckResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> GuiCheckResult<Self> {
        if let Some(v) = parse_var(&lookup, ENV_SLOW_MOTION)? {
            self.idle.slow_motion_factor = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_RETRIES)? {
            self.retry.max_attempts = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_RETRY_DELAY_MS)? {
            self.retry.delay_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_IDLE_CYCLES)? {
            self.idle.cycles = v;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check that the configuration can drive a session
    ///
    /// # Errors
    /// Returns [`GuiCheckError::Config`] naming the first invalid field
    pub fn validate(&self) -> GuiCheckResult<()> {
        if self.retry.max_attempts == 0 {
            return Err(config_error("retry.max_attempts must be at least 1"));
        }
        if self.idle.slow_motion_factor == 0 {
            return Err(config_error("idle.slow_motion_factor must be at least 1"));
        }
        if self.dispatch_poll_interval_ms == 0 {
            return Err(config_error("dispatch_poll_interval_ms must be positive"));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> GuiCheckResult<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| config_error(format!("{key}={raw:?} is not a valid number"))),
    }
}

fn config_error(message: impl Into<String>) -> GuiCheckError {
    GuiCheckError::Config {
        message: message.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    mod defaults {
        use super::*;

        #[test]
        fn test_defaults_match_toolkit_constants() {
            let config = GuiCheckConfig::default();
            assert_eq!(config.retry.max_attempts, 10);
            assert_eq!(config.retry.delay_ms, 50);
            assert_eq!(config.idle.cycles, 3);
            assert_eq!(config.idle.effective_delay(), Duration::from_millis(10));
            assert_eq!(config.dispatch_poll_interval(), Duration::from_millis(500));
            assert_eq!(config.startup_timeout(), Duration::from_secs(60));
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_builder() {
            let config = GuiCheckConfig::new()
                .with_retry(RetryPolicy::new(3, 5))
                .with_slow_motion(2)
                .with_dispatch_poll_interval_ms(20)
                .with_startup_timeout_ms(1000);
            assert_eq!(config.retry.max_attempts, 3);
            assert_eq!(config.idle.slow_motion_factor, 2);
            assert_eq!(config.dispatch_poll_interval_ms, 20);
            assert_eq!(config.startup_timeout_ms, 1000);
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn test_zero_attempts_rejected() {
            let config = GuiCheckConfig::new().with_retry(RetryPolicy::new(0, 50));
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("max_attempts"));
        }

        #[test]
        fn test_zero_slow_motion_rejected() {
            let err = GuiCheckConfig::new()
                .with_slow_motion(0)
                .validate()
                .unwrap_err();
            assert!(matches!(err, GuiCheckError::Config { .. }));
        }

        #[test]
        fn test_zero_poll_interval_rejected() {
            let config = GuiCheckConfig::new().with_dispatch_poll_interval_ms(0);
            assert!(config.validate().is_err());
        }
    }

    mod yaml {
        use super::*;
        use std::io::Write;

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = GuiCheckConfig::from_yaml_str("retry:\n  max_attempts: 4\n").unwrap();
            assert_eq!(config.retry.max_attempts, 4);
            assert_eq!(config.retry.delay_ms, 50);
            assert_eq!(config.idle, IdleConfig::default());
        }

        #[test]
        fn test_invalid_yaml_values_rejected() {
            let result = GuiCheckConfig::from_yaml_str("idle:\n  slow_motion_factor: 0\n");
            assert!(matches!(result, Err(GuiCheckError::Config { .. })));
        }

        #[test]
        fn test_malformed_yaml_is_yaml_error() {
            let result = GuiCheckConfig::from_yaml_str("retry: [");
            assert!(matches!(result, Err(GuiCheckError::Yaml(_))));
        }

        #[test]
        fn test_from_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "dispatch_poll_interval_ms: 25").unwrap();
            writeln!(file, "idle:").unwrap();
            writeln!(file, "  cycles: 5").unwrap();
            let config = GuiCheckConfig::from_file(file.path()).unwrap();
            assert_eq!(config.dispatch_poll_interval_ms, 25);
            assert_eq!(config.idle.cycles, 5);
        }

        #[test]
        fn test_missing_file_is_io_error() {
            let dir = tempfile::tempdir().unwrap();
            let result = GuiCheckConfig::from_file(dir.path().join("absent.yaml"));
            assert!(matches!(result, Err(GuiCheckError::Io(_))));
        }

        #[test]
        fn test_yaml_roundtrip_preserves_config() {
            let config = GuiCheckConfig::new().with_slow_motion(3);
            let yaml = config.to_yaml().unwrap();
            assert_eq!(GuiCheckConfig::from_yaml_str(&yaml).unwrap(), config);
        }
    }

    mod env {
        use super::*;

        fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
            let map: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect();
            move |key| map.get(key).cloned()
        }

        #[test]
        fn test_overrides_applied() {
            let config = GuiCheckConfig::new()
                .with_overrides_from(lookup(&[
                    (ENV_SLOW_MOTION, "4"),
                    (ENV_RETRIES, "2"),
                    (ENV_RETRY_DELAY_MS, "7"),
                    (ENV_IDLE_CYCLES, " 6 "),
                ]))
                .unwrap();
            assert_eq!(config.idle.slow_motion_factor, 4);
            assert_eq!(config.retry.max_attempts, 2);
            assert_eq!(config.retry.delay_ms, 7);
            assert_eq!(config.idle.cycles, 6);
        }

        #[test]
        fn test_unset_variables_change_nothing() {
            let config = GuiCheckConfig::new()
                .with_overrides_from(lookup(&[]))
                .unwrap();
            assert_eq!(config, GuiCheckConfig::default());
        }

        #[test]
        fn test_garbage_value_rejected() {
            let err = GuiCheckConfig::new()
                .with_overrides_from(lookup(&[(ENV_RETRIES, "many")]))
                .unwrap_err();
            assert!(err.to_string().contains(ENV_RETRIES));
        }

        #[test]
        fn test_override_to_zero_rejected() {
            let result =
                GuiCheckConfig::new().with_overrides_from(lookup(&[(ENV_SLOW_MOTION, "0")]));
            assert!(result.is_err());
        }
    }
}
