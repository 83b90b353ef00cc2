//! crates/logging/src/config.rs
//! Verbosity configuration and its filter directive.

use std::ffi::OsString;

/// Environment variable that replaces the verbosity-derived filter.
pub const LOG_ENV: &str = "OC_FACL_LOG";

/// Target prefix shared by every oc-facl library crate.
pub const TARGET_PREFIX: &str = "facl";

/// Logging configuration derived from the `-v` count and the environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerbosityConfig {
    level: u8,
    env_override: Option<String>,
    ansi: bool,
}

impl VerbosityConfig {
    /// Creates a configuration for the given number of `-v` flags.
    ///
    /// | level | filter                         |
    /// |-------|--------------------------------|
    /// | 0     | `warn`                         |
    /// | 1     | `warn,facl=info`               |
    /// | 2     | `warn,facl=debug`              |
    /// | 3+    | `info,facl=trace`              |
    #[must_use]
    pub const fn from_verbose_level(level: u8) -> Self {
        Self {
            level,
            env_override: None,
            ansi: false,
        }
    }

    /// Reads [`LOG_ENV`] from the process environment.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_value(std::env::var_os(LOG_ENV))
    }

    /// Applies an explicit value for [`LOG_ENV`]. Empty or non-UTF-8 values
    /// are ignored.
    #[must_use]
    pub fn with_env_value(mut self, value: Option<OsString>) -> Self {
        self.env_override = value
            .and_then(|value| value.into_string().ok())
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        self
    }

    /// Enables or disables ANSI colours in the output.
    #[must_use]
    pub const fn ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Returns the `-v` count.
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Returns the environment override, if one was applied.
    #[must_use]
    pub fn env_override(&self) -> Option<&str> {
        self.env_override.as_deref()
    }

    /// Returns whether ANSI colours are enabled.
    #[must_use]
    pub const fn ansi_enabled(&self) -> bool {
        self.ansi
    }

    /// Returns the filter directive this configuration installs.
    #[must_use]
    pub fn directive(&self) -> String {
        if let Some(directive) = &self.env_override {
            return directive.clone();
        }
        match self.level {
            0 => "warn".to_owned(),
            1 => format!("warn,{TARGET_PREFIX}=info"),
            2 => format!("warn,{TARGET_PREFIX}=debug"),
            _ => format!("info,{TARGET_PREFIX}=trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_expected_configuration() {
        let config = VerbosityConfig::default();
        assert_eq!(config.level(), 0);
        assert_eq!(config.env_override(), None);
        assert!(!config.ansi_enabled());
        assert_eq!(config.directive(), "warn");
    }

    #[test]
    fn builder_methods_apply_requested_flags() {
        let config = VerbosityConfig::from_verbose_level(2)
            .with_env_value(Some(OsString::from("facl::store=trace")))
            .ansi(true);
        assert_eq!(config.level(), 2);
        assert_eq!(config.env_override(), Some("facl::store=trace"));
        assert!(config.ansi_enabled());
    }

    #[test]
    fn env_override_replaces_verbosity() {
        let config = VerbosityConfig::from_verbose_level(3)
            .with_env_value(Some(OsString::from(" error ")));
        assert_eq!(config.directive(), "error");
    }

    #[test]
    fn blank_env_value_is_ignored() {
        let config = VerbosityConfig::from_verbose_level(1).with_env_value(Some(OsString::new()));
        assert_eq!(config.env_override(), None);
        assert_eq!(config.directive(), "warn,facl=info");
    }
}
