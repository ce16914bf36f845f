//! Client configuration.
//!
//! Every setting has a default. [`ClientConfig::from_env`] overrides
//! them from `CLASSDESK_*` environment variables; the builder can
//! override them again in code.

use std::path::PathBuf;
use std::time::Duration;

use classdesk_idle::IdleConfig;
use classdesk_session::SessionConfig;

/// Storage key for the local session record.
pub const STORAGE_KEY_VAR: &str = "CLASSDESK_STORAGE_KEY";

/// Directory for [`FileStorage`](classdesk_session::FileStorage).
pub const STORAGE_DIR_VAR: &str = "CLASSDESK_STORAGE_DIR";

/// Inactivity timeout in whole seconds.
pub const IDLE_TIMEOUT_VAR: &str = "CLASSDESK_IDLE_TIMEOUT_SECS";

/// A setting read from the environment couldn't be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything a [`Client`](crate::Client) needs besides its remote store
/// and storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub session: SessionConfig,
    pub idle: IdleConfig,
    /// Where file-backed local storage lives. `None` keeps the session
    /// record in memory only.
    pub storage_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Reads overrides from the process environment.
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] when a variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(key) = lookup(STORAGE_KEY_VAR) {
            if key.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    var: STORAGE_KEY_VAR,
                    value: key,
                    reason: "must not be empty".into(),
                });
            }
            config.session.storage_key = key;
        }

        if let Some(dir) = lookup(STORAGE_DIR_VAR) {
            if !dir.is_empty() {
                config.storage_dir = Some(PathBuf::from(dir));
            }
        }

        if let Some(raw) = lookup(IDLE_TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: IDLE_TIMEOUT_VAR,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
            config.idle = IdleConfig::with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_from_lookup_nothing_set_gives_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.session.storage_key, "teaching-platform-active-session");
        assert_eq!(config.idle.timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_from_lookup_reads_every_variable() {
        let config = ClientConfig::from_lookup(lookup(&[
            (STORAGE_KEY_VAR, "staging-session"),
            (STORAGE_DIR_VAR, "/tmp/classdesk"),
            (IDLE_TIMEOUT_VAR, "90"),
        ]))
        .unwrap();

        assert_eq!(config.session.storage_key, "staging-session");
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/classdesk")));
        assert_eq!(config.idle.timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_from_lookup_bad_timeout_returns_error() {
        let result = ClientConfig::from_lookup(lookup(&[(IDLE_TIMEOUT_VAR, "ten minutes")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { var: IDLE_TIMEOUT_VAR, .. })
        ));
    }

    #[test]
    fn test_from_lookup_blank_storage_key_returns_error() {
        let result = ClientConfig::from_lookup(lookup(&[(STORAGE_KEY_VAR, "  ")]));
        assert!(result.is_err());
    }
}
