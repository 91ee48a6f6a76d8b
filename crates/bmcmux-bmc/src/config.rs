//! Executor configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BmcError, Result};
use crate::executor::{AttemptTimeout, Executor, DEFAULT_ATTEMPT_TIMEOUT};

/// Executor settings, usually loaded as part of a larger config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Per-attempt timeout in seconds; unset or 0 inherits the caller's context
    pub attempt_timeout_secs: Option<f64>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_secs: Some(DEFAULT_ATTEMPT_TIMEOUT.as_secs_f64()),
        }
    }
}

impl ExecutorConfig {
    /// Set the per-attempt timeout
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout_secs = Some(timeout.as_secs_f64());
        self
    }

    /// Run attempts under the caller's context only
    pub fn inherit(mut self) -> Self {
        self.attempt_timeout_secs = None;
        self
    }

    pub fn attempt_timeout(&self) -> AttemptTimeout {
        match self.attempt_timeout_secs {
            Some(secs) if secs > 0.0 => match Duration::try_from_secs_f64(secs) {
                Ok(timeout) => AttemptTimeout::Fixed(timeout),
                // Too large for a Duration; no attempt would ever time out
                Err(_) => AttemptTimeout::Inherit,
            },
            _ => AttemptTimeout::Inherit,
        }
    }

    /// Reject timeouts a `Duration` cannot hold
    pub fn validate(&self) -> Result<()> {
        match self.attempt_timeout_secs {
            Some(secs) if secs < 0.0 || Duration::try_from_secs_f64(secs).is_err() => {
                Err(BmcError::InvalidConfig(format!(
                    "attempt_timeout_secs must be between 0 and {} seconds, got {}",
                    u64::MAX,
                    secs
                )))
            }
            _ => Ok(()),
        }
    }

    /// Executor for `host` with these settings
    pub fn executor(&self, host: &str) -> Executor {
        Executor::for_host(host).with_attempt_timeout(self.attempt_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_thirty_seconds() {
        let config = ExecutorConfig::default();
        assert_eq!(
            config.attempt_timeout(),
            AttemptTimeout::Fixed(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_zero_and_none_inherit() {
        let config = ExecutorConfig {
            attempt_timeout_secs: Some(0.0),
        };
        assert_eq!(config.attempt_timeout(), AttemptTimeout::Inherit);
        assert_eq!(
            ExecutorConfig::default().inherit().attempt_timeout(),
            AttemptTimeout::Inherit
        );
    }

    #[test]
    fn test_builder() {
        let config = ExecutorConfig::default().with_attempt_timeout(Duration::from_millis(1500));
        assert_eq!(
            config.attempt_timeout(),
            AttemptTimeout::Fixed(Duration::from_millis(1500))
        );
        assert_eq!(
            config.executor("10.0.0.5").attempt_timeout(),
            AttemptTimeout::Fixed(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_deserialize() {
        let config: ExecutorConfig = serde_json::from_str(r#"{"attempt_timeout_secs": 2.5}"#).unwrap();
        assert_eq!(
            config.attempt_timeout(),
            AttemptTimeout::Fixed(Duration::from_millis(2500))
        );

        let config: ExecutorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ExecutorConfig::default());

        let config: ExecutorConfig =
            serde_json::from_str(r#"{"attempt_timeout_secs": null}"#).unwrap();
        assert_eq!(config.attempt_timeout(), AttemptTimeout::Inherit);
    }

    #[test]
    fn test_oversized_timeout_does_not_panic() {
        let config: ExecutorConfig =
            serde_json::from_str(r#"{"attempt_timeout_secs": 1e30}"#).unwrap();
        assert_eq!(config.attempt_timeout(), AttemptTimeout::Inherit);
        assert_eq!(
            config.executor("10.0.0.5").attempt_timeout(),
            AttemptTimeout::Inherit
        );
        assert!(matches!(config.validate(), Err(BmcError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate() {
        assert!(ExecutorConfig::default().validate().is_ok());
        assert!(ExecutorConfig::default().inherit().validate().is_ok());

        let negative = ExecutorConfig {
            attempt_timeout_secs: Some(-1.0),
        };
        assert!(negative.validate().is_err());
        assert_eq!(negative.attempt_timeout(), AttemptTimeout::Inherit);

        let nan = ExecutorConfig {
            attempt_timeout_secs: Some(f64::NAN),
        };
        assert!(nan.validate().is_err());
        assert_eq!(nan.attempt_timeout(), AttemptTimeout::Inherit);
    }
}
