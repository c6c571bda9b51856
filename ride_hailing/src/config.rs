//! Engine tunables loaded from environment variables.

use crate::fare::Money;

/// Business settings consumed by the booking, ledger and refund managers
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Smallest withdrawal a driver may request
    pub min_withdrawal_amount: Money,
    /// Debit posted when a driver cancels an accepted booking (0 disables it)
    pub driver_cancellation_penalty: Money,
    /// Relative distance deviation above which the completion fare is recomputed
    pub fare_recompute_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_withdrawal_amount: 100,
            driver_cancellation_penalty: 0,
            fare_recompute_tolerance: 0.10,
        }
    }
}

impl EngineConfig {
    /// Load from `MIN_WITHDRAWAL_AMOUNT`, `DRIVER_CANCELLATION_PENALTY` and
    /// `FARE_RECOMPUTE_TOLERANCE`, falling back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when a variable is set but malformed or negative.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            min_withdrawal_amount: parse_env_or("MIN_WITHDRAWAL_AMOUNT", defaults.min_withdrawal_amount)?,
            driver_cancellation_penalty: parse_env_or(
                "DRIVER_CANCELLATION_PENALTY",
                defaults.driver_cancellation_penalty,
            )?,
            fare_recompute_tolerance: parse_env_or(
                "FARE_RECOMPUTE_TOLERANCE",
                defaults.fare_recompute_tolerance,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_withdrawal_amount <= 0 {
            return Err(ConfigError::Invalid {
                var: "MIN_WITHDRAWAL_AMOUNT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.driver_cancellation_penalty < 0 {
            return Err(ConfigError::Invalid {
                var: "DRIVER_CANCELLATION_PENALTY".to_string(),
                reason: "Must not be negative".to_string(),
            });
        }

        if !self.fare_recompute_tolerance.is_finite() || self.fare_recompute_tolerance < 0.0 {
            return Err(ConfigError::Invalid {
                var: "FARE_RECOMPUTE_TOLERANCE".to_string(),
                reason: "Must be a non-negative number".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an environment variable, using `default` when it is unset.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` when the variable is set but does not parse.
pub fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("cannot parse {raw:?}"),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_engine_env() {
        unsafe {
            std::env::remove_var("MIN_WITHDRAWAL_AMOUNT");
            std::env::remove_var("DRIVER_CANCELLATION_PENALTY");
            std::env::remove_var("FARE_RECOMPUTE_TOLERANCE");
        }
    }

    #[test]
    #[serial]
    fn test_defaults_when_unset() {
        clear_engine_env();
        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.min_withdrawal_amount, 100);
        assert_eq!(config.driver_cancellation_penalty, 0);
    }

    #[test]
    #[serial]
    fn test_overrides_from_env() {
        clear_engine_env();
        unsafe {
            std::env::set_var("MIN_WITHDRAWAL_AMOUNT", "250");
            std::env::set_var("DRIVER_CANCELLATION_PENALTY", "50");
            std::env::set_var("FARE_RECOMPUTE_TOLERANCE", "0.25");
        }

        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.min_withdrawal_amount, 250);
        assert_eq!(config.driver_cancellation_penalty, 50);
        assert!((config.fare_recompute_tolerance - 0.25).abs() < f64::EPSILON);

        clear_engine_env();
    }

    #[test]
    #[serial]
    fn test_malformed_value_is_rejected() {
        clear_engine_env();
        unsafe {
            std::env::set_var("MIN_WITHDRAWAL_AMOUNT", "a hundred");
        }

        let err = EngineConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "MIN_WITHDRAWAL_AMOUNT"));

        clear_engine_env();
    }

    #[test]
    fn test_negative_penalty_fails_validation() {
        let config = EngineConfig {
            driver_cancellation_penalty: -5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
            hint: "postgres://localhost/rides".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DATABASE_URL"));
        assert!(msg.contains("postgres://localhost/rides"));
    }
}
