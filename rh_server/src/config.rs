//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use ride_hailing::config::parse_env_or;
use ride_hailing::db::DatabaseConfig;
use ride_hailing::gateway::RazorpayConfig;
use ride_hailing::{ConfigError, EngineConfig};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Where bookings, vehicles and wallets live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-process store; state is lost on restart
    Memory,
    /// PostgreSQL via sqlx
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Postgres => write!(f, "postgres"),
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    pub storage: StorageBackend,
    /// Database configuration; required for the postgres backend
    pub database: Option<DatabaseConfig>,
    /// Business tunables
    pub engine: EngineConfig,
    /// Payment gateway credentials; `None` runs against the in-memory gateway
    pub razorpay: Option<RazorpayConfig>,
    /// Prometheus scrape listener, if enabled
    pub metrics_addr: Option<SocketAddr>,
}

/// Command line overrides, applied on top of the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub storage: Option<StorageBackend>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_env_or("SERVER_BIND", default_bind())?,
        };

        let storage = match overrides.storage {
            Some(storage) => storage,
            None => parse_env_or("STORAGE_BACKEND", StorageBackend::Postgres)?,
        };

        let database = match storage {
            StorageBackend::Memory => None,
            StorageBackend::Postgres => Some(match overrides.database_url {
                Some(url) => DatabaseConfig::from_env_with_url(url)?,
                None => DatabaseConfig::from_env()?,
            }),
        };

        let metrics_addr = match std::env::var("METRICS_BIND") {
            Ok(value) if !value.trim().is_empty() => {
                Some(value.parse().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("not a socket address: {value}"),
                })?)
            }
            _ => None,
        };

        Ok(ServerConfig {
            bind,
            storage,
            database,
            engine: EngineConfig::from_env()?,
            razorpay: RazorpayConfig::from_env()?,
            metrics_addr,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns the first inconsistent setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage == StorageBackend::Postgres && self.database.is_none() {
            return Err(ConfigError::MissingRequired {
                var: "DATABASE_URL".to_string(),
                hint: "Required when STORAGE_BACKEND=postgres".to_string(),
            });
        }

        if let Some(metrics) = self.metrics_addr
            && metrics == self.bind
        {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        self.engine.validate()
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn memory_config() -> ServerConfig {
        ServerConfig {
            bind: DEFAULT_BIND.parse().unwrap(),
            storage: StorageBackend::Memory,
            database: None,
            engine: EngineConfig::default(),
            razorpay: None,
            metrics_addr: None,
        }
    }

    #[test]
    fn test_default_bind_matches_constant() {
        assert_eq!(default_bind(), DEFAULT_BIND.parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!("memory".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert_eq!("PostgreSQL".parse::<StorageBackend>(), Ok(StorageBackend::Postgres));
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_postgres_requires_database() {
        let config = ServerConfig {
            storage: StorageBackend::Postgres,
            ..memory_config()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));
    }

    #[test]
    fn test_metrics_must_not_share_bind() {
        let config = ServerConfig {
            metrics_addr: Some(DEFAULT_BIND.parse().unwrap()),
            ..memory_config()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Invalid { .. }
        ));
    }

    #[test]
    fn test_invalid_engine_rejected() {
        let mut config = memory_config();
        config.engine.min_withdrawal_amount = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_memory_backend() {
        unsafe {
            std::env::set_var("STORAGE_BACKEND", "memory");
            std::env::set_var("SERVER_BIND", "0.0.0.0:9000");
            std::env::remove_var("METRICS_BIND");
            std::env::remove_var("RAZORPAY_KEY_ID");
        }

        let config = ServerConfig::from_env(Overrides::default()).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.database.is_none());
        assert_eq!(config.bind.port(), 9000);
        assert!(config.razorpay.is_none());

        unsafe {
            std::env::remove_var("STORAGE_BACKEND");
            std::env::remove_var("SERVER_BIND");
        }
    }

    #[test]
    #[serial]
    fn test_overrides_win() {
        unsafe {
            std::env::set_var("SERVER_BIND", "0.0.0.0:9000");
        }

        let config = ServerConfig::from_env(Overrides {
            bind: Some("127.0.0.1:7000".parse().unwrap()),
            storage: Some(StorageBackend::Memory),
            database_url: None,
        })
        .unwrap();
        assert_eq!(config.bind.port(), 7000);

        unsafe {
            std::env::remove_var("SERVER_BIND");
        }
    }

    #[test]
    #[serial]
    fn test_bad_bind_is_invalid() {
        unsafe {
            std::env::set_var("SERVER_BIND", "not-an-address");
        }

        let err = ServerConfig::from_env(Overrides {
            storage: Some(StorageBackend::Memory),
            ..Overrides::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        unsafe {
            std::env::remove_var("SERVER_BIND");
        }
    }
}
