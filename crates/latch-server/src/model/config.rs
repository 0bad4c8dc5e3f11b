//! Configuration management for the Latch server
//!
//! Loads settings from `conf/application.yml`, `LATCH_`-prefixed environment
//! variables, and command line overrides, in that order of precedence.

use std::time::Duration;

use clap::Parser;
use config::{Config, Environment};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use latch_common::LatchError;
use latch_lease::policy::DEFAULT_TTL_SECONDS;

use crate::startup::logging::LoggingConfig;

/// Default port the lock API listens on
pub const DEFAULT_SERVER_PORT: u16 = 8700;

/// Default client poll-interval hint in seconds
pub const DEFAULT_PING_SECONDS: i64 = 15;

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command()]
struct Cli {
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,
    #[arg(short = 's', long = "storage-mode")]
    storage_mode: Option<String>,
    #[arg(long = "db-url", env = "DATABASE_URL")]
    database_url: Option<String>,
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new() -> Self {
        let args = Cli::parse();
        let mut config_builder = Config::builder()
            .add_source(
                Environment::with_prefix("latch")
                    .separator(".")
                    .try_parsing(true),
            )
            .add_source(config::File::with_name("conf/application.yml").required(false));

        if let Some(v) = args.port {
            config_builder = config_builder
                .set_override("server.port", i64::from(v))
                .expect("Failed to set server port override");
        }
        if let Some(v) = args.storage_mode {
            config_builder = config_builder
                .set_override("latch.storage.mode", v)
                .expect("Failed to set storage mode override");
        }
        if let Some(v) = args.database_url {
            config_builder = config_builder
                .set_override("db.url", v)
                .expect("Failed to set database URL override");
        }

        let app_config = config_builder
            .build()
            .expect("Failed to build configuration - check conf/application.yml");

        Configuration { config: app_config }
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_address(&self) -> String {
        self.config
            .get_string("server.address")
            .unwrap_or("0.0.0.0".to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int("server.port")
            .unwrap_or(DEFAULT_SERVER_PORT.into()) as u16
    }

    // ========================================================================
    // Lock Configuration
    // ========================================================================

    /// Lease lifetime in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.config
            .get_int("latch.lock.ttlSeconds")
            .unwrap_or(DEFAULT_TTL_SECONDS)
    }

    /// Poll-interval hint handed to clients; informational only
    pub fn ping_seconds(&self) -> i64 {
        self.config
            .get_int("latch.lock.pingSeconds")
            .unwrap_or(DEFAULT_PING_SECONDS)
    }

    /// Release grace period; zero means DELETE hard-deletes the lease
    pub fn grace_seconds(&self) -> i64 {
        self.config.get_int("latch.lock.graceSeconds").unwrap_or(0)
    }

    /// Seconds between background sweep passes; zero disables the sweeper
    pub fn sweep_interval_seconds(&self) -> i64 {
        self.config
            .get_int("latch.lock.sweepIntervalSeconds")
            .unwrap_or(60)
    }

    /// Resource types that may be locked; empty means any type is accepted
    pub fn resource_types(&self) -> Vec<String> {
        self.config
            .get_array("latch.lock.resourceTypes")
            .map(|values| {
                values
                    .into_iter()
                    .filter_map(|v| v.into_string().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // Storage Configuration
    // ========================================================================

    pub fn storage_mode(&self) -> String {
        self.config
            .get_string("latch.storage.mode")
            .unwrap_or("memory".to_string())
    }

    pub async fn database_connection(&self) -> anyhow::Result<DatabaseConnection> {
        let url = self.config.get_string("db.url").map_err(|_| {
            LatchError::ConfigError("db.url is required when storage mode is database".to_string())
        })?;
        let max_connections = self.config.get_int("db.pool.maxConnections").unwrap_or(20) as u32;
        let min_connections = self.config.get_int("db.pool.minConnections").unwrap_or(1) as u32;
        let connect_timeout = self.config.get_int("db.pool.connectTimeout").unwrap_or(30) as u64;

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(connect_timeout));

        Ok(Database::connect(opt).await?)
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            console_level: self
                .config
                .get_string("latch.logs.consoleLevel")
                .unwrap_or("info".to_string()),
            file_logging: self
                .config
                .get_bool("latch.logs.fileLogging")
                .unwrap_or(false),
            log_dir: self
                .config
                .get_string("latch.logs.dir")
                .unwrap_or("logs".to_string()),
            file_level: self
                .config
                .get_string("latch.logs.fileLevel")
                .unwrap_or("info".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration_from(pairs: &[(&str, &str)]) -> Configuration {
        let mut builder = Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        Configuration {
            config: builder.build().unwrap(),
        }
    }

    #[test]
    fn test_defaults() {
        let configuration = configuration_from(&[]);
        assert_eq!(configuration.server_port(), DEFAULT_SERVER_PORT);
        assert_eq!(configuration.ttl_seconds(), DEFAULT_TTL_SECONDS);
        assert_eq!(configuration.ping_seconds(), DEFAULT_PING_SECONDS);
        assert_eq!(configuration.grace_seconds(), 0);
        assert_eq!(configuration.storage_mode(), "memory");
        assert!(configuration.resource_types().is_empty());
    }

    #[test]
    fn test_overrides() {
        let configuration = configuration_from(&[
            ("latch.lock.ttlSeconds", "300"),
            ("latch.lock.graceSeconds", "10"),
            ("latch.storage.mode", "database"),
        ]);
        assert_eq!(configuration.ttl_seconds(), 300);
        assert_eq!(configuration.grace_seconds(), 10);
        assert_eq!(configuration.storage_mode(), "database");
    }
}
