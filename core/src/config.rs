use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Connection parameters for the destination database.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PgConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            user: "root".to_string(),
            password: "root".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            database: "ny_taxi".to_string(),
        }
    }
}

impl PgConfig {
    /// Assembles the libpq-style connection string used by tokio-postgres.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.database
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user.is_empty() {
            return Err(ConfigError::MissingField {
                field: "user".to_string(),
            });
        }
        if self.host.is_empty() {
            return Err(ConfigError::MissingField {
                field: "host".to_string(),
            });
        }
        if self.database.is_empty() {
            return Err(ConfigError::MissingField {
                field: "database".to_string(),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "port cannot be zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Full run configuration: destination connection, target table, source
/// locator, and chunk size. Runners fill this from their CLI; it can also
/// be loaded from a YAML file or the environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    pub postgres: PgConfig,
    pub table: String,
    pub source: String,
    pub chunk_size: usize,
}

impl IngestConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let load_failed = |error: Box<dyn std::error::Error + Send + Sync>| ConfigError::LoadFailed {
            path: path.to_string(),
            error,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let config: IngestConfig =
            serde_yaml::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;
        Ok(config)
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let config_str = std::env::var("CSVLOAD_CONFIG")
            .map_err(|_| anyhow::anyhow!("CSVLOAD_CONFIG environment variable not set"))?;
        let config: IngestConfig = serde_yaml::from_str(&config_str)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.postgres.validate()?;
        if self.table.is_empty() {
            return Err(ConfigError::MissingField {
                field: "table".to_string(),
            });
        }
        if self.source.is_empty() {
            return Err(ConfigError::MissingField {
                field: "source".to_string(),
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "chunk size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
