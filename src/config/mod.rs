use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct FundConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

impl FundConfig {
    pub fn load() -> Result<Self> {
        let configured_path = std::env::var("DECENT_FUND_CONFIG")
            .unwrap_or_else(|_| "config/fund.toml".to_string());
        if configured_path.is_empty() {
            bail!("DECENT_FUND_CONFIG must not be empty");
        }

        let mut builder = Config::builder()
            .add_source(File::new(&configured_path, FileFormat::Toml).required(true));

        if let Ok(env_override) = std::env::var("DECENT_FUND_ENV") {
            if !env_override.is_empty() {
                let env_file = format!("config/fund.{env_override}.toml");
                if Path::new(&env_file).exists() {
                    builder = builder.add_source(File::new(&env_file, FileFormat::Toml));
                }
            }
        }

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty());
        builder = builder
            .set_override_option("database.url", database_url)
            .context("Failed to apply DATABASE_URL override")?;

        let settings = builder
            .build()
            .map_err(|err| map_config_error(err, &configured_path))?;
        Self::from_settings(settings)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .context("Failed to parse configuration")?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self> {
        let config: Self = settings
            .try_deserialize()
            .context("Failed to deserialize fund configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.backend == StorageBackend::Database {
            let Some(database) = &self.database else {
                bail!("[database] section is required for the database backend");
            };
            database.ensure_bounds()?;
        }
        if let Some(bootstrap) = &self.admin.bootstrap {
            if bootstrap.username.trim().is_empty() || bootstrap.password.is_empty() {
                bail!("Bootstrap admin needs both username and password");
            }
            if !self.admin.usernames.contains(&bootstrap.username) {
                bail!(
                    "Bootstrap admin {} must be listed in admin.usernames",
                    bootstrap.username
                );
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Database,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: u32,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
}

impl DatabaseConfig {
    const fn default_max_connections() -> u32 {
        5
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs.unwrap_or(10))
    }

    fn ensure_bounds(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Database URL must be specified");
        }
        if self.max_connections == 0 || self.max_connections > 128 {
            bail!("database.max_connections must be within 1..=128");
        }
        if self.max_connections < self.min_connections.unwrap_or(1) {
            bail!("database.max_connections must be >= min_connections");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub usernames: Vec<String>,
    pub bootstrap: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub sample_proposals: bool,
}

fn map_config_error(err: ConfigError, path: &str) -> ConfigError {
    match err {
        ConfigError::NotFound(_) => ConfigError::NotFound(path.to_string()),
        other => other,
    }
}
