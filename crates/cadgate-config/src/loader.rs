//! Configuration loader with layered sources.

use crate::{AppConfig, CacheBackend};
use cadgate_core::CadgateError;
use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `CADGATE_` prefix
    pub fn new(config_dir: impl Into<String>) -> Result<Self, CadgateError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, CadgateError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    pub async fn reload(&self) -> Result<(), CadgateError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Loads configuration from the specified directory.
    fn load_config(config_dir: &str) -> Result<AppConfig, CadgateError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("CADGATE_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("CADGATE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_cadgate_error)?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_cadgate_error)?;

        validate_config(&app_config)?;

        Ok(app_config)
    }
}

/// Validates the configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), CadgateError> {
    let base_url = Url::parse(&config.cad.base_url).map_err(|e| {
        CadgateError::Configuration(format!("cad.base_url is not a valid URL: {}", e))
    })?;

    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(CadgateError::Configuration(
            "cad.base_url must use http or https".to_string(),
        ));
    }

    if base_url.host_str().is_none() {
        return Err(CadgateError::Configuration(
            "cad.base_url must include a host".to_string(),
        ));
    }

    if config.cache.backend == CacheBackend::Redis && config.cache.redis_url.is_none() {
        return Err(CadgateError::Configuration(
            "cache.redis_url is required for the redis backend".to_string(),
        ));
    }

    if config.cache.sweep_interval_secs == 0 {
        return Err(CadgateError::Configuration(
            "cache.sweep_interval_secs must be greater than zero".to_string(),
        ));
    }

    if config.app.environment == "production" && config.webhooks.secret.is_none() {
        warn!("Webhook endpoints are unauthenticated in production; set webhooks.secret");
    }

    Ok(())
}

fn config_error_to_cadgate_error(err: ConfigError) -> CadgateError {
    CadgateError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = AppConfig::default();
        config.cad.base_url = "not a url".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(CadgateError::Configuration(_))
        ));

        config.cad.base_url = "ftp://cad.some.app".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let mut config = AppConfig::default();
        config.cache.backend = CacheBackend::Redis;
        assert!(validate_config(&config).is_err());

        config.cache.redis_url = Some("redis://localhost:6379".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_loads_default_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
[server]
port = 9000

[cad]
base_url = "https://cad.example.test"
tenant_subdomains = false

[cache]
coalesce_misses = true
"#,
        )
        .unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy().to_string()).unwrap();
        let config = loader.get().await;

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.cad.base_url, "https://cad.example.test");
        assert!(!config.cad.tenant_subdomains);
        assert!(config.cache.coalesce_misses);
        assert_eq!(config.cache.sweep_interval_secs, 60);
    }

    #[tokio::test]
    async fn test_missing_directory_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let loader = ConfigLoader::new(missing.to_string_lossy().to_string()).unwrap();
        assert_eq!(loader.get().await.server.port, 8080);
    }
}
