//! Configuration management.
//!
//! Settings come from three layers, weakest first: built-in defaults, an
//! optional TOML config file, then environment variables. The env layer is
//! what deployments actually use; the file is for local development.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::llm::GatewayConfig;
use crate::repository::DbContext;

/// Default database filename inside the data directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "dealintel.db";

/// Identity provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the identity provider.
    #[serde(default = "default_provider_url")]
    pub provider_url: String,
    /// Service key sent alongside introspection calls.
    #[serde(default)]
    pub service_key: String,
}

fn default_provider_url() -> String {
    "http://localhost:54321".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider_url: default_provider_url(),
            service_key: String::new(),
        }
    }
}

/// Runtime settings for the service.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// AI gateway settings.
    pub gateway: GatewayConfig,
    /// Identity provider settings.
    pub auth: AuthConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dealintel");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            gateway: GatewayConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    database_url: Option<String>,
    gateway: Option<GatewayConfig>,
    auth: Option<AuthConfig>,
}

impl Settings {
    /// Load settings: defaults, then the config file (explicit path or
    /// `<data_dir>/config.toml`), then environment overrides.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = Settings::default();

        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| settings.data_dir.join("config.toml"));
        if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let file: ConfigFile = toml::from_str(&raw)?;
            settings.apply_file(file);
        }

        settings.apply_env();
        Ok(settings)
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(data_dir) = file.data_dir {
            self.data_dir = data_dir;
        }
        if file.database_url.is_some() {
            self.database_url = file.database_url;
        }
        if let Some(gateway) = file.gateway {
            self.gateway = gateway;
        }
        if let Some(auth) = file.auth {
            self.auth = auth;
        }
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Ok(v) = std::env::var("GATEWAY_URL") {
            self.gateway.endpoint = v;
        }
        if let Ok(v) = std::env::var("GATEWAY_API_KEY") {
            self.gateway.api_key = v;
        }
        if let Ok(v) = std::env::var("GATEWAY_MODEL") {
            self.gateway.model = v;
        }
        if let Ok(v) = std::env::var("AUTH_URL") {
            self.auth.provider_url = v;
        }
        if let Ok(v) = std::env::var("AUTH_SERVICE_KEY") {
            self.auth.service_key = v;
        }
    }

    /// Resolve the effective database URL.
    pub fn database_url(&self) -> String {
        self.database_url.clone().unwrap_or_else(|| {
            self.data_dir
                .join(&self.database_filename)
                .display()
                .to_string()
        })
    }

    /// Create a database context from these settings.
    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_url(&self.database_url())
    }

    /// Make sure the data directory exists before opening the database.
    pub fn ensure_data_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_database_url_lives_in_data_dir() {
        let settings = Settings::default();
        assert!(settings.database_url().ends_with(DEFAULT_DATABASE_FILENAME));
    }

    #[test]
    fn test_explicit_database_url_wins() {
        let settings = Settings {
            database_url: Some("sqlite:/tmp/other.db".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.database_url(), "sqlite:/tmp/other.db");
    }

    #[test]
    fn test_config_file_sections() {
        let file: ConfigFile = toml::from_str(
            r#"
            database_url = "sqlite:/srv/dealintel.db"

            [gateway]
            endpoint = "https://gateway.example.com/v1"
            model = "google/gemini-2.5-flash"

            [auth]
            provider_url = "https://auth.example.com"
            service_key = "svc-key"
            "#,
        )
        .unwrap();

        let mut settings = Settings::default();
        settings.apply_file(file);
        assert_eq!(settings.database_url(), "sqlite:/srv/dealintel.db");
        assert_eq!(settings.gateway.endpoint, "https://gateway.example.com/v1");
        assert_eq!(settings.auth.service_key, "svc-key");
        // Unset fields in a section keep their serde defaults.
        assert_eq!(settings.gateway.timeout_secs, 120);
    }
}
