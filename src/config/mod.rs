use crate::imagery::DEFAULT_CLOUD_COVER_THRESHOLD;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_API_BASE_URL: &str = "https://earthengine.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub imagery: ImageryConfig,
}

/// Settings for the remote imagery analytics platform.
#[derive(Debug, Clone)]
pub struct ImageryConfig {
    pub api_base_url: String,
    pub project: Option<String>,
    pub service_account_file: Option<PathBuf>,
    pub service_account_key: Option<SecretString>,
    pub application_credentials: Option<PathBuf>,
    pub timeout_secs: u64,
    pub cloud_cover_threshold: f64,
}

/// Where the service-account key comes from, in resolution order.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    File(PathBuf),
    Inline(SecretString),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            imagery: ImageryConfig::default(),
        }
    }
}

impl Default for ImageryConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            project: None,
            service_account_file: None,
            service_account_key: None,
            application_credentials: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cloud_cover_threshold: DEFAULT_CLOUD_COVER_THRESHOLD,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(file_config) = Self::from_conf_file()? {
            config.apply_file(file_config);
        }

        if let Ok(host) = std::env::var("HOST") {
            config.host = host;
        }

        if let Ok(port) = std::env::var("PORT") {
            config.port = port.parse().unwrap_or(DEFAULT_PORT);
        }

        config.imagery.apply_env()?;

        if config.imagery.service_account_file.is_none() {
            let conventional = crate::paths::service_account_file()?;
            if conventional.is_file() {
                config.imagery.service_account_file = Some(conventional);
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn from_conf_file() -> Result<Option<FileConfig>> {
        let path = crate::paths::config_file()?;
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut file_config: FileConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        if let Some(key_path) = file_config.service_account_file.take() {
            file_config.service_account_file = Some(crate::paths::resolve(&key_path)?);
        }
        Ok(Some(file_config))
    }

    fn apply_file(&mut self, file_config: FileConfig) {
        if let Some(host) = file_config.host {
            self.host = host;
        }
        if let Some(port) = file_config.port {
            self.port = port;
        }
        if let Some(api_base_url) = file_config.api_base_url {
            self.imagery.api_base_url = api_base_url;
        }
        if let Some(project) = file_config.project {
            self.imagery.project = Some(project);
        }
        if let Some(path) = file_config.service_account_file {
            self.imagery.service_account_file = Some(path);
        }
        if let Some(timeout_secs) = file_config.timeout_secs {
            self.imagery.timeout_secs = timeout_secs;
        }
        if let Some(threshold) = file_config.cloud_cover_threshold {
            self.imagery.cloud_cover_threshold = threshold;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.imagery.timeout_secs == 0 {
            anyhow::bail!("Analysis timeout must be at least one second");
        }
        if !(0.0..=100.0).contains(&self.imagery.cloud_cover_threshold) {
            anyhow::bail!(
                "Cloud cover threshold must be a percentage, got {}",
                self.imagery.cloud_cover_threshold
            );
        }
        if self.imagery.api_base_url.trim().is_empty() {
            anyhow::bail!("Imagery API base URL cannot be empty");
        }
        Ok(())
    }
}

impl ImageryConfig {
    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("EE_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Ok(project) = std::env::var("EE_PROJECT") {
            self.project = Some(project);
        }
        if let Ok(path) = std::env::var("EE_SERVICE_ACCOUNT_FILE") {
            self.service_account_file = Some(PathBuf::from(path));
        }
        if let Ok(key) = std::env::var("GEE_SERVICE_ACCOUNT_KEY") {
            if !key.trim().is_empty() {
                self.service_account_key = Some(SecretString::from(key));
            }
        }
        if let Ok(path) = std::env::var("GOOGLE_APPLICATION_CREDENTIALS") {
            self.application_credentials = Some(PathBuf::from(path));
        }
        if let Ok(timeout) = std::env::var("ANALYSIS_TIMEOUT_SECS") {
            self.timeout_secs = timeout
                .parse()
                .with_context(|| format!("Invalid ANALYSIS_TIMEOUT_SECS '{}'", timeout))?;
        }
        if let Ok(threshold) = std::env::var("CLOUD_COVER_THRESHOLD") {
            self.cloud_cover_threshold = threshold
                .parse()
                .with_context(|| format!("Invalid CLOUD_COVER_THRESHOLD '{}'", threshold))?;
        }
        Ok(())
    }

    pub fn credential_source(&self) -> Option<CredentialSource> {
        if let Some(path) = &self.service_account_file {
            return Some(CredentialSource::File(path.clone()));
        }
        if let Some(key) = &self.service_account_key {
            return Some(CredentialSource::Inline(key.clone()));
        }
        self.application_credentials
            .as_ref()
            .map(|path| CredentialSource::File(path.clone()))
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    api_base_url: Option<String>,
    project: Option<String>,
    service_account_file: Option<PathBuf>,
    timeout_secs: Option<u64>,
    cloud_cover_threshold: Option<f64>,
}
