//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The client secret is loaded from the EBAY_CLIENT_SECRET env var or
//! client_secret_file, never stored in the TOML directly to avoid leaking
//! secrets. Without a `[client]` table the client settings are read from the
//! property store instead.

use ebay_auth::{ClientConfig, ClientSecret};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Env var carrying the client secret for an explicit `[client]` table
pub const CLIENT_SECRET_ENV: &str = "EBAY_CLIENT_SECRET";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub client: Option<ClientSection>,
}

/// Where tokens (and, without `[client]`, client settings) are persisted
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

/// Explicit client settings, overriding the property store
#[derive(Debug, Deserialize)]
pub struct ClientSection {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub response_type: Option<String>,
    #[serde(skip)]
    pub client_secret: Option<ClientSecret>,
    /// Path to a file containing the client secret (alternative to the env var)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
}

impl ClientSection {
    /// Build the flow's client config. `None` if no secret was resolved.
    pub fn client_config(&self) -> Option<ClientConfig> {
        let secret = self.client_secret.as_ref()?;
        let mut config = ClientConfig::new(
            self.client_id.as_str(),
            secret.clone(),
            self.redirect_uri.as_str(),
            self.scope.as_str(),
        );
        if let Some(url) = &self.auth_url {
            config = config.with_auth_url(url.as_str());
        }
        if let Some(url) = &self.token_url {
            config = config.with_token_url(url.as_str());
        }
        if let Some(response_type) = &self.response_type {
            config = config.with_response_type(response_type.as_str());
        }
        Some(config)
    }
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order (only with a `[client]` table):
    /// 1. EBAY_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if config.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(client) = config.client.as_mut() {
            for (name, url) in [("auth_url", &client.auth_url), ("token_url", &client.token_url)] {
                if let Some(url) = url {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        return Err(ConfigError::Invalid(format!(
                            "{name} must start with http:// or https://, got: {url}"
                        )));
                    }
                }
            }

            let env_secret = std::env::var(CLIENT_SECRET_ENV)
                .ok()
                .map(|secret| secret.trim().to_owned())
                .filter(|secret| !secret.is_empty());

            if let Some(secret) = env_secret {
                client.client_secret = Some(ClientSecret::new(secret));
            } else if let Some(ref secret_file) = client.client_secret_file {
                let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                    ConfigError::Invalid(format!(
                        "failed to read client_secret_file {}: {e}",
                        secret_file.display()
                    ))
                })?;
                let secret = secret.trim().to_owned();
                if !secret.is_empty() {
                    client.client_secret = Some(ClientSecret::new(secret));
                }
            }

            if client.client_secret.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "[client] requires a secret via {CLIENT_SECRET_ENV} or client_secret_file"
                )));
            }
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("ebay-oauth.toml")
    }
}
