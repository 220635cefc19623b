// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration management for the Oura MCP server
//!
//! Credentials come from three places, in order of preference: an explicit
//! TOML config file, the JSON token file (written back after refresh), and
//! `OURA_*` environment variables. The token file only ever holds the
//! rotating token pair; client credentials stay in the environment.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::env_config;
use crate::oauth::{Credentials, TokenSink};

const TOKEN_FILE_ENV: &str = "OURA_TOKEN_FILE";
const DEFAULT_TOKEN_FILE: &str = ".oura_tokens.json";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Where refreshed tokens are persisted
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
}

fn default_token_file() -> PathBuf {
    std::env::var(TOKEN_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::config_dir()
                .map(|p| p.join("oura-mcp-server/tokens.json"))
                .unwrap_or_else(|| DEFAULT_TOKEN_FILE.into())
        })
}

/// On-disk shape of the token file.
#[derive(Debug, Deserialize, Serialize)]
struct TokenFile {
    access_token: String,
    refresh_token: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file when a path is given, otherwise
    /// from the token file and environment variables.
    pub fn load(path: Option<String>) -> Result<Self> {
        if let Some(path) = path {
            let content =
                fs::read_to_string(&path).context("Failed to read config file")?;
            return toml::from_str(&content).context("Failed to parse config file");
        }

        dotenv::dotenv().ok();

        let mut config = Config {
            access_token: std::env::var("OURA_ACCESS_TOKEN").ok(),
            refresh_token: std::env::var("OURA_REFRESH_TOKEN").ok(),
            client_id: env_config::oura_client_id(),
            client_secret: env_config::oura_client_secret(),
            token_file: default_token_file(),
        };

        // Tokens persisted by a previous refresh supersede the environment
        if let Some(tokens) = load_token_file(&config.token_file) {
            debug!("Loaded token pair from {}", config.token_file.display());
            config.access_token = Some(tokens.access_token);
            if tokens.refresh_token.is_some() {
                config.refresh_token = tokens.refresh_token;
            }
        }

        Ok(config)
    }

    /// Validate that required configuration is present.
    pub fn validate(&self) -> Result<()> {
        if self.access_token.as_deref().unwrap_or_default().is_empty() {
            bail!(
                "OURA_ACCESS_TOKEN is required but not set.\n\
                 Get your Personal Access Token from: \
                 https://cloud.ouraring.com/personal-access-tokens"
            );
        }

        let has_client_credentials = self.client_id.as_deref().is_some_and(|v| !v.is_empty())
            && self.client_secret.as_deref().is_some_and(|v| !v.is_empty());
        if self.refresh_token.is_some() && !has_client_credentials {
            bail!(
                "OURA_CLIENT_ID and OURA_CLIENT_SECRET are required when using \
                 OURA_REFRESH_TOKEN"
            );
        }

        Ok(())
    }

    /// Credential set for the [`crate::oauth::CredentialStore`].
    pub fn credentials(&self) -> Result<Credentials> {
        self.validate()?;
        Ok(Credentials {
            access_token: self.access_token.clone().unwrap_or_default(),
            refresh_token: self.refresh_token.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        })
    }

    /// Persistence sink writing rotated tokens back to the token file.
    pub fn token_sink(&self) -> FileTokenSink {
        FileTokenSink {
            path: self.token_file.clone(),
        }
    }
}

fn load_token_file(path: &Path) -> Option<TokenFile> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Writes the token pair to a local JSON file after each refresh.
pub struct FileTokenSink {
    path: PathBuf,
}

impl FileTokenSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenSink for FileTokenSink {
    async fn save(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let tokens = TokenFile {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
        };
        let content = serde_json::to_string_pretty(&tokens)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_sample_config() -> Config {
        Config {
            access_token: Some("test_access_token".to_string()),
            refresh_token: Some("test_refresh_token".to_string()),
            client_id: Some("test_client_id".to_string()),
            client_secret: Some("test_client_secret".to_string()),
            token_file: DEFAULT_TOKEN_FILE.into(),
        }
    }

    #[test]
    fn test_config_load_from_file() {
        let config_content = r#"
access_token = "file_access_token"
refresh_token = "file_refresh_token"
client_id = "file_client_id"
client_secret = "file_client_secret"
"#;
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, config_content).expect("Failed to write temp config");

        let config = Config::load(Some(config_path.to_string_lossy().to_string()))
            .expect("Failed to load config");

        assert_eq!(config.access_token, Some("file_access_token".to_string()));
        assert_eq!(config.refresh_token, Some("file_refresh_token".to_string()));
        assert_eq!(config.client_id, Some("file_client_id".to_string()));
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "this is not valid toml [[[").expect("Failed to write");

        let result = Config::load(Some(config_path.to_string_lossy().to_string()));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate_requires_access_token() {
        let mut config = create_sample_config();
        config.access_token = None;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("OURA_ACCESS_TOKEN is required"));
    }

    #[test]
    fn test_validate_refresh_needs_client_credentials() {
        let mut config = create_sample_config();
        config.client_secret = None;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("OURA_CLIENT_ID and OURA_CLIENT_SECRET are required"));
    }

    #[test]
    fn test_valid_config_produces_credentials() {
        let config = create_sample_config();
        let creds = config.credentials().expect("should produce credentials");
        assert_eq!(creds.access_token, "test_access_token");
        assert_eq!(creds.refresh_token, Some("test_refresh_token".to_string()));
    }

    #[test]
    fn test_static_token_config_is_valid() {
        let config = Config {
            access_token: Some("pat_token".to_string()),
            refresh_token: None,
            client_id: None,
            client_secret: None,
            token_file: DEFAULT_TOKEN_FILE.into(),
        };
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_token_sink_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let token_path = temp_dir.path().join("nested").join("tokens.json");

        let sink = FileTokenSink::new(&token_path);
        sink.save("new_access", Some("new_refresh"))
            .await
            .expect("Failed to save tokens");

        let tokens = load_token_file(&token_path).expect("Token file should parse");
        assert_eq!(tokens.access_token, "new_access");
        assert_eq!(tokens.refresh_token, Some("new_refresh".to_string()));
    }

    #[tokio::test]
    async fn test_token_sink_without_refresh_token() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let token_path = temp_dir.path().join("tokens.json");

        let sink = FileTokenSink::new(&token_path);
        sink.save("only_access", None)
            .await
            .expect("Failed to save tokens");

        let tokens = load_token_file(&token_path).expect("Token file should parse");
        assert_eq!(tokens.access_token, "only_access");
        assert!(tokens.refresh_token.is_none());
    }
}
