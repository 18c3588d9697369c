//! Configuration loading for the Orbyt sync service.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `ORBYT_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application configuration derived from `ORBYT_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    /// 32-byte AES-256-GCM key, base64-encoded in the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto_key: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_client_secret: Option<String>,
    #[serde(default = "default_google_oauth_base")]
    pub google_oauth_base: String,
    #[serde(default = "default_google_api_base")]
    pub google_api_base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microsoft_client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microsoft_client_secret: Option<String>,
    #[serde(default = "default_microsoft_login_base")]
    pub microsoft_login_base: String,
    #[serde(default = "default_microsoft_graph_base")]
    pub microsoft_graph_base: String,
}

impl AppConfig {
    /// Parse the configured bind address
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Serialize the configuration with secrets redacted
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut redacted = self.clone();
        if redacted.crypto_key.is_some() {
            redacted.crypto_key = Some(b"[REDACTED]".to_vec());
        }
        if redacted.google_client_secret.is_some() {
            redacted.google_client_secret = Some("[REDACTED]".to_string());
        }
        if redacted.microsoft_client_secret.is_some() {
            redacted.microsoft_client_secret = Some("[REDACTED]".to_string());
        }
        serde_json::to_string(&redacted)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            crypto_key: None,
            google_client_id: None,
            google_client_secret: None,
            google_oauth_base: default_google_oauth_base(),
            google_api_base: default_google_api_base(),
            microsoft_client_id: None,
            microsoft_client_secret: None,
            microsoft_login_base: default_microsoft_login_base(),
            microsoft_graph_base: default_microsoft_graph_base(),
        }
    }
}

fn default_profile() -> String {
    "dev".to_string()
}

fn default_api_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5_000
}

fn default_google_oauth_base() -> String {
    "https://oauth2.googleapis.com".to_string()
}

fn default_google_api_base() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

fn default_microsoft_login_base() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_microsoft_graph_base() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid crypto key base64: {error}")]
    InvalidCryptoKeyBase64 { error: String },
    #[error("invalid crypto key length: expected 32 bytes, got {length}")]
    InvalidCryptoKeyLength { length: usize },
    #[error("invalid bind address: {value}")]
    InvalidBindAddr { value: String },
    #[error("failed to read env file {path}: {error}")]
    EnvFile { path: String, error: String },
}

/// Loads [`AppConfig`] from layered `.env` files and the process environment.
///
/// Precedence, lowest to highest: `.env`, `.env.{profile}`, process
/// environment. Only variables prefixed with `ORBYT_` are considered.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads configuration, layering env files under the process environment.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut layered = BTreeMap::new();

        self.merge_env_file(&mut layered, ".env")?;

        // Profile may itself come from .env; resolve before layering the
        // profile-specific file.
        let profile_hint = env::var("ORBYT_PROFILE")
            .ok()
            .or_else(|| layered.get("PROFILE").cloned())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_profile);
        self.merge_env_file(&mut layered, &format!(".env.{}", profile_hint))?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix("ORBYT_") {
                layered.insert(stripped.to_string(), value);
            }
        }

        let take = |layered: &mut BTreeMap<String, String>, key: &str| {
            layered.remove(key).filter(|v| !v.is_empty())
        };

        let profile = take(&mut layered, "PROFILE").unwrap_or(profile_hint);
        let api_bind_addr =
            take(&mut layered, "API_BIND_ADDR").unwrap_or_else(default_api_bind_addr);
        let log_level = take(&mut layered, "LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format = take(&mut layered, "LOG_FORMAT").unwrap_or_else(default_log_format);
        let database_url = take(&mut layered, "DATABASE_URL").unwrap_or_else(default_database_url);
        let db_max_connections = take(&mut layered, "DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms = take(&mut layered, "DB_ACQUIRE_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_acquire_timeout_ms);

        let crypto_key = match take(&mut layered, "CRYPTO_KEY") {
            Some(key_str) => {
                use base64::{Engine as _, engine::general_purpose};
                let bytes = general_purpose::STANDARD.decode(&key_str).map_err(|e| {
                    ConfigError::InvalidCryptoKeyBase64 {
                        error: e.to_string(),
                    }
                })?;
                if bytes.len() != 32 {
                    return Err(ConfigError::InvalidCryptoKeyLength {
                        length: bytes.len(),
                    });
                }
                Some(bytes)
            }
            None => None,
        };

        let google_client_id = take(&mut layered, "GOOGLE_CLIENT_ID");
        let google_client_secret = take(&mut layered, "GOOGLE_CLIENT_SECRET");
        let google_oauth_base =
            take(&mut layered, "GOOGLE_OAUTH_BASE").unwrap_or_else(default_google_oauth_base);
        let google_api_base =
            take(&mut layered, "GOOGLE_API_BASE").unwrap_or_else(default_google_api_base);
        let microsoft_client_id = take(&mut layered, "MICROSOFT_CLIENT_ID");
        let microsoft_client_secret = take(&mut layered, "MICROSOFT_CLIENT_SECRET");
        let microsoft_login_base = take(&mut layered, "MICROSOFT_LOGIN_BASE")
            .unwrap_or_else(default_microsoft_login_base);
        let microsoft_graph_base = take(&mut layered, "MICROSOFT_GRAPH_BASE")
            .unwrap_or_else(default_microsoft_graph_base);

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            crypto_key,
            google_client_id,
            google_client_secret,
            google_oauth_base,
            google_api_base,
            microsoft_client_id,
            microsoft_client_secret,
            microsoft_login_base,
            microsoft_graph_base,
        };

        if config.bind_addr().is_err() {
            return Err(ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
            });
        }

        Ok(config)
    }

    fn merge_env_file(
        &self,
        layered: &mut BTreeMap<String, String>,
        file_name: &str,
    ) -> Result<(), ConfigError> {
        let path = self.base_dir.join(file_name);
        if !path.exists() {
            return Ok(());
        }

        let iter = dotenvy::from_path_iter(&path).map_err(|e| ConfigError::EnvFile {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        for item in iter {
            let (key, value) = item.map_err(|e| ConfigError::EnvFile {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
            if let Some(stripped) = key.strip_prefix("ORBYT_") {
                layered.insert(stripped.to_string(), value);
            }
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.bind_addr().is_ok());
        assert_eq!(config.profile, "dev");
        assert_eq!(config.google_oauth_base, "https://oauth2.googleapis.com");
    }

    #[test]
    fn redacted_json_hides_secrets() {
        let config = AppConfig {
            google_client_secret: Some("super-secret".to_string()),
            microsoft_client_secret: Some("even-more-secret".to_string()),
            crypto_key: Some(vec![7u8; 32]),
            ..Default::default()
        };

        let json = config.redacted_json().unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("even-more-secret"));
        assert!(json.contains("[REDACTED]"));
    }

    #[test]
    fn loader_defaults_when_no_env_files() {
        let dir = std::env::temp_dir().join(format!("orbyt-sync-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let loader = ConfigLoader::with_base_dir(dir);

        let config = loader.load().unwrap();
        assert_eq!(config.api_bind_addr, default_api_bind_addr());
        assert_eq!(config.database_url, default_database_url());
    }

    #[test]
    fn env_file_values_are_layered() {
        let dir = std::env::temp_dir().join(format!("orbyt-sync-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(".env"),
            "ORBYT_LOG_LEVEL=debug\nORBYT_GOOGLE_CLIENT_ID=gid-123\nIGNORED_KEY=nope\n",
        )
        .unwrap();

        let loader = ConfigLoader::with_base_dir(dir);
        let config = loader.load().unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.google_client_id.as_deref(), Some("gid-123"));
    }

    #[test]
    fn crypto_key_must_be_32_bytes() {
        use base64::{Engine as _, engine::general_purpose};

        let dir = std::env::temp_dir().join(format!("orbyt-sync-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let short_key = general_purpose::STANDARD.encode([1u8; 16]);
        std::fs::write(dir.join(".env"), format!("ORBYT_CRYPTO_KEY={}\n", short_key)).unwrap();

        let loader = ConfigLoader::with_base_dir(dir);
        let err = loader.load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCryptoKeyLength { length: 16 }));
    }
}
