use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::auth::password::PasswordHashKind;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory with the pre-built site, served for every non-API path
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only enable behind a reverse proxy that overwrites these headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            public_dir: default_public_dir(),
            trust_proxy_headers: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("./public")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// Argon2 PHC string or bcrypt hash (see `atelier hash-password`)
    #[serde(default)]
    pub admin_password_hash: Option<String>,
    /// Accept the bootstrap password while no hash is configured
    #[serde(default)]
    pub allow_default_password: bool,
    /// HMAC key for session tokens; a random per-process key is used when unset
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Mark the session cookie `Secure` (enable behind HTTPS)
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password_hash: None,
            allow_default_password: false,
            jwt_secret: None,
            session_ttl_hours: default_session_ttl_hours(),
            secure_cookie: false,
        }
    }
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_session_ttl_hours() -> i64 {
    24
}

/// Minimum accepted length of a configured JWT secret, in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted session lifetime (30 days)
pub const MAX_SESSION_TTL_HOURS: i64 = 30 * 24;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Projects document; defaults to `<data_dir>/projects.json`
    #[serde(default)]
    pub projects_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    /// URL path the upload directory is served under
    #[serde(default = "default_upload_url_prefix")]
    pub url_prefix: String,
    #[serde(default = "default_upload_max_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            url_prefix: default_upload_url_prefix(),
            max_bytes: default_upload_max_bytes(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./public/portfolio")
}

fn default_upload_url_prefix() -> String {
    "/portfolio".to_string()
}

fn default_upload_max_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Accepted contact submissions per client and window
    #[serde(default = "default_contact_max_requests")]
    pub contact_max_requests: u32,
    #[serde(default = "default_contact_window_seconds")]
    pub contact_window_seconds: u64,
    /// Seconds between purges of expired windows
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            contact_max_requests: default_contact_max_requests(),
            contact_window_seconds: default_contact_window_seconds(),
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_contact_max_requests() -> u32 {
    5
}

fn default_contact_window_seconds() -> u64 {
    15 * 60
}

fn default_cleanup_interval() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    /// Override selected settings from `ATELIER_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = std::env::var("ATELIER_ADMIN_USERNAME") {
            self.auth.admin_username = v;
        }
        if let Ok(v) = std::env::var("ATELIER_ADMIN_PASSWORD_HASH") {
            self.auth.admin_password_hash = Some(v);
        }
        if let Ok(v) = std::env::var("ATELIER_JWT_SECRET") {
            self.auth.jwt_secret = Some(v);
        }
        if let Ok(v) = std::env::var("ATELIER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = std::env::var("ATELIER_PORT") {
            self.server.port = v.parse().map_err(|e| {
                ConfigError::InvalidValue("ATELIER_PORT".to_string(), format!("{}: {}", e, v))
            })?;
        }
        if let Ok(v) = std::env::var("ATELIER_DATA_DIR") {
            self.server.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ATELIER_TRUST_PROXY_HEADERS") {
            self.server.trust_proxy_headers = v.parse().map_err(|e| {
                ConfigError::InvalidValue(
                    "ATELIER_TRUST_PROXY_HEADERS".to_string(),
                    format!("{}: {}", e, v),
                )
            })?;
        }
        Ok(())
    }

    /// Reject settings the server cannot run safely with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.admin_username.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "auth.admin_username".to_string(),
                "cannot be empty".to_string(),
            ));
        }

        if let Some(hash) = self.admin_password_hash() {
            if PasswordHashKind::detect(hash).is_none() {
                return Err(ConfigError::InvalidValue(
                    "auth.admin_password_hash".to_string(),
                    "not an Argon2 PHC string or bcrypt hash".to_string(),
                ));
            }
        }

        if let Some(secret) = &self.auth.jwt_secret {
            if secret.len() < MIN_JWT_SECRET_LEN {
                return Err(ConfigError::InvalidValue(
                    "auth.jwt_secret".to_string(),
                    format!("must be at least {} bytes", MIN_JWT_SECRET_LEN),
                ));
            }
        }

        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.auth.session_ttl_hours) {
            return Err(ConfigError::InvalidValue(
                "auth.session_ttl_hours".to_string(),
                format!("must be between 1 and {}", MAX_SESSION_TTL_HOURS),
            ));
        }

        if self.uploads.max_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "uploads.max_bytes".to_string(),
                "must be positive".to_string(),
            ));
        }

        let prefix = self.uploads.url_prefix.trim_end_matches('/');
        if !prefix.starts_with('/') || prefix.is_empty() {
            return Err(ConfigError::InvalidValue(
                "uploads.url_prefix".to_string(),
                "must be an absolute path below /".to_string(),
            ));
        }

        if self.rate_limit.contact_max_requests == 0 {
            return Err(ConfigError::InvalidValue(
                "rate_limit.contact_max_requests".to_string(),
                "must be positive".to_string(),
            ));
        }

        if self.rate_limit.contact_window_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "rate_limit.contact_window_seconds".to_string(),
                "must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// The configured password hash, treating blank values as unset
    pub fn admin_password_hash(&self) -> Option<&str> {
        self.auth
            .admin_password_hash
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }

    pub fn projects_file(&self) -> PathBuf {
        self.storage
            .projects_file
            .clone()
            .unwrap_or_else(|| self.server.data_dir.join("projects.json"))
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            uploads: UploadConfig::default(),
            rate_limit: RateLimitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.admin_username, "admin");
        assert_eq!(config.auth.session_ttl_hours, 24);
        assert!(!config.auth.allow_default_password);
        assert_eq!(config.uploads.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.uploads.url_prefix, "/portfolio");
        assert_eq!(config.rate_limit.contact_max_requests, 5);
        assert_eq!(config.rate_limit.contact_window_seconds, 900);
        assert_eq!(config.projects_file(), PathBuf::from("./data/projects.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_section_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 8088

            [auth]
            admin_username = "studio"

            [storage]
            projects_file = "/srv/atelier/projects.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.admin_username, "studio");
        assert_eq!(config.auth.session_ttl_hours, 24);
        assert_eq!(
            config.projects_file(),
            PathBuf::from("/srv/atelier/projects.json")
        );
    }

    #[test]
    fn test_rejects_unrecognised_password_hash() {
        let mut config = Config::default();
        config.auth.admin_password_hash = Some("IN25d.SI16whREjMN".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(ref f, _)) if f == "auth.admin_password_hash"
        ));
    }

    #[test]
    fn test_blank_password_hash_is_unset() {
        let mut config = Config::default();
        config.auth.admin_password_hash = Some("   ".to_string());
        assert!(config.admin_password_hash().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_short_jwt_secret() {
        let mut config = Config::default();
        config.auth.jwt_secret = Some("short".to_string());
        assert!(config.validate().is_err());

        config.auth.jwt_secret = Some("x".repeat(MIN_JWT_SECRET_LEN));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_limits() {
        let mut config = Config::default();
        config.uploads.max_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rate_limit.contact_window_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rate_limit.contact_max_requests = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(ref f, _)) if f == "rate_limit.contact_max_requests"
        ));
    }

    #[test]
    fn test_session_ttl_bounds() {
        let mut config = Config::default();
        for bad in [0, -1, MAX_SESSION_TTL_HOURS + 1, i64::MAX] {
            config.auth.session_ttl_hours = bad;
            assert!(config.validate().is_err(), "{} accepted", bad);
        }
        config.auth.session_ttl_hours = MAX_SESSION_TTL_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_argon2_string_without_digest() {
        let mut config = Config::default();
        for bad in ["$argon2id$garbage", "$argon2id$v=19$m=19456,t=2,p=1$onlysalt"] {
            config.auth.admin_password_hash = Some(bad.to_string());
            assert!(config.validate().is_err(), "{:?} accepted", bad);
        }
    }

    #[test]
    fn test_proxy_headers_untrusted_by_default() {
        let config = Config::from_toml("").unwrap();
        assert!(!config.server.trust_proxy_headers);

        let config = Config::from_toml("[server]\ntrust_proxy_headers = true\n").unwrap();
        assert!(config.server.trust_proxy_headers);
    }

    #[test]
    fn test_upload_prefix_must_be_a_subpath() {
        let mut config = Config::default();
        for bad in ["portfolio", "/", ""] {
            config.uploads.url_prefix = bad.to_string();
            assert!(config.validate().is_err(), "{:?} accepted", bad);
        }
        config.uploads.url_prefix = "/media/portfolio/".to_string();
        assert!(config.validate().is_ok());
    }
}
