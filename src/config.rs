use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

const SECRET_KEY_ENV: &str = "STOCKKEEPER_SECRET_KEY";
const DATABASE_URL_ENV: &str = "STOCKKEEPER_DATABASE_URL";
const MIN_SECRET_KEY_BYTES: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub auth: AuthConfig,

    pub email: EmailConfig,

    pub accounts: AccountsConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/stockkeeper.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6790,
            cors_allowed_origins: vec![
                "http://localhost:6790".to_string(),
                "http://127.0.0.1:6790".to_string(),
            ],
        }
    }
}

/// Password hashing cost. The defaults land around 100ms per hash on
/// commodity hardware.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC key used to sign every token the service issues. There is no
    /// built-in value; `init` writes a random one.
    pub secret_key: String,

    /// Header carrying the bearer token.
    pub authorization_header: String,

    /// Prefix in front of the token inside the header, including the space.
    pub token_prefix: String,

    /// Lifetime of login tokens.
    pub token_expiration_after_days: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            authorization_header: "Authorization".to_string(),
            token_prefix: "Bearer ".to_string(),
            token_expiration_after_days: 14,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Lifetime of email verification tokens.
    pub token_expiration_after_minutes: u32,

    /// Page the verification link points at; the token is appended as `?token=`.
    pub verification_url: String,

    /// When set, verification mails are POSTed here as JSON.
    /// When unset, the link is only written to the log.
    pub webhook_url: Option<String>,

    pub sender: String,

    pub subject: String,

    pub request_timeout_seconds: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            token_expiration_after_minutes: 30,
            verification_url: "http://localhost:6790/verify-email".to_string(),
            webhook_url: None,
            sender: "no-reply@stockkeeper.local".to_string(),
            subject: "Verify your email address".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    pub username_min_length: usize,

    pub password_min_length: usize,

    /// Authority granted to every newly registered user.
    pub default_authority: String,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            username_min_length: 6,
            password_min_length: 8,
            default_authority: "ROLE_TRAINEE".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "stockkeeper".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_file()?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var(SECRET_KEY_ENV)
            && !secret.is_empty()
        {
            self.auth.secret_key = secret;
        }

        if let Ok(url) = std::env::var(DATABASE_URL_ENV)
            && !url.is_empty()
        {
            self.general.database_path = url;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("stockkeeper").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".stockkeeper").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes `config.toml` with a freshly generated signing key.
    /// Returns `false` when a config file already exists.
    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            return Ok(false);
        }

        let mut config = Self::default();
        config.auth.secret_key = generate_secret_key();
        config.save_to_path(&path)?;
        info!("Created default config file: {}", path.display());
        Ok(true)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.secret_key.is_empty() {
            anyhow::bail!("auth.secret_key is not set; run `stockkeeper init` or set {SECRET_KEY_ENV}");
        }

        if self.auth.secret_key.len() < MIN_SECRET_KEY_BYTES {
            anyhow::bail!("auth.secret_key must be at least {MIN_SECRET_KEY_BYTES} bytes");
        }

        if self.auth.token_prefix.is_empty() || self.auth.authorization_header.is_empty() {
            anyhow::bail!("auth.authorization_header and auth.token_prefix cannot be empty");
        }

        if self.auth.token_expiration_after_days == 0 {
            anyhow::bail!("auth.token_expiration_after_days must be > 0");
        }

        if self.email.token_expiration_after_minutes == 0 {
            anyhow::bail!("email.token_expiration_after_minutes must be > 0");
        }

        if self.accounts.username_min_length == 0 || self.accounts.password_min_length == 0 {
            anyhow::bail!("Minimum username and password lengths must be > 0");
        }

        if self.accounts.default_authority.trim().is_empty() {
            anyhow::bail!("accounts.default_authority cannot be empty");
        }

        url::Url::parse(&self.email.verification_url)
            .with_context(|| format!("Invalid email.verification_url: {}", self.email.verification_url))?;

        Ok(())
    }
}

/// Generate a random signing key (64 character hex string)
#[must_use]
pub fn generate_secret_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed_config() -> Config {
        let mut config = Config::default();
        config.auth.secret_key = generate_secret_key();
        config
    }

    #[test]
    fn test_default_config() {
        let config = keyed_config();
        assert_eq!(config.accounts.username_min_length, 6);
        assert_eq!(config.accounts.password_min_length, 8);
        assert_eq!(config.accounts.default_authority, "ROLE_TRAINEE");
        assert_eq!(config.auth.token_prefix, "Bearer ");
        assert_eq!(config.email.token_expiration_after_minutes, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_has_no_signing_key() {
        let config = Config::default();
        assert!(config.auth.secret_key.is_empty());

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auth.secret_key is not set"));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[auth]"));
        assert!(toml_str.contains("[accounts]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [email]
            token_expiration_after_minutes = 45
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.email.token_expiration_after_minutes, 45);

        assert_eq!(config.auth.authorization_header, "Authorization");
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut config = Config::default();
        config.auth.secret_key = "too-short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = keyed_config();
        config.email.token_expiration_after_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_generate_secret_key() {
        let key = generate_secret_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_secret_key());
    }
}
