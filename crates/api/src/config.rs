use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// Provider middleware the import gateway talks to
    pub provider_service: ProviderServiceConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// SHA-256 hex digests of the API keys allowed to call admin and action routes
    #[serde(default)]
    pub admin_api_key_hashes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderServiceConfig {
    /// Base URL of the provider middleware, e.g. http://provider-service:8081
    #[serde(default)]
    pub base_url: String,

    /// Sent verbatim in the Authorization header
    #[serde(default)]
    pub service_key: String,

    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Domain for synthesized emails of imported users without one
    #[serde(default = "default_email_domain")]
    pub default_email_domain: String,

    /// Maximum zero-time enrollments listed when a user had no activity this week
    #[serde(default = "default_enrollment_fallback_cap")]
    pub enrollment_fallback_cap: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_email_domain: default_email_domain(),
            enrollment_fallback_cap: default_enrollment_fallback_cap(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    1_048_576
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_provider_timeout() -> u64 {
    10
}
fn default_email_domain() -> String {
    "edsync.local".to_string()
}
fn default_enrollment_fallback_cap() -> usize {
    domain::services::DEFAULT_ENROLLMENT_FALLBACK_CAP
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with EDSYNC__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("EDSYNC")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.admin_api_key_hashes")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Builds the config from embedded defaults and the overrides only, without
    /// reading config files.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 1048576

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            admin_api_key_hashes = []

            [provider_service]
            base_url = "http://localhost:8081"
            service_key = "test-service-key"
            timeout_secs = 10

            [import]
            default_email_domain = "edsync.local"
            enrollment_fallback_cap = 7
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "EDSYNC__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.provider_service.base_url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "EDSYNC__PROVIDER_SERVICE__BASE_URL environment variable must be set".to_string(),
            ));
        }

        if self.provider_service.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "provider_service.timeout_secs must be positive".to_string(),
            ));
        }

        if self
            .security
            .admin_api_key_hashes
            .iter()
            .any(|h| h.len() != 64 || !h.chars().all(|c| c.is_ascii_hexdigit()))
        {
            return Err(ConfigValidationError::InvalidValue(
                "admin_api_key_hashes must be SHA-256 hex digests".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
