use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub store: StoreConfig,
    pub identity: IdentityConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub reporter: ReporterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub connect_retry_wait_secs: u64,
    pub connect_total_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// RS256 ID tokens checked against the identity provider's published key set
    Jwks,
    /// HS256 tokens signed with `jwt_secret` (development and tests)
    SharedSecret,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub mode: IdentityMode,
    pub project_id: String,
    pub jwks_url: String,
    pub jwks_cache_secs: u64,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub token_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    pub sample_size: usize,
    pub reference_min_length: usize,
    pub max_examples: usize,
    pub output_path: String,
    pub descriptions_path: Option<String>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            sample_size: 5,
            reference_min_length: 15,
            max_examples: 2,
            output_path: "docs/database_structure.md".to_string(),
            descriptions_path: None,
        }
    }
}

const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Store overrides
        if let Ok(v) = env::var("STORE_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.store.backend = StoreBackend::Memory,
                "postgres" | "pg" => self.store.backend = StoreBackend::Postgres,
                other => tracing::warn!("Ignoring unknown STORE_BACKEND '{}'", other),
            }
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.store.database_url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.store.max_connections = v.parse().unwrap_or(self.store.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.store.connection_timeout = v.parse().unwrap_or(self.store.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_RETRY_WAIT_SECS") {
            self.store.connect_retry_wait_secs = v.parse().unwrap_or(self.store.connect_retry_wait_secs);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TOTAL_TIMEOUT_SECS") {
            self.store.connect_total_timeout_secs = v.parse().unwrap_or(self.store.connect_total_timeout_secs);
        }

        // Identity overrides
        if let Ok(v) = env::var("IDENTITY_MODE") {
            match v.to_ascii_lowercase().as_str() {
                "jwks" => self.identity.mode = IdentityMode::Jwks,
                "shared_secret" | "secret" => self.identity.mode = IdentityMode::SharedSecret,
                other => tracing::warn!("Ignoring unknown IDENTITY_MODE '{}'", other),
            }
        }
        if let Ok(v) = env::var("IDENTITY_PROJECT_ID") {
            self.identity.project_id = v;
        }
        if let Ok(v) = env::var("IDENTITY_JWKS_URL") {
            self.identity.jwks_url = v;
        }
        if let Ok(v) = env::var("IDENTITY_JWKS_CACHE_SECS") {
            self.identity.jwks_cache_secs = v.parse().unwrap_or(self.identity.jwks_cache_secs);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.identity.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.identity.token_expiry_hours = v.parse().unwrap_or(self.identity.token_expiry_hours);
        }

        // API overrides
        if let Some(port) = env::var("ELIO_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Reporter overrides
        if let Ok(v) = env::var("REPORTER_SAMPLE_SIZE") {
            self.reporter.sample_size = v.parse().unwrap_or(self.reporter.sample_size);
        }
        if let Ok(v) = env::var("REPORTER_REFERENCE_MIN_LENGTH") {
            self.reporter.reference_min_length = v.parse().unwrap_or(self.reporter.reference_min_length);
        }
        if let Ok(v) = env::var("REPORTER_OUTPUT_PATH") {
            self.reporter.output_path = v;
        }
        if let Ok(v) = env::var("REPORTER_DESCRIPTIONS_PATH") {
            self.reporter.descriptions_path = Some(v);
        }

        self
    }

    /// Local preset: in-memory store and shared-secret tokens
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database_url: None,
                max_connections: 5,
                connection_timeout: 30,
                connect_retry_wait_secs: 2,
                connect_total_timeout_secs: 30,
            },
            identity: IdentityConfig {
                mode: IdentityMode::SharedSecret,
                project_id: "elio-dev".to_string(),
                jwks_url: DEFAULT_JWKS_URL.to_string(),
                jwks_cache_secs: 3600,
                jwt_secret: "elio-development-secret".to_string(),
                token_expiry_hours: 24 * 7, // 1 week
            },
            api: ApiConfig {
                port: 5000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["*".to_string()],
            },
            reporter: ReporterConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                database_url: None,
                max_connections: 10,
                connection_timeout: 10,
                connect_retry_wait_secs: 5,
                connect_total_timeout_secs: 60,
            },
            identity: IdentityConfig {
                mode: IdentityMode::Jwks,
                project_id: String::new(),
                jwks_url: DEFAULT_JWKS_URL.to_string(),
                jwks_cache_secs: 3600,
                jwt_secret: String::new(),
                token_expiry_hours: 24,
            },
            api: ApiConfig {
                port: 5000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            reporter: ReporterConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                database_url: None,
                max_connections: 20,
                connection_timeout: 5,
                connect_retry_wait_secs: 5,
                connect_total_timeout_secs: 60,
            },
            identity: IdentityConfig {
                mode: IdentityMode::Jwks,
                project_id: String::new(),
                jwks_url: DEFAULT_JWKS_URL.to_string(),
                jwks_cache_secs: 3600,
                jwt_secret: String::new(),
                token_expiry_hours: 1,
            },
            api: ApiConfig {
                port: 5000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            reporter: ReporterConfig {
                sample_size: 10,
                ..ReporterConfig::default()
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
