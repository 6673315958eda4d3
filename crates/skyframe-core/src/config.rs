//! Configuration module
//!
//! Application configuration loaded from the environment (with `.env` support
//! for local development). Every setting has a development-friendly default;
//! the only secret is the inference-provider token, which may be left unset.
//! Without it uploads still work, job creation is rejected.

use std::env;
use std::time::Duration;

// Common constants / defaults
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MAX_UPLOAD_SIZE_MB: u64 = 500;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RESULT_FETCH_TIMEOUT_SECS: u64 = 300;
const DEFAULT_SCALE_FACTOR: u32 = 2;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub database_max_connections: u32,
    pub storage_path: String,
    pub storage_base_url: String,
    pub max_upload_size_mb: u64,
    pub allowed_content_types: Vec<String>,
    pub allowed_extensions: Vec<String>,
    pub replicate_api_token: String,
    pub replicate_api_base: String,
    pub default_model: String,
    pub scale_factor: u32,
    pub provider_timeout_secs: u64,
    pub result_fetch_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let port = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| "video/mp4,video/quicktime".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let allowed_extensions = env::var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| "mp4,mov".to_string())
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .collect();

        Ok(Config {
            environment,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://skyframe.db".to_string()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DEFAULT_DB_MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            storage_path: env::var("STORAGE_PATH").unwrap_or_else(|_| "./storage".to_string()),
            storage_base_url: env::var("STORAGE_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/media", port)),
            max_upload_size_mb: env::var("MAX_UPLOAD_SIZE_MB")
                .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_SIZE_MB.to_string())
                .parse()
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE_MB),
            allowed_content_types,
            allowed_extensions,
            replicate_api_token: env::var("REPLICATE_API_TOKEN").unwrap_or_default(),
            replicate_api_base: env::var("REPLICATE_API_BASE")
                .unwrap_or_else(|_| "https://api.replicate.com/v1".to_string()),
            default_model: env::var("DEFAULT_MODEL").unwrap_or_else(|_| "upscale".to_string()),
            scale_factor: env::var("SCALE_FACTOR")
                .unwrap_or_else(|_| DEFAULT_SCALE_FACTOR.to_string())
                .parse()
                .unwrap_or(DEFAULT_SCALE_FACTOR),
            provider_timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_PROVIDER_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
            result_fetch_timeout_secs: env::var("RESULT_FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_RESULT_FETCH_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_RESULT_FETCH_TIMEOUT_SECS),
            port,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Fail fast on settings that would make the service misbehave at runtime.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_path.trim().is_empty() {
            return Err(anyhow::anyhow!("STORAGE_PATH must not be empty"));
        }
        if self.max_upload_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be at least 1"));
        }
        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_CONTENT_TYPES must not be empty"));
        }
        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must not be empty"));
        }
        if self.scale_factor == 0 {
            return Err(anyhow::anyhow!("SCALE_FACTOR must be at least 1"));
        }
        Ok(())
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }

    /// Request timeout for provider submit/poll calls.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Timeout for downloading a finished artifact from the provider.
    pub fn result_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.result_fetch_timeout_secs)
    }

    /// Whether the inference provider credential is configured.
    pub fn ai_enabled(&self) -> bool {
        !self.replicate_api_token.is_empty()
    }
}
