/// Configuration management for Interaction Service
///
/// All settings come from environment variables (a `.env` file is loaded
/// first when present). Production refuses permissive defaults.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub moderation: ModerationConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Bearer token verification (RS256)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// PEM-encoded RSA public key; without it every authenticated request fails
    pub jwt_public_key_pem: Option<String>,
    pub jwt_issuer: Option<String>,
}

/// External classifier used to moderate new posts
#[derive(Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_ms: u64,
    /// Lowest issue severity that rejects a post (1 rejects any flagged verdict)
    pub reject_severity: u8,
}

impl fmt::Debug for ModerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModerationConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout_ms", &self.timeout_ms)
            .field("reject_severity", &self.reject_severity)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
            Ok(value) => value,
            Err(_) if production => {
                return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
            }
            Err(_) => "http://localhost:3000".to_string(),
        };
        if production && allowed_origins.trim() == "*" {
            return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
        }

        let jwt_public_key_pem = std::env::var("JWT_PUBLIC_KEY_PEM")
            .ok()
            .filter(|v| !v.trim().is_empty());
        if production && jwt_public_key_pem.is_none() {
            return Err("JWT_PUBLIC_KEY_PEM must be set in production".to_string());
        }

        let reject_severity: u8 = parse_env_or_default("MODERATION_REJECT_SEVERITY", 1)?;
        if !(1..=5).contains(&reject_severity) {
            return Err(format!(
                "MODERATION_REJECT_SEVERITY must be between 1 and 5, got {}",
                reject_severity
            ));
        }

        let api_key = std::env::var("MODERATION_API_KEY").unwrap_or_default();
        if production && api_key.trim().is_empty() {
            return Err("MODERATION_API_KEY must be set in production".to_string());
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("INTERACTION_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("INTERACTION_SERVICE_PORT", 8090)?,
            },
            cors: CorsConfig { allowed_origins },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/nova".to_string()),
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
                connect_timeout_secs: parse_env_or_default("DATABASE_CONNECT_TIMEOUT_SECS", 5)?,
            },
            auth: AuthConfig {
                jwt_public_key_pem,
                jwt_issuer: std::env::var("JWT_ISSUER").ok().filter(|s| !s.is_empty()),
            },
            moderation: ModerationConfig {
                api_base_url: std::env::var("MODERATION_API_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                api_key,
                model: std::env::var("MODERATION_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                timeout_ms: parse_env_or_default("MODERATION_TIMEOUT_MS", 10_000)?,
                reject_severity,
            },
        })
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
