//! Application configuration.
//!
//! All environment-derived settings are read once at startup into an
//! immutable [`AppConfig`] which is shared behind an `Arc` through
//! `AppState`. Nothing else in the crate reads the environment.

use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Secret used when `APP_ENV=development` and no `JWT_SECRET` is configured.
const DEV_JWT_SECRET: &str = "dev-secret-do-not-use-in-production-change-me-now";

/// Configuration errors, each naming the offending variable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required in production")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Immutable process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_env: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub export_link_ttl: chrono::Duration,
    pub sweep_interval: Duration,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
    pub login_rate_per_minute: u32,
    pub bcrypt_cost: u32,
    pub default_role: String,
    pub admin: Option<AdminBootstrap>,
    pub public_base_url: String,
}

/// Credentials for the account created at startup when none exists.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build the configuration from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).filter(|v| !v.trim().is_empty()).cloned();

        let app_env = get("APP_ENV").unwrap_or_else(|| "production".to_string());
        let is_development = app_env.eq_ignore_ascii_case("development");

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if is_development => {
                warn!(
                    "JWT_SECRET not set! Using default secret for development. DO NOT USE IN PRODUCTION!"
                );
                DEV_JWT_SECRET.to_string()
            }
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        if jwt_secret.len() < 32 {
            if is_development {
                warn!("JWT_SECRET is less than 32 characters. Consider using a longer secret.");
            } else {
                return Err(ConfigError::Invalid {
                    name: "JWT_SECRET",
                    value: "<redacted>".to_string(),
                    reason: "must be at least 32 characters in production".to_string(),
                });
            }
        }

        let port = parse_or("PORT", get("PORT"), 8081u16)?;
        let token_ttl = parse_ttl("TOKEN_TTL_MINUTES", get("TOKEN_TTL_MINUTES"), 60)?;
        let export_link_ttl = parse_ttl(
            "EXPORT_LINK_TTL_MINUTES",
            get("EXPORT_LINK_TTL_MINUTES"),
            15,
        )?;
        let sweep_secs = parse_or("SWEEP_INTERVAL_SECS", get("SWEEP_INTERVAL_SECS"), 60u64)?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        let cookie_secure = parse_or("COOKIE_SECURE", get("COOKIE_SECURE"), !is_development)?;
        let login_rate_per_minute = parse_or(
            "LOGIN_RATE_PER_MINUTE",
            get("LOGIN_RATE_PER_MINUTE"),
            30u32,
        )?;
        let bcrypt_cost = parse_or("BCRYPT_COST", get("BCRYPT_COST"), bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: "must be between 4 and 31".to_string(),
            });
        }

        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap {
                email,
                password,
                name: get("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
            }),
            _ => None,
        };

        let public_base_url = get("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            app_env,
            port,
            database_url: get("DATABASE_URL"),
            jwt_secret,
            token_ttl,
            export_link_ttl,
            sweep_interval: Duration::from_secs(sweep_secs),
            cookie_secure,
            cors_origins,
            login_rate_per_minute,
            bcrypt_cost,
            default_role: get("DEFAULT_ROLE").unwrap_or_else(|| "viewer".to_string()),
            admin,
            public_base_url,
        })
    }

    /// Configuration suitable for tests: development mode, fast hashing,
    /// in-memory storage.
    pub fn for_tests() -> Self {
        Self {
            app_env: "development".to_string(),
            port: 0,
            database_url: None,
            jwt_secret: "test-secret-key-at-least-32-chars-long".to_string(),
            token_ttl: chrono::Duration::minutes(60),
            export_link_ttl: chrono::Duration::minutes(15),
            sweep_interval: Duration::from_secs(60),
            cookie_secure: false,
            cors_origins: Vec::new(),
            login_rate_per_minute: 1000,
            bcrypt_cost: 4,
            default_role: "viewer".to_string(),
            admin: None,
            public_base_url: "http://localhost".to_string(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }
}

/// Token lifetimes are capped at one year.
const MAX_TTL_MINUTES: i64 = 525_600;

fn parse_ttl(
    name: &'static str,
    raw: Option<String>,
    default: i64,
) -> Result<chrono::Duration, ConfigError> {
    let minutes = parse_or(name, raw, default)?;
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        return Err(ConfigError::Invalid {
            name,
            value: minutes.to_string(),
            reason: format!("must be between 1 and {} minutes", MAX_TTL_MINUTES),
        });
    }
    chrono::Duration::try_minutes(minutes).ok_or_else(|| ConfigError::Invalid {
        name,
        value: minutes.to_string(),
        reason: "out of range".to_string(),
    })
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}
