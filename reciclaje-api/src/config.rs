//! Configuration management for the API server
//!
//! Configuration is read from environment variables once at startup. A `.env`
//! file in the working directory is loaded first when present.
//!
//! # Environment Variables
//!
//! - `API_HOST`: host to bind to (default: 0.0.0.0)
//! - `API_PORT`: port to bind to (default: 8080)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
//! - `JWT_SECRET`: token signing key, at least 32 characters (required)
//! - `CORS_ORIGINS`: comma separated origins, `*` for any (default: `*`)
//! - `PRODUCTION`: `true` enables secure cookies and HSTS (default: false)
//! - `PROTECTED_PATHS`: comma separated path prefixes that need a session
//! - `MAIL_API_URL`, `MAIL_API_KEY`, `MAIL_FROM`: mail API; mail is only
//!   enabled when all three are set
//! - `RUST_LOG`, `LOG_FORMAT`: read by the logging setup in `main`
//!
//! # Example
//!
//! ```no_run
//! use reciclaje_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use reciclaje_shared::{auth::guard::RouteGuard, mail::MailConfig};
use std::env;

/// Minimum length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,

    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,

    /// Secure cookies and HSTS
    pub production: bool,

    /// Path prefixes that need a session
    pub guard: RouteGuard,

    /// `None` when mail is not configured
    pub mail: Option<MailConfig>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Signing key. Generate with `openssl rand -hex 32`.
    pub secret: String,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Splits a comma separated list, dropping blanks
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `*` (alone or in the list) means any origin
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    let origins = parse_list(raw);

    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}

pub fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Mail settings when all three values are present
pub fn mail_config(api_url: Option<String>, api_key: Option<String>, from: Option<String>) -> Option<MailConfig> {
    Some(MailConfig {
        api_url: api_url?,
        api_key: api_key?,
        from: from?,
    })
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a number does not
    /// parse, or `JWT_SECRET` is too short.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = non_empty_var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = non_empty_var("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is not a valid port: {}", e))?;

        let database_url =
            non_empty_var("DATABASE_URL").ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = non_empty_var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is not a number: {}", e))?;

        let jwt_secret =
            non_empty_var("JWT_SECRET").ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LENGTH);
        }

        let cors_origins = parse_cors_origins(&non_empty_var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string()));
        let production = non_empty_var("PRODUCTION").map(|v| parse_bool(&v)).unwrap_or(false);

        let guard = match non_empty_var("PROTECTED_PATHS") {
            Some(raw) => RouteGuard::new(parse_list(&raw)),
            None => RouteGuard::default(),
        };

        let mail = mail_config(
            non_empty_var("MAIL_API_URL"),
            non_empty_var("MAIL_API_KEY"),
            non_empty_var("MAIL_FROM"),
        );

        Ok(Self {
            api: ApiConfig { host, port },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            cors_origins,
            production,
            guard,
            mail,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
