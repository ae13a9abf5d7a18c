// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use dotenvy::dotenv;

/// Default token lifetime: one day.
const DEFAULT_JWT_EXPIRATION: u64 = 86_400;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Allowed CORS origins (frontend dev server by default).
    pub cors_origins: Vec<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| parse_list(&raw))
            .unwrap_or_else(|_| vec!["http://localhost:5173".to_string()]);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration: parse_or("JWT_EXPIRATION", DEFAULT_JWT_EXPIRATION),
            rust_log,
            bind_addr: parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000))),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5),
            db_acquire_timeout_secs: parse_or("DB_ACQUIRE_TIMEOUT_SECS", 3),
            cors_origins,
            admin_username: non_empty_var("ADMIN_USERNAME"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
        }
    }
}

/// Reads and parses an env var, falling back to `default` when unset or invalid.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}, using default", key);
            default
        }),
        Err(_) => default,
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
