// src/config.rs

use std::{env, fmt, net::SocketAddr};

use dotenvy::dotenv;

/// Maximum number of questions in a single quiz session.
/// Attempts claiming more than this are treated as corrupt.
pub const MAX_SESSION_QUESTIONS: usize = 20;

/// Number of users shown on the global leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

/// Number of attempts shown on a category's top-scores board.
pub const CATEGORY_TOP_SCORES: usize = 3;

/// Display name used when a user has no profile name.
pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown";

/// Quiz categories offered to players.
pub const CATEGORIES: [&str; 9] = [
    "Art",
    "Music",
    "Olympic",
    "History",
    "Animals",
    "Travel",
    "IT",
    "Video Games",
    "Geography",
];

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. When unset the service runs on the in-memory store.
    pub database_url: Option<String>,
    /// Shared secret used to verify bearer tokens.
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub log_dir: String,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid(key, value) => write!(f, "{} has an invalid value: {}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::Invalid("BIND_ADDR", raw))?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr,
            log_dir,
        })
    }
}
