//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Block types the updater may rewrite with the default transform
    /// (comma-separated `UPDATABLE_BLOCKS`).
    pub updatable_blocks: Vec<String>,

    /// Hex-encoded SHA-256 hashes of editor API tokens
    /// (comma-separated `EDITOR_TOKEN_HASHES`).
    pub editor_token_hashes: Vec<String>,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let updatable_blocks = env::var("UPDATABLE_BLOCKS")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let editor_token_hashes = env::var("EDITOR_TOKEN_HASHES")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|_| vec!["*".to_string()]);

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            updatable_blocks,
            editor_token_hashes,
            cors_allowed_origins,
        })
    }
}

/// Split a comma-separated value, dropping blank entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
