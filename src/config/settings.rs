//! Application settings loaded from environment variables.
//!
//! `.env` is loaded by `main` before this runs, so values may come from either the
//! process environment or that file. The two JWT secrets are the only required
//! variables; everything else has a development-friendly default.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use std::{fmt, str::FromStr};
use tracing::debug;

/// Port the HTTP server listens on when `BACKEND_PORT` is unset.
pub const DEFAULT_PORT: u16 = 5001;

/// Seed file read in development when `SEED_FILE` is unset.
pub const DEFAULT_SEED_FILE: &str = "config.toml";

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development: seeds accounts, plain-HTTP cookies
    #[default]
    Development,
    /// Production: `Secure` cookies, no seeding
    Production,
}

impl Environment {
    /// Whether this is a production deployment.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(Error::Config {
                message: format!("Unknown APP_ENV '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Production => "production",
        })
    }
}

/// Everything the server needs to start.
#[derive(Clone)]
pub struct AppConfig {
    /// `SeaORM` connection string
    pub database_url: String,
    /// HTTP listen port
    pub port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Origin allowed by CORS, if any
    pub frontend_url: Option<String>,
    /// Secret for access tokens
    pub jwt_key: String,
    /// Secret for refresh tokens
    pub jwt_refresh_key: String,
    /// Path of the TOML seed file
    pub seed_file: String,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("frontend_url", &self.frontend_url)
            .field("seed_file", &self.seed_file)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// Returns `Error::Config` if a JWT secret is missing or a value does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `Error::Config` if a JWT secret is missing or a value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            non_empty(key).ok_or_else(|| Error::Config {
                message: format!("{key} must be set"),
            })
        };

        let port = match non_empty("BACKEND_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| Error::Config {
                message: format!("Invalid BACKEND_PORT '{raw}': {e}"),
            })?,
            None => DEFAULT_PORT,
        };
        let environment = non_empty("APP_ENV")
            .map(|raw| raw.parse::<Environment>())
            .transpose()?
            .unwrap_or_default();

        let config = Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            port,
            environment,
            frontend_url: non_empty("FRONTEND_URL"),
            jwt_key: required("JWT_KEY")?,
            jwt_refresh_key: required("JWT_REFRESH_KEY")?,
            seed_file: non_empty("SEED_FILE").unwrap_or_else(|| DEFAULT_SEED_FILE.to_string()),
        };
        debug!(?config, "Configuration loaded");
        Ok(config)
    }
}
