/// Database configuration and connection management
pub mod database;

/// Seed account loading from config.toml
pub mod seed;

/// Application settings from environment variables
pub mod settings;
