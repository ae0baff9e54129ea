//! Seed account loading from config.toml
//!
//! In development the server creates the accounts listed here on startup, so there is
//! always an administrator and a moderator to log in with. Existing accounts (matched
//! by email) are left alone.

use crate::entities::user::Role;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Structure of the seed file
#[derive(Debug, Deserialize)]
pub struct SeedConfig {
    /// Accounts to create
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

/// One seed account
#[derive(Debug, Deserialize, Clone)]
pub struct SeedUser {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Plain-text password, hashed on insert
    pub password: String,
    /// Role to grant
    #[serde(default = "default_role")]
    pub role: Role,
}

const fn default_role() -> Role {
    Role::User
}

/// Loads seed accounts from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_seed_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read seed file {}: {e}", path.as_ref().display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed file: {e}"),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_seed_config() {
        let toml_str = r#"
            [[users]]
            name = "Admin"
            email = "admin@email.com"
            password = "Aa12345678"
            role = "admin"

            [[users]]
            name = "Jane Doe"
            email = "jane@email.com"
            password = "Aa12345678"
        "#;

        let config: SeedConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[0].role, Role::Admin);
        assert_eq!(config.users[1].role, Role::User);
        assert_eq!(config.users[1].email, "jane@email.com");
    }

    #[test]
    fn test_unknown_role_rejected() {
        let toml_str = r#"
            [[users]]
            name = "Root"
            email = "root@email.com"
            password = "Aa12345678"
            role = "superuser"
        "#;
        assert!(toml::from_str::<SeedConfig>(toml_str).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = load_seed_config("does/not/exist.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
