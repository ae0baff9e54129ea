//! User entity - Represents marketplace accounts.
//!
//! Users are referenced by reviews (as authors) and products (as sellers) by id only.
//! Deleting a user never cascades into the product or review tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role of an account, ordered from least to most privileged.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer or seller
    #[sea_orm(string_value = "user")]
    User,
    /// Can moderate other users' reviews and listings
    #[sea_orm(string_value = "moderator")]
    Moderator,
    /// Full administrative access
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::User => "User",
            Self::Moderator => "Moderator",
            Self::Admin => "Admin",
        };
        f.write_str(name)
    }
}

/// Lifecycle state of an account. Only `Active` accounts may authenticate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Normal account
    #[sea_orm(string_value = "active")]
    Active,
    /// Deactivated by its owner
    #[sea_orm(string_value = "inactive")]
    Inactive,
    /// Blocked by an administrator
    #[sea_orm(string_value = "suspended")]
    Suspended,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        };
        f.write_str(name)
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = User)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login email, unique across accounts
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string, never serialized
    #[serde(skip_serializing, default)]
    #[schema(ignore)]
    pub password_hash: String,
    /// Privilege level
    pub role: Role,
    /// Whether the account may log in
    pub account_status: AccountStatus,
    /// Bumped on password change, invalidating previously issued tokens
    pub token_version: i64,
    /// When the account was created
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeUtc,
    /// When the account was last modified
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeUtc,
}

/// Users are only weakly referenced, so no relations are declared
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
