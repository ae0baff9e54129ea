//! Session handling - password hashing, token issuance and request authentication.
//!
//! Passwords are stored as argon2 PHC strings. Sessions are stateless HS256 JWTs: a
//! short-lived access token and a longer-lived refresh token signed with a separate
//! key. Every token carries the user's `token_version`; bumping it (on password change)
//! invalidates every token issued before.

use crate::{
    core::access::Actor,
    entities::{User, user, user::AccountStatus},
    errors::{Error, Result},
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use tracing::{debug, info, instrument, warn};

/// Lifetime of an access token without remember-me.
pub const ACCESS_TOKEN_MINUTES: i64 = 15;
/// Lifetime of refresh tokens and of remember-me access tokens.
pub const LONG_LIVED_TOKEN_DAYS: i64 = 7;

/// Which of the two token families a JWT belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Presented on every authenticated request
    Access,
    /// Exchanged for a new access token
    Refresh,
}

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// Account status when the token was issued
    pub account_status: AccountStatus,
    /// User's token version when the token was issued
    pub token_version: i64,
    /// Token family
    pub kind: TokenKind,
    /// Expiry as a Unix timestamp
    pub exp: i64,
}

/// Signing and verification keys for both token families.
#[derive(Clone)]
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl TokenKeys {
    /// Builds keys from the two shared secrets.
    #[must_use]
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
        }
    }

    const fn encoding(&self, kind: TokenKind) -> &EncodingKey {
        match kind {
            TokenKind::Access => &self.access_encoding,
            TokenKind::Refresh => &self.refresh_encoding,
        }
    }

    const fn decoding(&self, kind: TokenKind) -> &DecodingKey {
        match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        }
    }
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}

/// Login request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Extends the access token lifetime to seven days
    #[serde(default)]
    pub remember_me: bool,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    /// The authenticated account
    pub user: user::Model,
    /// Signed access token
    pub access_token: String,
    /// Signed refresh token
    pub refresh_token: String,
}

/// Hashes a password into an argon2 PHC string with a fresh random salt.
///
/// # Errors
/// Returns `Error::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Checks a password against a stored PHC string.
///
/// # Errors
/// Returns `Error::PasswordHash` if the stored hash is malformed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn issue_token(
    keys: &TokenKeys,
    user: &user::Model,
    kind: TokenKind,
    lifetime: chrono::Duration,
) -> Result<String> {
    let claims = Claims {
        sub: user.id,
        account_status: user.account_status,
        token_version: user.token_version,
        kind,
        exp: (chrono::Utc::now() + lifetime).timestamp(),
    };
    Ok(encode(&Header::default(), &claims, keys.encoding(kind))?)
}

/// Signs an access token for `user`, valid 15 minutes or 7 days with remember-me.
///
/// # Errors
/// Returns `Error::Token` if signing fails.
pub fn issue_access_token(keys: &TokenKeys, user: &user::Model, remember_me: bool) -> Result<String> {
    let lifetime = if remember_me {
        chrono::Duration::days(LONG_LIVED_TOKEN_DAYS)
    } else {
        chrono::Duration::minutes(ACCESS_TOKEN_MINUTES)
    };
    issue_token(keys, user, TokenKind::Access, lifetime)
}

/// Signs a refresh token for `user`, valid 7 days.
///
/// # Errors
/// Returns `Error::Token` if signing fails.
pub fn issue_refresh_token(keys: &TokenKeys, user: &user::Model) -> Result<String> {
    issue_token(
        keys,
        user,
        TokenKind::Refresh,
        chrono::Duration::days(LONG_LIVED_TOKEN_DAYS),
    )
}

/// Verifies signature, expiry and family of a token.
///
/// # Errors
/// Returns `Error::InvalidToken` for any token that does not verify.
pub fn decode_token(keys: &TokenKeys, token: &str, kind: TokenKind) -> Result<Claims> {
    let data = decode::<Claims>(token, keys.decoding(kind), &Validation::default()).map_err(|e| {
        debug!(error = %e, "Token rejected");
        Error::InvalidToken
    })?;

    if data.claims.kind != kind {
        return Err(Error::InvalidToken);
    }
    Ok(data.claims)
}

/// Loads the user a token was issued to and checks it still may act.
async fn current_holder(db: &DatabaseConnection, claims: &Claims) -> Result<user::Model> {
    let user = User::find_by_id(claims.sub)
        .one(db)
        .await?
        .ok_or(Error::Unauthenticated)?;

    if user.account_status != AccountStatus::Active {
        return Err(Error::AccountInactive {
            status: user.account_status.to_string(),
        });
    }
    if user.token_version != claims.token_version {
        warn!(user_id = user.id, "Token from before a password change was presented");
        return Err(Error::InvalidToken);
    }
    Ok(user)
}

/// Checks credentials and opens a session.
///
/// # Errors
/// Returns an error if:
/// - The email is unknown or the password does not match (`Error::InvalidCredentials`)
/// - The account is not active
/// - Token signing fails
#[instrument(skip(db, keys, credentials), fields(email = %credentials.email))]
pub async fn login(
    db: &DatabaseConnection,
    keys: &TokenKeys,
    credentials: &Credentials,
) -> Result<Session> {
    let email = credentials.email.trim().to_lowercase();
    let user = User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if !verify_password(&credentials.password, &user.password_hash)? {
        warn!(user_id = user.id, "Failed login attempt");
        return Err(Error::InvalidCredentials);
    }
    if user.account_status != AccountStatus::Active {
        return Err(Error::AccountInactive {
            status: user.account_status.to_string(),
        });
    }

    let access_token = issue_access_token(keys, &user, credentials.remember_me)?;
    let refresh_token = issue_refresh_token(keys, &user)?;

    info!(user_id = user.id, "User logged in");
    Ok(Session {
        user,
        access_token,
        refresh_token,
    })
}

/// Exchanges a refresh token for a new long-lived access token.
///
/// # Errors
/// Returns `Error::InvalidToken` if the refresh token does not verify or predates a
/// password change, `Error::Unauthenticated` if the user no longer exists, and
/// `Error::AccountInactive` for non-active accounts.
#[instrument(skip_all)]
pub async fn refresh(db: &DatabaseConnection, keys: &TokenKeys, refresh_token: &str) -> Result<String> {
    let claims = decode_token(keys, refresh_token, TokenKind::Refresh)?;
    let user = current_holder(db, &claims).await?;
    debug!(user_id = user.id, "Access token refreshed");
    issue_access_token(keys, &user, true)
}

/// Resolves an access token to the acting identity.
///
/// # Errors
/// Returns `Error::InvalidToken` for bad, expired or stale tokens,
/// `Error::Unauthenticated` if the user was deleted, and `Error::AccountInactive`
/// for non-active accounts.
pub async fn authenticate(db: &DatabaseConnection, keys: &TokenKeys, access_token: &str) -> Result<Actor> {
    let claims = decode_token(keys, access_token, TokenKind::Access)?;
    let user = current_holder(db, &claims).await?;
    Ok(Actor {
        id: user.id,
        role: user.role,
    })
}
