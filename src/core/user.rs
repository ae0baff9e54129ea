//! User business logic - registration, profiles and account administration.
//!
//! Emails are stored trimmed and lowercased and are unique across accounts. Any
//! password change re-hashes the password and bumps `token_version`, which logs the
//! account out everywhere.

use crate::{
    config::seed::SeedUser,
    core::{
        pagination::{PageMeta, PageRequest},
        session, validation,
    },
    entities::{
        User, user,
        user::{AccountStatus, Role},
    },
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use tracing::{debug, info, instrument};

/// Registration request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    /// Display name, 3 to 50 characters
    pub name: String,
    /// Login email
    pub email: String,
    /// Plain-text password, checked against the password policy
    pub password: String,
}

impl NewUser {
    /// Checks every field.
    pub fn validate(&self) -> Result<()> {
        validation::check_length("name", &self.name, 3, 50)?;
        validation::check_email(&self.email)?;
        validation::check_password(&self.password)
    }
}

/// Changes a user may make to their own account.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserPatch {
    /// New display name
    pub name: Option<String>,
    /// New login email
    pub email: Option<String>,
    /// New password
    pub password: Option<String>,
    /// `active` or `inactive`; suspension is reserved for administrators
    pub account_status: Option<AccountStatus>,
}

impl UserPatch {
    /// Requires at least one field and validates the ones present.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.account_status.is_none()
        {
            return Err(Error::validation("\"value\" must have at least 1 key"));
        }
        if self.account_status == Some(AccountStatus::Suspended) {
            return Err(Error::validation(
                "\"accountStatus\" must be one of [active, inactive]",
            ));
        }
        validate_account_fields(
            self.name.as_deref(),
            self.email.as_deref(),
            self.password.as_deref(),
        )
    }
}

/// Changes an administrator may make to any account.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminUserPatch {
    /// New display name
    pub name: Option<String>,
    /// New login email
    pub email: Option<String>,
    /// New password
    pub password: Option<String>,
    /// New role
    pub role: Option<Role>,
    /// Any account status, including `suspended`
    pub account_status: Option<AccountStatus>,
}

impl AdminUserPatch {
    /// Requires at least one field and validates the ones present.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
            && self.account_status.is_none()
        {
            return Err(Error::validation("\"value\" must have at least 1 key"));
        }
        validate_account_fields(
            self.name.as_deref(),
            self.email.as_deref(),
            self.password.as_deref(),
        )
    }
}

fn validate_account_fields(
    name: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<()> {
    if let Some(name) = name {
        validation::check_length("name", name, 3, 50)?;
    }
    if let Some(email) = email {
        validation::check_email(email)?;
    }
    if let Some(password) = password {
        validation::check_password(password)?;
    }
    Ok(())
}

/// Predicates for the admin user list. All optional, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    /// Case-insensitive substring of the email
    pub email: Option<String>,
    /// Exact role
    pub role: Option<Role>,
    /// Exact account status
    pub account_status: Option<AccountStatus>,
}

/// One page of users.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    /// Pagination metadata
    #[serde(flatten)]
    pub meta: PageMeta,
    /// Users on this page, newest first
    pub users: Vec<user::Model>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Fails if another account already uses `email`.
async fn ensure_email_free(db: &DatabaseConnection, email: &str, except_id: Option<i64>) -> Result<()> {
    let mut query = User::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except_id {
        query = query.filter(user::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(Error::validation("User with this email already exists"));
    }
    Ok(())
}

async fn insert_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<user::Model> {
    let email = normalize_email(email);
    ensure_email_free(db, &email, None).await?;

    let now = chrono::Utc::now();
    let user = user::ActiveModel {
        name: Set(name.trim().to_string()),
        email: Set(email),
        password_hash: Set(session::hash_password(password)?),
        role: Set(role),
        account_status: Set(AccountStatus::Active),
        token_version: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    user.insert(db).await.map_err(Into::into)
}

/// Registers a new account with role `user` and status `active`.
///
/// # Errors
/// Returns `Error::Validation` for invalid fields or an email already in use.
#[instrument(skip(db, new_user), fields(email = %new_user.email))]
pub async fn create_user(db: &DatabaseConnection, new_user: &NewUser) -> Result<user::Model> {
    new_user.validate()?;
    let user = insert_user(db, &new_user.name, &new_user.email, &new_user.password, Role::User).await?;
    info!(user_id = user.id, "User registered");
    Ok(user)
}

/// Retrieves a user by ID.
///
/// # Errors
/// Returns `Error::UserNotFound` if no such user exists.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })
}

/// Lists users, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_users(
    db: &DatabaseConnection,
    filter: &UserFilter,
    page: PageRequest,
) -> Result<UserPage> {
    let mut query = User::find();
    if let Some(name) = filter.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(user::Column::Name.like(validation::contains_literal(name)));
    }
    if let Some(email) = filter.email.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(user::Column::Email.like(validation::contains_literal(email)));
    }
    if let Some(role) = filter.role {
        query = query.filter(user::Column::Role.eq(role));
    }
    if let Some(status) = filter.account_status {
        query = query.filter(user::Column::AccountStatus.eq(status));
    }

    let paginator = query
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .paginate(db, page.limit);
    let total = paginator.num_items().await?;
    let users = paginator.fetch_page(page.index()).await?;

    Ok(UserPage {
        meta: page.meta(total),
        users,
    })
}

/// Copies name/email/password changes onto an active model.
async fn apply_account_fields(
    db: &DatabaseConnection,
    current: &user::Model,
    active: &mut user::ActiveModel,
    name: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<()> {
    if let Some(name) = name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(email) = email {
        let email = normalize_email(email);
        ensure_email_free(db, &email, Some(current.id)).await?;
        active.email = Set(email);
    }
    if let Some(password) = password {
        active.password_hash = Set(session::hash_password(password)?);
        active.token_version = Set(current.token_version + 1);
        debug!(user_id = current.id, "Password changed, outstanding tokens revoked");
    }
    Ok(())
}

/// Applies a self-service patch to the acting user's own account.
///
/// # Errors
/// Returns an error if the patch is empty or invalid, the email is taken, or the
/// user no longer exists.
#[instrument(skip(db, patch))]
pub async fn update_own_profile(
    db: &DatabaseConnection,
    actor_id: i64,
    patch: &UserPatch,
) -> Result<user::Model> {
    patch.validate()?;
    let current = get_user(db, actor_id).await?;
    let mut active: user::ActiveModel = current.clone().into();

    apply_account_fields(
        db,
        &current,
        &mut active,
        patch.name.as_deref(),
        patch.email.as_deref(),
        patch.password.as_deref(),
    )
    .await?;
    if let Some(status) = patch.account_status {
        active.account_status = Set(status);
    }
    active.updated_at = Set(chrono::Utc::now());

    let user = active.update(db).await?;
    info!("Profile updated");
    Ok(user)
}

/// Applies an administrator's patch to any account.
///
/// # Errors
/// Returns an error if the patch is empty or invalid, the email is taken, or the
/// user does not exist.
#[instrument(skip(db, patch))]
pub async fn admin_update_user(
    db: &DatabaseConnection,
    user_id: i64,
    patch: &AdminUserPatch,
) -> Result<user::Model> {
    patch.validate()?;
    let current = get_user(db, user_id).await?;
    let mut active: user::ActiveModel = current.clone().into();

    apply_account_fields(
        db,
        &current,
        &mut active,
        patch.name.as_deref(),
        patch.email.as_deref(),
        patch.password.as_deref(),
    )
    .await?;
    if let Some(role) = patch.role {
        active.role = Set(role);
    }
    if let Some(status) = patch.account_status {
        active.account_status = Set(status);
    }
    active.updated_at = Set(chrono::Utc::now());

    let user = active.update(db).await?;
    info!("User updated by administrator");
    Ok(user)
}

/// Deletes an account. Its reviews and listings stay and keep referring to its ID.
///
/// # Errors
/// Returns `Error::UserNotFound` if no such user exists.
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    let user = get_user(db, user_id).await?;
    User::delete_by_id(user_id).exec(db).await?;
    info!("User deleted");
    Ok(user)
}

/// Inserts the seed accounts that do not exist yet, matched by email.
///
/// Returns how many accounts were created.
///
/// # Errors
/// Returns an error if a seed entry is invalid or a database operation fails.
#[instrument(skip_all, fields(seeds = seeds.len()))]
pub async fn seed_users(db: &DatabaseConnection, seeds: &[SeedUser]) -> Result<usize> {
    let mut created = 0;
    for seed in seeds {
        let exists = User::find()
            .filter(user::Column::Email.eq(normalize_email(&seed.email)))
            .one(db)
            .await?
            .is_some();
        if exists {
            debug!(email = %seed.email, "Seed user already present");
            continue;
        }

        validate_account_fields(Some(&seed.name), Some(&seed.email), Some(&seed.password))?;
        insert_user(db, &seed.name, &seed.email, &seed.password, seed.role).await?;
        created += 1;
    }

    info!(created, "Seed users applied");
    Ok(created)
}
