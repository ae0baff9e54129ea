//! User routes: self-service registration and profile, plus admin management.

use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath, ApiQuery, AuthUser},
    },
    core::{
        pagination::PageRequest,
        user::{self, AdminUserPatch, NewUser, UserFilter, UserPage, UserPatch},
    },
    entities::{
        UserModel,
        user::{AccountStatus, Role},
    },
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use utoipa::IntoParams;

/// Query string of `GET /users`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    name: Option<String>,
    email: Option<String>,
    role: Option<Role>,
    account_status: Option<AccountStatus>,
    page: Option<u64>,
    limit: Option<u64>,
}

/// `POST /users`
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = NewUser,
    responses(
        (status = 201, description = "Account created", body = UserModel),
        (status = 400, description = "Invalid registration or email taken"),
    ),
    security(())
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(new_user): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<UserModel>)> {
    let created = user::create_user(&state.db, &new_user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /users/profile/user`
#[utoipa::path(
    get,
    path = "/users/profile/user",
    tag = "users",
    responses(
        (status = 200, description = "The caller's account", body = UserModel),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<UserModel>> {
    Ok(Json(user::get_user(&state.db, actor.id).await?))
}

/// `PATCH /users`
#[utoipa::path(
    patch,
    path = "/users",
    tag = "users",
    request_body = UserPatch,
    responses(
        (status = 200, description = "Updated account", body = UserModel),
        (status = 400, description = "Invalid patch or email taken"),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<Json<UserModel>> {
    Ok(Json(
        user::update_own_profile(&state.db, actor.id, &patch).await?,
    ))
}

/// `GET /users` (admin)
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(UserQuery),
    responses(
        (status = 200, description = "One page of users, newest first", body = UserPage),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not an admin"),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<UserPage>> {
    caller.require(Role::Admin)?;
    let filter = UserFilter {
        name: query.name,
        email: query.email,
        role: query.role,
        account_status: query.account_status,
    };
    let page = PageRequest::new(query.page, query.limit);
    Ok(Json(user::list_users(&state.db, &filter, page).await?))
}

/// `GET /users/:id` (admin)
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserModel),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<UserModel>> {
    caller.require(Role::Admin)?;
    Ok(Json(user::get_user(&state.db, user_id).await?))
}

/// `PATCH /users/admin/:id` (admin)
#[utoipa::path(
    patch,
    path = "/users/admin/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    request_body = AdminUserPatch,
    responses(
        (status = 200, description = "Updated user", body = UserModel),
        (status = 400, description = "Invalid patch or email taken"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn admin_update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(patch): ApiJson<AdminUserPatch>,
) -> Result<Json<UserModel>> {
    caller.require(Role::Admin)?;
    Ok(Json(
        user::admin_update_user(&state.db, user_id, &patch).await?,
    ))
}

/// `DELETE /users/:id` (admin)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted user", body = UserModel),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<UserModel>> {
    caller.require(Role::Admin)?;
    Ok(Json(user::delete_user(&state.db, user_id).await?))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_profile() -> Result<()> {
        let (state, app) = setup_test_app().await?;

        let body = json!({ "name": "Alice", "email": "alice@example.com", "password": "Secret123" });
        let (status, created) = send(&app, "POST", "/users", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["role"], "user");
        assert!(created.get("passwordHash").is_none());
        assert!(created.get("password").is_none());

        let (status, json) = send(&app, "POST", "/users", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "User with this email already exists");

        let alice = user::get_user(&state.db, created["id"].as_i64().unwrap()).await?;
        let token = bearer(&state, &alice)?;
        let (status, profile) = send(&app, "GET", "/users/profile/user", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["email"], "alice@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn test_self_patch_rules() -> Result<()> {
        let (state, app) = setup_test_app().await?;
        let alice = create_test_user(&state.db, "alice", Role::User).await?;
        let token = bearer(&state, &alice)?;

        let (status, _) = send(&app, "PATCH", "/users", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            send(&app, "PATCH", "/users", Some(&token), Some(json!({ "role": "admin" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) =
            send(&app, "PATCH", "/users", Some(&token), Some(json!({ "name": "Alice B" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Alice B");
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin() -> Result<()> {
        let (state, app) = setup_test_app().await?;
        let moderator = create_test_user(&state.db, "moderator", Role::Moderator).await?;
        let admin = create_test_user(&state.db, "admin", Role::Admin).await?;
        let target = create_test_user(&state.db, "target", Role::User).await?;

        let moderator_token = bearer(&state, &moderator)?;
        let (status, json) = send(&app, "GET", "/users", Some(&moderator_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["authorizationError"], "Admin privileges required");

        let admin_token = bearer(&state, &admin)?;
        let (status, json) = send(&app, "GET", "/users?role=user", Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 1);

        let uri = format!("/users/admin/{}", target.id);
        let (status, json) = send(
            &app,
            "PATCH",
            &uri,
            Some(&admin_token),
            Some(json!({ "accountStatus": "suspended" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["accountStatus"], "suspended");

        let uri = format!("/users/{}", target.id);
        let (status, _) = send(&app, "DELETE", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_suspended_user_is_forbidden() -> Result<()> {
        let (state, app) = setup_test_app().await?;
        let alice = create_test_user(&state.db, "alice", Role::User).await?;
        let token = bearer(&state, &alice)?;

        let patch = AdminUserPatch {
            account_status: Some(AccountStatus::Suspended),
            ..Default::default()
        };
        user::admin_update_user(&state.db, alice.id, &patch).await?;

        let (status, json) = send(&app, "GET", "/users/profile/user", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["authorizationError"], "Account is suspended");
        Ok(())
    }
}
