//! Shared test utilities for the marketplace.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    api::{self, AppState},
    config::settings::{AppConfig, Environment},
    core::{product, session, user},
    entities::{
        self,
        product::{Category, Condition},
        user::{AccountStatus, Role},
    },
    errors::Result,
};
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tower::ServiceExt;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Installs a tracing subscriber that writes through the test harness.
/// Safe to call from every test; only the first call installs it.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Configuration with fixed secrets for router tests.
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        environment: Environment::Development,
        frontend_url: None,
        jwt_key: "test-access-secret".to_string(),
        jwt_refresh_key: "test-refresh-secret".to_string(),
        seed_file: "config.toml".to_string(),
    }
}

/// Inserts an active user directly, skipping password hashing.
///
/// # Defaults
/// * `email`: `<name>@example.com`, spaces replaced by dots
/// * `password_hash`: a placeholder that never verifies
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    role: Role,
) -> Result<entities::user::Model> {
    let now = chrono::Utc::now();
    let user = entities::user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(format!(
            "{}@example.com",
            name.to_lowercase().replace(' ', ".")
        )),
        password_hash: Set("not-a-real-hash".to_string()),
        role: Set(role),
        account_status: Set(AccountStatus::Active),
        token_version: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(user.insert(db).await?)
}

/// Registers a user through the real signup path, so the password can log in.
pub async fn create_user_with_password(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<entities::user::Model> {
    user::create_user(
        db,
        &user::NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        },
    )
    .await
}

/// A valid product draft.
///
/// # Defaults
/// * `price`: 10.0
/// * `quantity`: 1
/// * `category`: trading-card, `condition`: new, no brand
pub fn test_product_draft(name: &str) -> product::ProductDraft {
    product::ProductDraft {
        name: name.to_string(),
        image: "/images/sample.jpg".to_string(),
        description: "Near mint single from a private collection".to_string(),
        brand: None,
        category: Category::TradingCard,
        price: 10.0,
        quantity: 1,
        condition: Condition::New,
    }
}

/// Creates a test product listed by `seller_id`.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    seller_id: i64,
) -> Result<entities::product::Model> {
    product::create_product(db, seller_id, &test_product_draft(name)).await
}

/// Sets up a complete test environment with a seller and one of their products.
/// Returns (db, seller, product) for review and product tests.
pub async fn setup_with_product() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::product::Model,
)> {
    let db = setup_test_db().await?;
    let seller = create_test_user(&db, "seller", Role::User).await?;
    let product = create_test_product(&db, "Test Product", seller.id).await?;
    Ok((db, seller, product))
}

/// Builds app state over a fresh test database, plus the router serving it.
pub async fn setup_test_app() -> Result<(AppState, Router)> {
    let db = setup_test_db().await?;
    let state = AppState::new(db, test_config());
    let app = api::router(state.clone())?;
    Ok((state, app))
}

/// `Bearer` header value with a fresh access token for `user`.
pub fn bearer(state: &AppState, user: &entities::user::Model) -> Result<String> {
    let token = session::issue_access_token(&state.keys, user, false)?;
    Ok(format!("Bearer {token}"))
}

/// Sends one request through the router and returns status, headers and JSON body.
///
/// An empty response body is returned as `Value::Null`.
#[allow(clippy::unwrap_used)]
pub async fn send_full(
    app: &Router,
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(authorization) = authorization {
        request = request.header(header::AUTHORIZATION, authorization);
    }
    let request = match body {
        Some(json) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    read_response(app, request).await
}

/// Like [`send_full`] without the headers.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let (status, _, json) = send_full(app, method, uri, authorization, body).await;
    (status, json)
}

/// Sends a body-less request carrying a `Cookie` header.
#[allow(clippy::unwrap_used)]
pub async fn send_with_cookie(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: &str,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    read_response(app, request).await
}

#[allow(clippy::unwrap_used)]
async fn read_response(
    app: &Router,
    request: Request<Body>,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, headers, json)
}
