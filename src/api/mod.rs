//! HTTP interface - axum router, shared state and server lifecycle.
//!
//! Handlers only translate between HTTP and the `core` functions; every rule about
//! ratings, ownership and validation lives in `core`.

/// OpenAPI document and its route
pub mod docs;
/// Error rendering and rejection mapping
pub mod error;
/// Authentication and error-mapped extractors
pub mod extract;
/// Route handlers grouped by resource
pub mod handlers;

use crate::{
    config::settings::AppConfig,
    core::session::TokenKeys,
    errors::{Error, Result},
};
use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Connection pool
    pub db: DatabaseConnection,
    /// Startup configuration
    pub config: Arc<AppConfig>,
    /// JWT keys derived from the configured secrets
    pub keys: Arc<TokenKeys>,
}

impl AppState {
    /// Builds the state, deriving token keys from the configuration.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let keys = TokenKeys::new(&config.jwt_key, &config.jwt_refresh_key);
        Self {
            db,
            config: Arc::new(config),
            keys: Arc::new(keys),
        }
    }
}

fn cors_layer(config: &AppConfig) -> Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let Some(frontend_url) = &config.frontend_url else {
        return Ok(cors);
    };
    let origin = HeaderValue::from_str(frontend_url).map_err(|e| Error::Config {
        message: format!("Invalid FRONTEND_URL '{frontend_url}': {e}"),
    })?;
    Ok(cors.allow_origin(origin).allow_credentials(true))
}

/// Builds the application router with CORS and request tracing.
///
/// # Errors
/// Returns `Error::Config` if the configured frontend origin is not a valid header value.
pub fn router(state: AppState) -> Result<Router> {
    use handlers::{auth, products, reviews, users};

    let cors = cors_layer(&state.config)?;

    Ok(Router::new()
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .route("/auth", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:id",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route("/products/:id/reviews", get(reviews::list_reviews))
        .route("/reviews", post(reviews::create_review))
        .route(
            "/reviews/:review_id/product/:product_id",
            get(reviews::get_review)
                .patch(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .route(
            "/users",
            post(users::register)
                .get(users::list_users)
                .patch(users::update_profile),
        )
        .route("/users/profile/user", get(users::profile))
        .route("/users/admin/:id", patch(users::admin_update_user))
        .route("/users/:id", get(users::get_user).delete(users::delete_user))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

/// Binds the listener and serves until Ctrl+C or SIGTERM.
///
/// # Errors
/// Returns an error if the router cannot be built, the port cannot be bound, or the
/// server fails.
pub async fn serve(state: AppState) -> Result<()> {
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = router(state)?;

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
