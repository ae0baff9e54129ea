//! OpenAPI description of the HTTP interface, served at `/api-docs/openapi.json`.

use crate::api::handlers::{auth, products, reviews, users};
use axum::Json;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

/// Name of the bearer-token security scheme referenced by protected routes.
pub const BEARER_SCHEME: &str = "bearerAuth";

/// The generated API document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "TCG Universe Marketplace API",
        version = "1.0.0",
        description = "Accounts, trading-card listings and product reviews"
    ),
    paths(
        auth::login,
        auth::refresh,
        auth::logout,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        reviews::list_reviews,
        reviews::get_review,
        reviews::create_review,
        reviews::update_review,
        reviews::delete_review,
        users::register,
        users::profile,
        users::update_profile,
        users::list_users,
        users::get_user,
        users::admin_update_user,
        users::delete_user,
    ),
    modifiers(&BearerAuth),
    security(("bearerAuth" = [])),
    tags(
        (name = "auth", description = "Login, token refresh and logout"),
        (name = "products", description = "Trading-card listings"),
        (name = "reviews", description = "Product reviews and ratings"),
        (name = "users", description = "Registration, profiles and administration"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// `GET /api-docs/openapi.json`
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
