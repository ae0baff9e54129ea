//! Product routes.

use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath, ApiQuery, AuthUser},
    },
    core::{
        pagination::PageRequest,
        product::{self, ProductDraft, ProductFilter, ProductPage, ProductPatch},
    },
    entities::{
        ProductModel,
        product::{Category, Condition},
    },
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use utoipa::IntoParams;

/// Query string of `GET /products`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Substring of the brand, case-insensitive
    brand: Option<String>,
    category: Option<Category>,
    condition: Option<Condition>,
    min_rating: Option<f64>,
    page: Option<u64>,
    limit: Option<u64>,
}

/// `GET /products`
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    params(ProductQuery),
    responses(
        (status = 200, description = "One page of products, newest first", body = ProductPage),
        (status = 400, description = "Malformed filter"),
    ),
    security(())
)]
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<ProductPage>> {
    let filter = ProductFilter {
        brand: query.brand,
        category: query.category,
        condition: query.condition,
        min_rating: query.min_rating,
    };
    let page = PageRequest::new(query.page, query.limit);
    Ok(Json(product::list_products(&state.db, &filter, page).await?))
}

/// `GET /products/:id`
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = ProductModel),
        (status = 404, description = "Product not found"),
    ),
    security(())
)]
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<i64>,
) -> Result<Json<ProductModel>> {
    Ok(Json(product::get_product(&state.db, product_id).await?))
}

/// `POST /products`
#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    request_body = ProductDraft,
    responses(
        (status = 201, description = "Product listed by the caller", body = ProductModel),
        (status = 400, description = "Invalid product"),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(draft): ApiJson<ProductDraft>,
) -> Result<(StatusCode, Json<ProductModel>)> {
    let product = product::create_product(&state.db, actor.id, &draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PATCH /products/:id`
#[utoipa::path(
    patch,
    path = "/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductPatch,
    responses(
        (status = 200, description = "Updated product", body = ProductModel),
        (status = 400, description = "Invalid patch"),
        (status = 401, description = "Neither the seller nor a moderator"),
        (status = 404, description = "Product not found"),
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(product_id): ApiPath<i64>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<ProductModel>> {
    Ok(Json(
        product::update_product(&state.db, product_id, &actor, &patch).await?,
    ))
}

/// `DELETE /products/:id`
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Deleted product; its reviews are removed with it", body = ProductModel),
        (status = 401, description = "Neither the seller nor a moderator"),
        (status = 404, description = "Product not found"),
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(product_id): ApiPath<i64>,
) -> Result<Json<ProductModel>> {
    Ok(Json(
        product::delete_product(&state.db, product_id, &actor).await?,
    ))
}
