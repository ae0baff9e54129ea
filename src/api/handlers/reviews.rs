//! Review routes. Reviews are always addressed through their product.

use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath, ApiQuery, AuthUser},
    },
    core::{
        pagination::PageRequest,
        review::{self, ReviewDraft, ReviewFilter, ReviewPage, ReviewPatch},
    },
    entities::ReviewModel,
    errors::{Error, Result},
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query string of `GET /products/:id/reviews`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReviewQuery {
    /// Substring of the author's name, case-insensitive
    user: Option<String>,
    min_rating: Option<f64>,
    max_rating: Option<f64>,
    /// RFC 3339 instant or `YYYY-MM-DD`
    from_date: Option<String>,
    /// RFC 3339 instant or `YYYY-MM-DD`; a bare date includes the whole day
    to_date: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
}

/// Body of `POST /reviews`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateReviewRequest {
    product_id: i64,
    title: String,
    rating: f64,
    comment: String,
}

/// Body of `DELETE` responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct RemovedReview {
    message: String,
    review: ReviewModel,
}

/// Parses an RFC 3339 instant or a bare `YYYY-MM-DD` date.
///
/// A bare date as an upper bound covers the whole day.
fn parse_date_bound(field: &str, raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    let invalid = || Error::validation(format!("\"{field}\" must be a valid date"));
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let time = if end_of_day {
        NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).ok_or_else(invalid)?
    } else {
        NaiveTime::MIN
    };
    Ok(date.and_time(time).and_utc())
}

impl ReviewQuery {
    fn filter(&self) -> Result<ReviewFilter> {
        Ok(ReviewFilter {
            author: self.user.clone(),
            min_rating: self.min_rating,
            max_rating: self.max_rating,
            created_from: self
                .from_date
                .as_deref()
                .map(|raw| parse_date_bound("fromDate", raw, false))
                .transpose()?,
            created_to: self
                .to_date
                .as_deref()
                .map(|raw| parse_date_bound("toDate", raw, true))
                .transpose()?,
        })
    }
}

/// `GET /products/:id/reviews`
#[utoipa::path(
    get,
    path = "/products/{id}/reviews",
    tag = "reviews",
    params(("id" = i64, Path, description = "Product id"), ReviewQuery),
    responses(
        (status = 200, description = "One page of the product's reviews", body = ReviewPage),
        (status = 400, description = "Malformed filter"),
        (status = 404, description = "Product not found"),
    ),
    security(())
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Json<ReviewPage>> {
    let filter = query.filter()?;
    let page = PageRequest::new(query.page, query.limit);
    Ok(Json(
        review::list_reviews(&state.db, product_id, &filter, page).await?,
    ))
}

/// `GET /reviews/:review_id/product/:product_id`
#[utoipa::path(
    get,
    path = "/reviews/{review_id}/product/{product_id}",
    tag = "reviews",
    params(
        ("review_id" = i64, Path, description = "Review id"),
        ("product_id" = i64, Path, description = "Product id"),
    ),
    responses(
        (status = 200, description = "The review", body = ReviewModel),
        (status = 404, description = "Review or product not found"),
    ),
    security(())
)]
pub async fn get_review(
    State(state): State<AppState>,
    ApiPath((review_id, product_id)): ApiPath<(i64, i64)>,
) -> Result<Json<ReviewModel>> {
    Ok(Json(
        review::get_review(&state.db, product_id, review_id).await?,
    ))
}

/// `POST /reviews`
#[utoipa::path(
    post,
    path = "/reviews",
    tag = "reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created and product rating updated", body = ReviewModel),
        (status = 400, description = "Invalid review or already submitted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Concurrent review writes kept conflicting"),
    )
)]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(request): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewModel>)> {
    let draft = ReviewDraft {
        title: request.title,
        rating: request.rating,
        comment: request.comment,
    };
    let created = review::add_review(&state.db, request.product_id, actor.id, &draft).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /reviews/:review_id/product/:product_id`
#[utoipa::path(
    patch,
    path = "/reviews/{review_id}/product/{product_id}",
    tag = "reviews",
    params(
        ("review_id" = i64, Path, description = "Review id"),
        ("product_id" = i64, Path, description = "Product id"),
    ),
    request_body = ReviewPatch,
    responses(
        (status = 200, description = "Updated review", body = ReviewModel),
        (status = 400, description = "Invalid patch"),
        (status = 401, description = "Not the author"),
        (status = 404, description = "Review or product not found"),
        (status = 409, description = "Concurrent review writes kept conflicting"),
    )
)]
pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath((review_id, product_id)): ApiPath<(i64, i64)>,
    ApiJson(patch): ApiJson<ReviewPatch>,
) -> Result<Json<ReviewModel>> {
    Ok(Json(
        review::update_review(&state.db, product_id, review_id, actor.id, &patch).await?,
    ))
}

/// `DELETE /reviews/:review_id/product/:product_id`
#[utoipa::path(
    delete,
    path = "/reviews/{review_id}/product/{product_id}",
    tag = "reviews",
    params(
        ("review_id" = i64, Path, description = "Review id"),
        ("product_id" = i64, Path, description = "Product id"),
    ),
    responses(
        (status = 200, description = "Review removed and product rating updated", body = RemovedReview),
        (status = 401, description = "Neither the author nor a moderator"),
        (status = 404, description = "Review or product not found"),
        (status = 409, description = "Concurrent review writes kept conflicting"),
    )
)]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath((review_id, product_id)): ApiPath<(i64, i64)>,
) -> Result<Json<RemovedReview>> {
    let removed = review::remove_review(&state.db, product_id, review_id, &actor).await?;
    Ok(Json(RemovedReview {
        message: "Review deleted".to_string(),
        review: removed,
    }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::user::Role;
    use crate::test_utils::*;
    use serde_json::json;

    fn review_body(product_id: i64, rating: f64) -> serde_json::Value {
        json!({
            "productId": product_id,
            "title": "Solid purchase",
            "rating": rating,
            "comment": "Shipped fast and well packed"
        })
    }

    #[test]
    fn test_parse_date_bound() {
        let start = parse_date_bound("fromDate", "2024-03-01", false).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        let end = parse_date_bound("toDate", "2024-03-01", true).unwrap();
        assert!(end > start);
        assert_eq!(end.date_naive(), start.date_naive());

        let instant = parse_date_bound("fromDate", "2024-03-01T12:30:00+02:00", false).unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-03-01T10:30:00+00:00");

        assert!(matches!(
            parse_date_bound("fromDate", "March 1st", false),
            Err(Error::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_review_lifecycle_over_http() -> Result<()> {
        init_test_tracing();
        let (state, app) = setup_test_app().await?;
        let seller = create_test_user(&state.db, "seller", Role::User).await?;
        let alice = create_test_user(&state.db, "alice", Role::User).await?;
        let bob = create_test_user(&state.db, "bob", Role::User).await?;
        let product = create_test_product(&state.db, "Mewtwo holo", seller.id).await?;
        let alice_token = bearer(&state, &alice)?;
        let bob_token = bearer(&state, &bob)?;

        let (status, first) =
            send(&app, "POST", "/reviews", Some(&alice_token), Some(review_body(product.id, 4.0))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["authorId"], alice.id);

        let (status, _) =
            send(&app, "POST", "/reviews", Some(&bob_token), Some(review_body(product.id, 5.0))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, json) =
            send(&app, "POST", "/reviews", Some(&alice_token), Some(review_body(product.id, 1.0))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "You have already submitted a review for this product");

        let list_uri = format!("/products/{}/reviews", product.id);
        let (status, page) = send(&app, "GET", &list_uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 2);
        assert_eq!(page["rating"], 4.5);
        assert_eq!(page["totalPages"], 1);

        let review_uri = format!("/reviews/{}/product/{}", first["id"], product.id);
        let (status, json) =
            send(&app, "PATCH", &review_uri, Some(&bob_token), Some(json!({ "rating": 0 }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["authorizationError"], "Operation denied");

        let (status, json) = send(
            &app,
            "PATCH",
            &review_uri,
            Some(&alice_token),
            Some(json!({ "rating": 3, "productId": 99 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());

        let (status, json) =
            send(&app, "PATCH", &review_uri, Some(&alice_token), Some(json!({ "rating": 3 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["rating"], 3.0);

        let (_, page) = send(&app, "GET", &list_uri, None, None).await;
        assert_eq!(page["rating"], 4.0);

        let (status, json) = send(&app, "DELETE", &review_uri, Some(&alice_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Review deleted");

        let (status, _) = send(&app, "GET", &review_uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, page) = send(&app, "GET", &list_uri, None, None).await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["rating"], 5.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_review_errors() -> Result<()> {
        let (state, app) = setup_test_app().await?;
        let alice = create_test_user(&state.db, "alice", Role::User).await?;
        let token = bearer(&state, &alice)?;

        let (status, _) = send(&app, "POST", "/reviews", None, Some(review_body(1, 4.0))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, json) =
            send(&app, "POST", "/reviews", Some(&token), Some(review_body(404, 4.0))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Product not found");

        let (status, _) =
            send(&app, "POST", "/reviews", Some(&token), Some(review_body(1, 7.0))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_moderator_can_delete_any_review() -> Result<()> {
        let (state, app) = setup_test_app().await?;
        let seller = create_test_user(&state.db, "seller", Role::User).await?;
        let alice = create_test_user(&state.db, "alice", Role::User).await?;
        let moderator = create_test_user(&state.db, "moderator", Role::Moderator).await?;
        let product = create_test_product(&state.db, "Mewtwo holo", seller.id).await?;

        let alice_token = bearer(&state, &alice)?;
        let (_, created) =
            send(&app, "POST", "/reviews", Some(&alice_token), Some(review_body(product.id, 2.0))).await;

        let uri = format!("/reviews/{}/product/{}", created["id"], product.id);
        let seller_token = bearer(&state, &seller)?;
        let (status, _) = send(&app, "DELETE", &uri, Some(&seller_token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let moderator_token = bearer(&state, &moderator)?;
        let (status, _) = send(&app, "DELETE", &uri, Some(&moderator_token), None).await;
        assert_eq!(status, StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_reviews_query_filters() -> Result<()> {
        let (state, app) = setup_test_app().await?;
        let seller = create_test_user(&state.db, "seller", Role::User).await?;
        let product = create_test_product(&state.db, "Mewtwo holo", seller.id).await?;
        for (name, rating) in [("Alice Smith", 5.0), ("Bob Jones", 2.0), ("Carl Smithson", 4.0)] {
            let author = create_test_user(&state.db, name, Role::User).await?;
            let token = bearer(&state, &author)?;
            send(&app, "POST", "/reviews", Some(&token), Some(review_body(product.id, rating))).await;
        }

        let base = format!("/products/{}/reviews", product.id);
        let (_, page) = send(&app, "GET", &format!("{base}?user=smith&minRating=4.5"), None, None).await;
        assert_eq!(page["total"], 1);

        let (_, page) = send(&app, "GET", &format!("{base}?toDate=2000-01-01"), None, None).await;
        assert_eq!(page["total"], 0);

        let (status, _) = send(&app, "GET", &format!("{base}?fromDate=yesterday"), None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, page) = send(&app, "GET", &format!("{base}?limit=2&page=2"), None, None).await;
        assert_eq!(page["reviews"].as_array().unwrap().len(), 1);
        assert_eq!(page["page"], 2);
        Ok(())
    }
}
