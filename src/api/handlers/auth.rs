//! Authentication routes. Tokens are returned both as HttpOnly cookies and in the
//! `authorization` response header.

use crate::{
    api::{
        AppState,
        extract::{ACCESS_COOKIE, ApiJson, AuthUser, REFRESH_COOKIE, cookie_value},
    },
    core::session::{self, ACCESS_TOKEN_MINUTES, Credentials, LONG_LIVED_TOKEN_DAYS},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::State,
    http::header::AUTHORIZATION,
    response::{AppendHeaders, IntoResponse},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

/// Body of every auth response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageBody {
    /// Human-readable outcome
    message: String,
}

impl MessageBody {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

const fn access_cookie_age(remember_me: bool) -> time::Duration {
    if remember_me {
        time::Duration::days(LONG_LIVED_TOKEN_DAYS)
    } else {
        time::Duration::minutes(ACCESS_TOKEN_MINUTES)
    }
}

fn token_cookie(
    name: &'static str,
    value: String,
    max_age: time::Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(max_age)
        .build()
}

fn cleared_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = token_cookie(name, String::new(), time::Duration::ZERO, false);
    cookie.make_removal();
    cookie
}

/// `POST /auth`
#[utoipa::path(
    post,
    path = "/auth",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 200, description = "Tokens issued as cookies and in the authorization header", body = MessageBody),
        (status = 400, description = "Invalid email or password"),
        (status = 403, description = "Account is not active"),
    ),
    security(())
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<impl IntoResponse> {
    let session = session::login(&state.db, &state.keys, &credentials).await?;
    let secure = state.config.environment.is_production();

    let jar = jar
        .add(token_cookie(
            ACCESS_COOKIE,
            session.access_token.clone(),
            access_cookie_age(credentials.remember_me),
            secure,
        ))
        .add(token_cookie(
            REFRESH_COOKIE,
            session.refresh_token,
            access_cookie_age(true),
            secure,
        ));
    let headers = AppendHeaders([(AUTHORIZATION, session.access_token)]);
    Ok((jar, headers, MessageBody::new("Tokens issued")))
}

/// `POST /auth/refresh`
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "New access token issued", body = MessageBody),
        (status = 401, description = "Missing refresh cookie"),
        (status = 403, description = "Invalid or revoked refresh token"),
    ),
    security(())
)]
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse> {
    let refresh_token = cookie_value(&jar, REFRESH_COOKIE).ok_or(Error::Unauthenticated)?;
    let access_token = session::refresh(&state.db, &state.keys, &refresh_token).await?;
    let secure = state.config.environment.is_production();

    let jar = jar.add(token_cookie(
        ACCESS_COOKIE,
        access_token.clone(),
        access_cookie_age(true),
        secure,
    ));
    let headers = AppendHeaders([(AUTHORIZATION, access_token)]);
    Ok((jar, headers, MessageBody::new("New access token issued")))
}

/// `POST /auth/logout`
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Token cookies cleared", body = MessageBody),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn logout(AuthUser(actor): AuthUser, jar: CookieJar) -> impl IntoResponse {
    info!(user_id = actor.id, "User logged out");
    let jar = jar
        .add(cleared_cookie(ACCESS_COOKIE))
        .add(cleared_cookie(REFRESH_COOKIE));
    (jar, MessageBody::new("Logged out"))
}
