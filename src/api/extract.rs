//! Request extractors: the authenticated actor and error-mapped JSON/query/path.

use crate::{
    api::AppState,
    core::{
        access::{self, Actor},
        session,
    },
    entities::user::Role,
    errors::{Error, Result},
};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;

/// Name of the cookie carrying the access token.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// JSON body whose rejections become `Error::Validation`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections become `Error::Validation`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

/// Path parameters whose rejections become `Error::Validation`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// Value of the `Authorization: Bearer` header, if present.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    (scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty())
        .then(|| token.trim().to_string())
}

/// Value of the named cookie, if present and non-empty.
#[must_use]
pub fn cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// The caller, authenticated from the bearer header or the access-token cookie.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Actor);

impl AuthUser {
    /// Fails with `Error::InsufficientRole` unless the caller holds at least `minimum`.
    pub fn require(&self, minimum: Role) -> Result<&Actor> {
        if access::require_role(self.0.role, minimum) {
            Ok(&self.0)
        } else {
            Err(Error::InsufficientRole {
                required: minimum.to_string(),
            })
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_value(&CookieJar::from_headers(&parts.headers), ACCESS_COOKIE))
            .ok_or(Error::Unauthenticated)?;
        let actor = session::authenticate(&state.db, &state.keys, &token).await?;
        Ok(Self(actor))
    }
}
