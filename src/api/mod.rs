//! API handlers for Libris REST endpoints

pub mod auth;
pub mod books;
pub mod borrowings;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{error::AppError, models::user::AccessClaims, AppState};

/// Extractor for the authenticated user from a JWT access token.
///
/// Accepts a Bearer `Authorization` header or the HTTP-only `token` cookie
/// set by the auth endpoints.
pub struct AuthenticatedUser(pub AccessClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);

        let token = match bearer {
            Some(token) => token,
            None => CookieJar::from_headers(&parts.headers)
                .get(auth::ACCESS_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .ok_or_else(|| {
                    AppError::Authentication("Missing authentication token".to_string())
                })?,
        };

        let claims = state.services.auth.tokens.validate(&token)?;
        Ok(AuthenticatedUser(claims))
    }
}
