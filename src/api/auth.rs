//! Authentication endpoints.
//!
//! Tokens travel as HTTP-only SameSite=Lax cookies; response bodies carry
//! only the user's id, email, role, and the access expiry.

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{json, Value};
use time::Duration;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{AuthResponse, IssuedTokens, LoginRequest, RegisterRequest},
};

pub const ACCESS_COOKIE: &str = "token";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn with_token_cookies(jar: CookieJar, tokens: &IssuedTokens, config: &AuthConfig) -> CookieJar {
    let access = Cookie::build((ACCESS_COOKIE, tokens.access_token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::minutes(config.access_token_minutes))
        .build();

    let refresh = Cookie::build((REFRESH_COOKIE, tokens.refresh_token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::days(config.refresh_token_days))
        .build();

    jar.add(access).add(refresh)
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::from(name);
    cookie.set_path("/");
    cookie
}

/// Register a new member account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created, token cookies set", body = AuthResponse),
        (status = 400, description = "Validation errors", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let tokens = state.services.auth.register(request).await?;
    let response = AuthResponse::from(&tokens);
    Ok((
        with_token_cookies(jar, &tokens, &state.config.auth),
        Json(response),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated, token cookies set", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let tokens = state.services.auth.login(request).await?;
    let response = AuthResponse::from(&tokens);
    Ok((
        with_token_cookies(jar, &tokens, &state.config.auth),
        Json(response),
    ))
}

/// Exchange an expired access token for a fresh credential pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "New token cookies set", body = AuthResponse),
        (status = 401, description = "Missing or invalid tokens", body = crate::error::ErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<crate::AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    if jar.get(REFRESH_COOKIE).is_none() {
        return Err(AppError::Authentication(
            "Refresh token not found".to_string(),
        ));
    }

    let access_token = jar
        .get(ACCESS_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .unwrap_or_default();

    let tokens = state.services.auth.refresh(&access_token).await?;
    let response = AuthResponse::from(&tokens);
    Ok((
        with_token_cookies(jar, &tokens, &state.config.auth),
        Json(response),
    ))
}

/// Log out by clearing the token cookies
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Cookies cleared")
    )
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar
        .remove(removal_cookie(ACCESS_COOKIE))
        .remove(removal_cookie(REFRESH_COOKIE));
    (jar, Json(json!({ "message": "Logged out successfully" })))
}
