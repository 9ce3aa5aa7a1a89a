//! Authentication route handlers.
//!
//! The access token travels in the response body and is the client's to
//! hold; the refresh token travels only in an httpOnly cookie scoped to
//! `/api/auth`, so browser scripts never see it and it is only sent to
//! the refresh and logout endpoints.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::db::UserStore;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::UserProfile;
use crate::services::auth::{AuthError, AuthService, Session};
use crate::state::AppState;

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "replay_refresh";

/// The refresh cookie is only ever sent back to the auth endpoints.
const REFRESH_COOKIE_PATH: &str = "/api/auth";

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Session response body: the access token plus the sanitized user.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub user: UserProfile,
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> Result<Response> {
    let auth = AuthService::new(UserRepository::new(state.pool()), state.tokens());
    let session = auth.register(&body.username, &body.password).await?;

    Ok(session_response(StatusCode::CREATED, jar, session, state.config().tokens.refresh_ttl_secs))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<Response> {
    let auth = AuthService::new(UserRepository::new(state.pool()), state.tokens());
    let session = auth.login(&body.username, &body.password).await?;

    Ok(session_response(StatusCode::OK, jar, session, state.config().tokens.refresh_ttl_secs))
}

/// `POST /api/auth/refresh`
///
/// Rotates the refresh credential. A failed rotation clears the cookie
/// so the client does not retry a token that can never succeed again.
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Result<Response> {
    let Some(presented) = refresh_cookie_value(&jar) else {
        return Err(AppError::Unauthenticated(
            "missing refresh cookie".to_string(),
        ));
    };

    let auth = AuthService::new(UserRepository::new(state.pool()), state.tokens());
    match auth.rotate(&presented).await {
        Ok(session) => Ok(session_response(
            StatusCode::OK,
            jar,
            session,
            state.config().tokens.refresh_ttl_secs,
        )),
        Err(err @ AuthError::InvalidRefreshToken) => {
            let jar = jar.add(clear_refresh_cookie());
            Ok((jar, AppError::from(err).into_response()).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// `POST /api/auth/logout`
///
/// Revokes the presented refresh credential and clears the cookie. The
/// cookie is required; a request without one is rejected rather than
/// treated as an already-ended session.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response> {
    let Some(presented) = refresh_cookie_value(&jar) else {
        return Err(AppError::BadRequest("refresh token is required".to_string()));
    };

    let auth = AuthService::new(UserRepository::new(state.pool()), state.tokens());
    auth.logout(&presented).await?;

    let jar = jar.add(clear_refresh_cookie());
    Ok((jar, StatusCode::NO_CONTENT).into_response())
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserProfile>> {
    let user = UserRepository::new(state.pool())
        .find_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;

    Ok(Json(user.profile()))
}

fn session_response(
    status: StatusCode,
    jar: CookieJar,
    session: Session,
    refresh_ttl_secs: i64,
) -> Response {
    let jar = jar.add(refresh_cookie(&session.tokens.refresh, refresh_ttl_secs));
    let body = Json(SessionResponse {
        access_token: session.tokens.access,
        user: session.user.profile(),
    });

    (status, jar, body).into_response()
}

/// Read the refresh token out of the request's cookie jar.
fn refresh_cookie_value(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Build the httpOnly refresh cookie.
fn refresh_cookie(token: &str, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path(REFRESH_COOKIE_PATH.to_string())
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Build an expired cookie to clear the refresh token.
fn clear_refresh_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE.to_string(), String::new()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path(REFRESH_COOKIE_PATH.to_string())
        .max_age(Duration::ZERO)
        .build()
}
