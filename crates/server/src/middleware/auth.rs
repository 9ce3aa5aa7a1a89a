//! Authentication extractors.
//!
//! Route handlers take [`RequireAuth`] or [`RequireAdmin`] as an
//! argument to demand a valid bearer token. The token's claims alone
//! are not trusted: the user row is re-read so a deleted account is
//! locked out the moment its row disappears, access token or not.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::db::UserStore;
use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Extractor that requires a valid access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that additionally requires the admin role.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;

        if !user.role.is_admin() {
            return Err(AppError::Forbidden("admin role required".to_string()));
        }

        Ok(Self(user))
    }
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AppError> {
    let token = bearer_token(parts)?;

    let claims = state
        .tokens()
        .verify_access_token(token)
        .map_err(|err| AppError::Unauthenticated(err.to_string()))?;

    let user_id = claims
        .user_id()
        .map_err(|_| AppError::Unauthenticated("malformed token subject".to_string()))?;

    // Claims are only as fresh as the token; confirm the account still exists
    let user = UserRepository::new(state.pool())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("account no longer exists".to_string()))?;

    Ok(user.current())
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("missing authorization header".to_string()))?;

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("expected bearer token".to_string()))
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/users");
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).expect("valid request").into_parts().0
    }

    #[test]
    fn missing_header_is_rejected() {
        let parts = parts_with_auth(None);
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwdw=="));
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn empty_bearer_is_rejected() {
        let parts = parts_with_auth(Some("Bearer "));
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn bearer_token_is_extracted() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).expect("extracts"), "abc.def.ghi");
    }
}
