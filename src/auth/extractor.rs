use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::jwt::{self, ADMIN_ROLE};
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == ADMIN_ROLE {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

/// Bearer header first, then the `access_token` cookie. `None` when neither
/// is present.
fn bearer_or_cookie(parts: &Parts) -> Result<Option<String>, AppError> {
    if let Some(auth_header) = parts.headers.get("authorization") {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(Some(token.to_string()));
        }
    }

    let jar = CookieJar::from_headers(&parts.headers);
    Ok(jar.get("access_token").map(|cookie| cookie.value().to_string()))
}

fn authenticate(token: &str, state: &SharedState) -> Result<AuthUser, AppError> {
    let claims = jwt::decode_token(token, &state.config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
    Ok(AuthUser {
        user_id: claims.sub,
        role: claims.role,
    })
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_or_cookie(parts)? {
            Some(token) => authenticate(&token, state),
            None => Err(AppError::Unauthorized(
                "Missing authentication token".to_string(),
            )),
        }
    }
}

/// For public routes: a missing or unusable token means an anonymous user.
impl OptionalFromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Option<Self>, Self::Rejection> {
        let Ok(Some(token)) = bearer_or_cookie(parts) else {
            return Ok(None);
        };
        match authenticate(&token, state) {
            Ok(user) => Ok(Some(user)),
            Err(_) => {
                tracing::debug!("Ignoring invalid token on public route");
                Ok(None)
            }
        }
    }
}
