//! Request identity.
//!
//! The identity provider's edge authenticates the caller and forwards the
//! opaque subject id in `X-Clerk-User-Id`. Handlers resolve it to the
//! local `User` document.

use actix_web::HttpRequest;
use df_core::error::AppError;
use df_core::models::User;

use crate::error::ApiError;
use crate::AppState;

pub const IDENTITY_HEADER: &str = "X-Clerk-User-Id";

pub fn subject_id(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// The signed-in user, or `401`.
pub async fn require_user(req: &HttpRequest, state: &AppState) -> Result<User, ApiError> {
    let clerk_id = subject_id(req).ok_or_else(|| AppError::Unauthorized("sign in required".into()))?;
    match state.forum.users.get_user_by_clerk_id(&clerk_id).await {
        Ok(user) => Ok(user),
        Err(AppError::NotFound(..)) => Err(AppError::Unauthorized("unknown user".into()).into()),
        Err(other) => Err(other.into()),
    }
}

/// The signed-in user when there is one. Unknown subjects read as anonymous.
pub async fn optional_user(req: &HttpRequest, state: &AppState) -> Result<Option<User>, ApiError> {
    let Some(clerk_id) = subject_id(req) else {
        return Ok(None);
    };
    match state.forum.users.get_user_by_clerk_id(&clerk_id).await {
        Ok(user) => Ok(Some(user)),
        Err(AppError::NotFound(..)) => Ok(None),
        Err(other) => Err(other.into()),
    }
}
