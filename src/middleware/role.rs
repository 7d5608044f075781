//! Router-level role gates and ownership checks.
//!
//! Handlers usually take a `RequireAdmin`-style extractor. When every route
//! of a router shares the same requirement, the router applies one of the
//! middleware functions below as a `route_layer` instead.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use campusdesk_core::AppError;
use campusdesk_models::{UserId, UserRole};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: &[UserRole],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    // The extractor caches the user in the extensions, so handlers below reuse it.
    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;
    check_any_role(&auth_user, allowed_roles)?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, &[UserRole::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

pub fn check_any_role(auth_user: &AuthUser, allowed: &[UserRole]) -> Result<(), AppError> {
    if auth_user.has_any_role(allowed) {
        return Ok(());
    }
    let names: Vec<&str> = allowed.iter().map(UserRole::as_str).collect();
    Err(AppError::forbidden(format!(
        "Access denied. Required role: {}",
        names.join(" or ")
    )))
}

/// Passes for the owner of a resource or any admin.
pub fn ensure_owner_or_admin(
    auth_user: &AuthUser,
    owner_id: Option<UserId>,
    what: &str,
) -> Result<(), AppError> {
    if auth_user.is_admin() || owner_id == Some(auth_user.user_id) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Only the {} or an admin can do this",
            what
        )))
    }
}
