use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use campusdesk_auth::verify_token;
use campusdesk_core::AppError;
use campusdesk_models::{AccountStatus, UserId, UserRole};

use crate::state::AppState;

/// The authenticated caller. Resolved once per request and cached in the
/// request extensions; the role always comes from the database row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_faculty(&self) -> bool {
        self.role == UserRole::Faculty
    }

    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        roles.contains(&self.role)
    }
}

/// Bearer header first, then the session cookie.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(cookie_name)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = extract_token(&parts.headers, &state.jwt_config.cookie_name)
            .ok_or_else(|| AppError::unauthorized("Not authenticated: no token provided"))?;

        let claims = verify_token(&token, &state.jwt_config)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))?;

        let (id, email, role, account_status) =
            sqlx::query_as::<_, (UserId, String, UserRole, AccountStatus)>(
                "SELECT id, email, role, account_status FROM users WHERE id = $1",
            )
            .bind(user_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

        if account_status != AccountStatus::Active {
            return Err(AppError::forbidden("Account is inactive"));
        }

        let auth_user = AuthUser {
            user_id: id,
            email,
            role,
        };
        parts.extensions.insert(auth_user.clone());

        Ok(auth_user)
    }
}

/// Generates an extractor that admits only the listed roles (403 otherwise).
macro_rules! require_role {
    ($name:ident, $label:literal, $($role:expr),+ $(,)?) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub AuthUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    <AuthUser as FromRequestParts<AppState>>::from_request_parts(parts, state)
                        .await?;

                if !auth_user.has_any_role(&[$($role),+]) {
                    return Err(AppError::forbidden(format!(
                        "Access denied. {} access required",
                        $label
                    )));
                }

                Ok($name(auth_user))
            }
        }
    };
}

require_role!(RequireAdmin, "Admin", UserRole::Admin);
require_role!(RequireStudent, "Student", UserRole::Student);
require_role!(
    RequireFacultyOrAdmin,
    "Faculty or admin",
    UserRole::Faculty,
    UserRole::Admin
);
require_role!(
    RequireFacultyOrStudent,
    "Faculty or student",
    UserRole::Faculty,
    UserRole::Student
);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_header_is_read() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(extract_token(&h, "token").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_is_read_when_no_header() {
        let h = headers(&[(header::COOKIE, "theme=dark; token=cookie-token")]);
        assert_eq!(extract_token(&h, "token").as_deref(), Some("cookie-token"));
    }

    #[test]
    fn header_wins_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "token=from-cookie"),
        ]);
        assert_eq!(extract_token(&h, "token").as_deref(), Some("from-header"));
    }

    #[test]
    fn missing_or_malformed_is_none() {
        assert!(extract_token(&HeaderMap::new(), "token").is_none());
        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert!(extract_token(&h, "token").is_none());
        let h = headers(&[(header::AUTHORIZATION, "Bearer ")]);
        assert!(extract_token(&h, "token").is_none());
    }

    #[test]
    fn role_helpers() {
        let user = AuthUser {
            user_id: UserId::new(),
            email: "f@college.edu".to_string(),
            role: UserRole::Faculty,
        };
        assert!(user.is_faculty());
        assert!(!user.is_admin());
        assert!(user.has_any_role(&[UserRole::Admin, UserRole::Faculty]));
        assert!(!user.has_any_role(&[UserRole::Student]));
    }
}
