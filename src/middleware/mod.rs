//! Request authentication and role gates.
//!
//! 1. The client sends the session token as the `token` cookie or an
//!    `Authorization: Bearer` header.
//! 2. [`auth::AuthUser`] verifies it, loads the user row and caches the
//!    identity in the request extensions.
//! 3. Role extractors such as [`auth::RequireAdmin`] wrap `AuthUser` and
//!    answer 403 for any other role.
//!
//! ```ignore
//! async fn approve_course(RequireAdmin(admin): RequireAdmin, ...) -> Result<_, AppError> { ... }
//! ```

pub mod auth;
pub mod role;
