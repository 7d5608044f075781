//! # Campusdesk Auth
//!
//! Session tokens are HS256 JWTs carrying the user id, email and role.
//! The role in the token is informational; request authorization always
//! re-reads the user row.
//!
//! ```ignore
//! use campusdesk_auth::{create_access_token, verify_token};
//!
//! let token = create_access_token(user_id, "ada@college.edu", "student", &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
