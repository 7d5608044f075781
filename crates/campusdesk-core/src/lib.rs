//! # Campusdesk Core
//!
//! Foundational types shared by every Campusdesk crate:
//!
//! - [`errors`]: the application error type and its HTTP rendering
//! - [`pagination`]: query parameters and metadata for paginated listings
//! - [`password`]: bcrypt hashing and verification
//! - [`serde`]: serde helpers for loosely-typed query strings
//! - [`file_storage`]: storage backends for uploaded course documents
//!
//! # Example
//!
//! ```ignore
//! use campusdesk_core::errors::AppError;
//! use campusdesk_core::pagination::PaginationParams;
//!
//! let error = AppError::not_found(anyhow::anyhow!("Course not found"));
//! let params = PaginationParams::default();
//! let limit = params.limit();
//! ```

pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod password;
pub mod serde;

pub use errors::{AppError, ErrorResponse};
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
