//! # Campusdesk Models
//!
//! Database rows, request/response DTOs and typed ids for every Campusdesk
//! domain. Feature modules in the API crate re-export the module they own,
//! e.g. `pub use campusdesk_models::courses::*;`.

pub mod activities;
pub mod attendance;
pub mod auth;
pub mod courses;
pub mod departments;
pub mod documents;
pub mod exams;
pub mod fees;
pub mod ids;
pub mod leaves;
pub mod notices;
pub mod notifications;
pub mod results;
pub mod schedules;
pub mod users;

pub use ids::*;
pub use users::{AccountStatus, ApprovalStatus, User, UserRole};
