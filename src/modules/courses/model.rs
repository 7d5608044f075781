pub use campusdesk_models::courses::*;
