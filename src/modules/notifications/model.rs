pub use campusdesk_models::notifications::*;
