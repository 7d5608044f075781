pub use campusdesk_models::results::*;
