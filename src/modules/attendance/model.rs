pub use campusdesk_models::attendance::*;
