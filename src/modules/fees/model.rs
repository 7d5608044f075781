pub use campusdesk_models::fees::*;
