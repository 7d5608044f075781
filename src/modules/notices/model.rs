pub use campusdesk_models::notices::*;
