pub use campusdesk_models::auth::*;
