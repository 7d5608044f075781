pub use campusdesk_models::users::*;
