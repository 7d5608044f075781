pub use campusdesk_models::documents::*;
