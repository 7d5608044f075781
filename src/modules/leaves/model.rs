pub use campusdesk_models::leaves::*;
