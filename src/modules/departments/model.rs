pub use campusdesk_models::departments::*;
