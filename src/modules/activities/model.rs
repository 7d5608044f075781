pub use campusdesk_models::activities::*;
