pub use campusdesk_models::exams::*;
