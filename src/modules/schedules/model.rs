pub use campusdesk_models::schedules::*;
