pub mod activities;
pub mod attendance;
pub mod auth;
pub mod courses;
pub mod departments;
pub mod documents;
pub mod exams;
pub mod fees;
pub mod leaves;
pub mod notices;
pub mod notifications;
pub mod results;
pub mod schedules;
pub mod users;
