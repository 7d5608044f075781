//! Shared utilities for the Campusdesk API.
//!
//! - [`db_errors`]: mapping constraint violations to HTTP errors
//! - [`email`]: SMTP delivery of password-reset mail
//! - [`expiry`]: background purge of expired notices and exams
//! - [`payment`]: the payment-intent gateway and its Stripe client
//! - [`tokens`]: password-reset token generation and hashing

pub mod db_errors;
pub mod email;
pub mod expiry;
pub mod payment;
pub mod tokens;
