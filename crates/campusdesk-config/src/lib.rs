//! # Campusdesk Config
//!
//! Configuration structs loaded from environment variables. Each one has a
//! `from_env()` constructor that falls back to development defaults.
//!
//! - [`jwt`]: session token signing and the auth cookie
//! - [`cors`]: allowed browser origins
//! - [`email`]: SMTP delivery
//! - [`payment`]: payment gateway credentials
//! - [`storage`]: uploaded document storage
//! - [`server`]: ports and background task intervals
//!
//! ```ignore
//! use campusdesk_config::{JwtConfig, PaymentConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let payment_config = PaymentConfig::from_env();
//! ```

pub mod cors;
pub mod email;
pub mod jwt;
pub mod payment;
pub mod server;
pub mod storage;

pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use payment::PaymentConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;

pub(crate) fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(default)
}

pub(crate) fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
