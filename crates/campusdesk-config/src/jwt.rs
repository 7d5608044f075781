use std::env;

use crate::{env_flag, env_parse};

pub const DEFAULT_TOKEN_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Session lifetime in seconds, also used as the cookie max-age
    pub expiry: i64,
    pub cookie_name: String,
    /// Adds `Secure` to the session cookie; enable behind HTTPS
    pub cookie_secure: bool,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "campusdesk-dev-secret-change-me".to_string()),
            expiry: env_parse("JWT_EXPIRY", DEFAULT_TOKEN_EXPIRY_SECS),
            cookie_name: env::var("AUTH_COOKIE_NAME").unwrap_or_else(|_| "token".to_string()),
            cookie_secure: env_flag("COOKIE_SECURE", false),
        }
    }

    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiry: DEFAULT_TOKEN_EXPIRY_SECS,
            cookie_name: "token".to_string(),
            cookie_secure: false,
        }
    }
}
