use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const RESET_TOKEN_BYTES: usize = 32;
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// A password-reset token: `token` goes in the email, only `hash` is stored.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub token: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

pub fn generate_reset_token(now: DateTime<Utc>) -> ResetToken {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);

    ResetToken {
        hash: hash_token(&token),
        token,
        expires_at: now + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
    }
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
