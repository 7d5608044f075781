use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use campusdesk_config::JwtConfig;
use campusdesk_core::AppError;

use crate::claims::Claims;

/// Signs a session token valid for `jwt_config.expiry` seconds.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.expiry.max(0) as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Checks signature and expiry. Any failure is a 401.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new("unit-test-secret")
    }

    #[test]
    fn token_roundtrip_keeps_identity() {
        let user_id = Uuid::new_v4();
        let token = create_access_token(user_id, "ada@college.edu", "student", &config()).unwrap();
        let claims = verify_token(&token, &config()).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "ada@college.edu");
        assert_eq!(claims.role, "student");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = create_access_token(Uuid::new_v4(), "a@b.edu", "admin", &config()).unwrap();
        let err = verify_token(&token, &JwtConfig::new("another-secret")).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn expired_token_is_rejected() {
        let cfg = config();
        // default validation leeway is 60s
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "old@b.edu".to_string(),
            role: "student".to_string(),
            exp: (Utc::now().timestamp() - 3600) as usize,
            iat: (Utc::now().timestamp() - 7200) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(cfg.secret.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, &cfg).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify_token("not.a.jwt", &config()).is_err());
    }
}
