use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Expiry (Unix seconds)
    pub exp: usize,
    /// Issued at (Unix seconds)
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_wire_format() {
        let json = r#"{"sub":"u-1","email":"a@b.edu","role":"faculty","exp":20,"iat":10}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.role, "faculty");
        assert_eq!(claims.exp, 20);

        let out = serde_json::to_string(&claims).unwrap();
        assert!(out.contains(r#""sub":"u-1""#));
    }
}
