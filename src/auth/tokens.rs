//! Access-token verification. Tokens are issued by the platform API; the
//! gateway only verifies them at connection admission.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::models::user::Role;

/// Claims carried in a platform access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub empresa_id: String,
    pub role: Role,
    pub exp: i64,
}

/// Verify an HS256 access token and return its claims.
///
/// Signature, `exp`, and the presence of `sub`/`empresa_id`/`role` are all
/// enforced here; a token missing any claim fails deserialization.
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, &'static str> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    let data = jsonwebtoken::decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(?e, "access token validation failed");
        "Invalid or expired token"
    })?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn mint(claims: &serde_json::Value) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn valid_token_round_trips() {
        let token = mint(&serde_json::json!({
            "sub": "u1",
            "empresa_id": "emp1",
            "role": "agente",
            "exp": future_exp(),
        }));

        let claims = verify_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.empresa_id, "emp1");
        assert_eq!(claims.role, Role::Agente);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = mint(&serde_json::json!({
            "sub": "u1",
            "empresa_id": "emp1",
            "role": "agente",
            "exp": future_exp(),
        }));

        assert!(verify_access_token(&token, "other-secret").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let token = mint(&serde_json::json!({
            "sub": "u1",
            "empresa_id": "emp1",
            "role": "agente",
            "exp": chrono::Utc::now().timestamp() - 3600,
        }));

        assert!(verify_access_token(&token, SECRET).is_err());
    }

    #[test]
    fn rejects_missing_empresa_claim() {
        let token = mint(&serde_json::json!({
            "sub": "u1",
            "role": "agente",
            "exp": future_exp(),
        }));

        assert!(verify_access_token(&token, SECRET).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(verify_access_token("not-a-jwt", SECRET).is_err());
    }
}
