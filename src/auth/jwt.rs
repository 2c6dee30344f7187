use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::model::role::Role;
use crate::models::Claims;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

/// Signs a session token carrying the user's identity. `ttl` is in
/// seconds and must match the cookie's max-age.
pub fn generate_session_token(
    user_id: u64,
    email: String,
    first_name: String,
    last_name: String,
    role: Role,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    let claims = Claims {
        user_id,
        email,
        first_name,
        last_name,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn sample_token(ttl: usize) -> String {
        generate_session_token(
            7,
            "m@example.com".into(),
            "Mario".into(),
            "Rossi".into(),
            Role::Manager,
            SECRET,
            ttl,
        )
        .unwrap()
    }

    #[test]
    fn sign_then_verify_roundtrip() {
        let claims = verify_token(&sample_token(3600), SECRET).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.email, "m@example.com");
        assert_eq!(claims.role, Role::Manager);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        assert!(verify_token(&sample_token(3600), "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // exp in the past, beyond the default 60s leeway
        let claims = Claims {
            user_id: 7,
            email: "m@example.com".into(),
            first_name: "Mario".into(),
            last_name: "Rossi".into(),
            role: Role::Employee,
            exp: now() - 120,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, SECRET).is_err());
    }
}
