use axum::{async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub exp: i64,
}

/// Signs a token for a freshly registered or logged-in user.
pub fn issue_token(secret: &str, user_id: i64, email: &str) -> Result<String, AppError> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("could not sign token: {e}")))
}

/// Verification collapses every failure mode (bad signature, expiry,
/// malformed input) into `None`; callers only branch on valid or not.
pub fn verify_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

/// The verified numeric user id behind `Authorization: Bearer <token>`.
///
/// Every data route extracts this before doing any work, so an anonymous
/// request is rejected with 401 before a single row is read or written.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;
        let claims =
            verify_token(&state.config.jwt_secret, token).ok_or(AppError::Unauthorized)?;
        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_round_trip() {
        let token = issue_token("secret", 42, "ana@example.com").unwrap();
        let claims = verify_token("secret", &token).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "ana@example.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_token("secret", 42, "ana@example.com").unwrap();
        assert!(verify_token("other-secret", &token).is_none());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(verify_token("secret", "not.a.token").is_none());
        assert!(verify_token("secret", "").is_none());
    }
}
