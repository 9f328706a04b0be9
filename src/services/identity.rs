use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::AppError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    // User id as a decimal string.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtIdentity {
    secret: String,
    ttl_seconds: i64,
}

impl JwtIdentity {
    pub fn new(secret: impl Into<String>, ttl_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.jwt_secret.clone(), config.jwt_ttl_seconds)
    }

    pub fn issue_token(&self, user_id: i64) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_seconds)).timestamp(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    pub fn verify(&self, token: &str) -> Result<i64, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        data.claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
    }

    pub fn resolve_caller(&self, headers: &HeaderMap) -> Result<i64, AppError> {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let token = auth
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        self.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_issue_then_resolve() {
        let identity = JwtIdentity::new("secret", 60);
        let token = identity.issue_token(42).unwrap();
        let caller = identity
            .resolve_caller(&headers_with(&format!("Bearer {token}")))
            .unwrap();
        assert_eq!(caller, 42);
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let identity = JwtIdentity::new("secret", 60);
        let err = identity.resolve_caller(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = JwtIdentity::new("one", 60).issue_token(1).unwrap();
        let err = JwtIdentity::new("two", 60).verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        // Well past the default validation leeway.
        let token = JwtIdentity::new("secret", -3600).issue_token(1).unwrap();
        let err = JwtIdentity::new("secret", 60).verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
