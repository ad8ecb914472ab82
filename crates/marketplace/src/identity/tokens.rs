//! Signed bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the subject id and the role it held at issue time. The
//! role claim is informational: callers are re-resolved against the user store on every
//! request so a promotion or a ban takes effect without re-issuing tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::domain::{Role, UserId};

/// Longest token lifetime accepted: one year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn subject(&self) -> UserId {
        UserId(self.sub.clone())
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid: {0}")]
    Invalid(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(err.to_string()),
        }
    }
}

/// Token service consumed by the identity workflow.
pub trait TokenService: Send + Sync {
    fn issue(&self, subject: &UserId, role: Role) -> Result<IssuedToken, TokenError>;
    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokenService {
    /// `ttl_minutes` is clamped to `1..=MAX_TOKEN_TTL_MINUTES`.
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::minutes(ttl_minutes.clamp(1, MAX_TOKEN_TTL_MINUTES)),
        }
    }

    fn issue_at(
        &self,
        subject: &UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.ttl;
        let claims = TokenClaims {
            sub: subject.0.clone(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { token, expires_at })
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, subject: &UserId, role: Role) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, role, Utc::now())
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}
