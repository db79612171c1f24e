//! Signed, time-limited tokens carrying a username subject.
//!
//! The same HS256 format backs login sessions and email verification links.
//! A `typ` claim records which of the two a token was issued for, and
//! [`TokenService::parse_as`] refuses a token presented for the other one.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Session,
    Verify,
}

/// Claim set of every issued token. Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub typ: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_prefix: String,
}

impl TokenService {
    #[must_use]
    pub fn new(secret_key: &[u8], token_prefix: impl Into<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret_key),
            decoding_key: DecodingKey::from_secret(secret_key),
            validation,
            token_prefix: token_prefix.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.secret_key.as_bytes(), config.token_prefix.clone())
    }

    /// Issues a token valid for `ttl_minutes` from now.
    pub fn issue(
        &self,
        subject: &str,
        purpose: TokenPurpose,
        ttl_minutes: u32,
    ) -> Result<String, TokenError> {
        self.issue_at(
            subject,
            purpose,
            Utc::now(),
            Duration::minutes(i64::from(ttl_minutes)),
        )
    }

    pub fn issue_at(
        &self,
        subject: &str,
        purpose: TokenPurpose,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            typ: purpose,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verifies signature and expiry and returns the claims.
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    /// Like [`Self::parse`], but a token issued for another purpose is
    /// [`TokenError::Invalid`].
    pub fn parse_as(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, TokenError> {
        let claims = self.parse(token)?;
        if claims.typ != purpose {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    /// Strips the configured prefix (e.g. `Bearer `) from an authorization
    /// header value.
    pub fn extract_from_authorization_header<'a>(
        &self,
        header_value: Option<&'a str>,
    ) -> Result<&'a str, TokenError> {
        let token = header_value
            .filter(|value| !value.is_empty())
            .and_then(|value| value.strip_prefix(self.token_prefix.as_str()))
            .map(str::trim)
            .ok_or(TokenError::Invalid)?;

        if token.is_empty() {
            return Err(TokenError::Invalid);
        }

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn service() -> TokenService {
        TokenService::new(SECRET, "Bearer ")
    }

    #[test]
    fn test_issue_then_parse_returns_subject() {
        let tokens = service();
        let token = tokens.issue("alice01", TokenPurpose::Session, 30).unwrap();

        let claims = tokens.parse(&token).unwrap();
        assert_eq!(claims.sub, "alice01");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service();
        let token = tokens
            .issue_at(
                "alice01",
                TokenPurpose::Verify,
                Utc::now() - Duration::hours(2),
                Duration::minutes(30),
            )
            .unwrap();

        assert_eq!(tokens.parse(&token), Err(TokenError::Expired));
        assert_eq!(TokenError::Expired.to_string(), "Token expired");
    }

    #[test]
    fn test_purpose_must_match() {
        let tokens = service();
        let verify = tokens.issue("alice01", TokenPurpose::Verify, 30).unwrap();
        let session = tokens.issue("alice01", TokenPurpose::Session, 30).unwrap();

        assert_eq!(
            tokens.parse_as(&verify, TokenPurpose::Verify).unwrap().typ,
            TokenPurpose::Verify
        );
        assert_eq!(
            tokens.parse_as(&verify, TokenPurpose::Session),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            tokens.parse_as(&session, TokenPurpose::Verify),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_token_without_purpose_is_invalid() {
        #[derive(Serialize)]
        struct Untyped<'a> {
            sub: &'a str,
            iat: i64,
            exp: i64,
        }

        let now = Utc::now().timestamp();
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &Untyped {
                sub: "alice01",
                iat: now,
                exp: now + 600,
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(service().parse(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_token_signed_with_other_key_is_invalid() {
        let other = TokenService::new(b"ffffffffffffffffffffffffffffffff", "Bearer ");
        let token = other.issue("alice01", TokenPurpose::Session, 30).unwrap();

        assert_eq!(service().parse(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let tokens = service();
        assert_eq!(tokens.parse(""), Err(TokenError::Invalid));
        assert_eq!(tokens.parse("not.a.jwt"), Err(TokenError::Invalid));
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let tokens = service();
        let token = tokens.issue("alice01", TokenPurpose::Session, 30).unwrap();
        let forged = tokens.issue("mallory", TokenPurpose::Session, 30).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        parts[1] = forged_parts[1];

        assert_eq!(tokens.parse(&parts.join(".")), Err(TokenError::Invalid));
    }

    #[test]
    fn test_extract_from_authorization_header() {
        let tokens = service();

        assert_eq!(
            tokens.extract_from_authorization_header(Some("Bearer abc.def.ghi")),
            Ok("abc.def.ghi")
        );
        assert_eq!(
            tokens.extract_from_authorization_header(None),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            tokens.extract_from_authorization_header(Some("")),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            tokens.extract_from_authorization_header(Some("Basic abc")),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            tokens.extract_from_authorization_header(Some("Bearer ")),
            Err(TokenError::Invalid)
        );
    }
}
