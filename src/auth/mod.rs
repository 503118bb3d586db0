use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tokens are valid for a fixed 20 hours after issuance.
pub const TOKEN_LIFETIME_HOURS: i64 = 20;

/// The user identifier a token is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(pub i64);

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: Subject,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(subject: Subject, issued_at: DateTime<Utc>) -> Self {
        Self {
            id: subject,
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Signing secret is not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Bad signature, malformed token and expiry all collapse into this variant.
    #[error("Invalid token")]
    Invalid,
}

/// Issues and verifies HS256 bearer tokens with a process-wide secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn issue(&self, subject: Subject) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: Subject, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims::new(subject, issued_at);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Check signature and expiry, returning the bound subject.
    pub fn verify(&self, token: &str) -> Result<Subject, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.id)
            .map_err(|e| {
                tracing::debug!("Token verification failed: {}", e);
                TokenError::Invalid
            })
    }

    /// Issue and verify a probe token. Used by the health check.
    pub fn self_check(&self) -> Result<(), TokenError> {
        let probe = Subject(0);
        let token = self.issue(probe)?;
        match self.verify(&token)? {
            subject if subject == probe => Ok(()),
            _ => Err(TokenError::Invalid),
        }
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret").unwrap()
    }

    #[test]
    fn empty_secret_fails_fast() {
        assert!(matches!(TokenService::new(""), Err(TokenError::MissingSecret)));
        assert!(matches!(TokenService::new("  "), Err(TokenError::MissingSecret)));
    }

    #[test]
    fn issued_token_round_trips_subject() {
        let tokens = service();
        let token = tokens.issue(Subject(42)).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), Subject(42));
    }

    #[test]
    fn payload_carries_only_subject_and_lifetime() {
        let tokens = service();
        let token = tokens.issue(Subject(7)).unwrap();
        let data = decode::<serde_json::Value>(&token, &tokens.decoding, &tokens.validation).unwrap();
        let claims = data.claims.as_object().unwrap();

        let mut keys: Vec<&str> = claims.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["exp", "iat", "id"]);
        assert_eq!(claims["id"], 7);
        assert_eq!(
            claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
            TOKEN_LIFETIME_HOURS * 3600
        );
    }

    #[test]
    fn token_is_valid_just_before_expiry() {
        let tokens = service();
        let issued = Utc::now() - Duration::hours(TOKEN_LIFETIME_HOURS) + Duration::minutes(1);
        let token = tokens.issue_at(Subject(1), issued).unwrap();
        assert!(tokens.verify(&token).is_ok());
    }

    #[test]
    fn token_is_invalid_after_expiry() {
        let tokens = service();
        let issued = Utc::now() - Duration::hours(TOKEN_LIFETIME_HOURS) - Duration::seconds(5);
        let token = tokens.issue_at(Subject(1), issued).unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn token_signed_with_other_key_is_invalid() {
        let foreign = TokenService::new("another-secret").unwrap();
        let token = foreign.issue(Subject(1)).unwrap();
        assert!(matches!(service().verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(service().verify("not.a.jwt"), Err(TokenError::Invalid)));
        assert!(matches!(service().verify(""), Err(TokenError::Invalid)));
    }

    #[test]
    fn self_check_passes_with_valid_key() {
        assert!(service().self_check().is_ok());
    }
}
