use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use pastebox_types::api::Claims;
use pastebox_types::models::User;
use thiserror::Error;

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 12;

#[derive(Debug, Error)]
pub enum TokenError {
    /// The token is malformed or its signature does not match the secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The signature is valid but the embedded expiry has passed.
    #[error("token expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    /// `issued_at + ttl` is not a representable instant.
    #[error("token lifetime out of range")]
    TtlOutOfRange,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates HS256 identity tokens with a fixed lifetime.
#[derive(Debug, Clone)]
pub struct TokenService {
    ttl: TimeDelta,
}

impl Default for TokenService {
    fn default() -> Self {
        Self::new(TimeDelta::hours(DEFAULT_TOKEN_TTL_HOURS))
    }
}

impl TokenService {
    pub fn new(ttl: TimeDelta) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn issue(&self, user: &User, secret: &[u8]) -> Result<IssuedToken, TokenError> {
        self.issue_at(user, secret, Utc::now())
    }

    /// Issue a token as if the current time were `issued_at`.
    pub fn issue_at(
        &self,
        user: &User,
        secret: &[u8],
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::TtlOutOfRange)?;
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(TokenError::Encode)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// The signature is verified before any claim is looked at, so a
    /// tampered token is always `InvalidSignature`, never `Expired`.
    pub fn validate(&self, token: &str, secret: &[u8]) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidSignature,
            })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"5TEdWbDmxZ2ASXcMinBYwGi66vHiU9rq";

    fn user() -> User {
        User {
            id: 17,
            username: "validate".into(),
            email: "validate@example.com".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_validates() {
        let svc = TokenService::default();
        let issued = svc.issue(&user(), SECRET).unwrap();

        let claims = svc.validate(&issued.token, SECRET).unwrap();
        assert_eq!(claims.sub, 17);
        assert_eq!(claims.username, "validate");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_TTL_HOURS * 3600);
        assert_eq!(svc.ttl(), TimeDelta::hours(DEFAULT_TOKEN_TTL_HOURS));
    }

    #[test]
    fn oversized_ttl_is_an_error_not_a_panic() {
        let svc = TokenService::new(TimeDelta::try_hours(10_000_000_000).unwrap());
        assert!(matches!(
            svc.issue(&user(), SECRET),
            Err(TokenError::TtlOutOfRange)
        ));
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let svc = TokenService::default();
        let issued = svc.issue(&user(), SECRET).unwrap();

        let err = svc.validate(&issued.token, b"another-secret").unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn any_altered_byte_is_invalid_signature() {
        let svc = TokenService::default();
        let token = svc.issue(&user(), SECRET).unwrap().token;

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            let err = svc.validate(&tampered, SECRET).unwrap_err();
            assert!(
                matches!(err, TokenError::InvalidSignature),
                "byte {} gave {:?}",
                i,
                err
            );
        }
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let svc = TokenService::new(TimeDelta::hours(1));
        let issued = svc
            .issue_at(&user(), SECRET, Utc::now() - TimeDelta::hours(2))
            .unwrap();

        let err = svc.validate(&issued.token, SECRET).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn expired_and_tampered_is_invalid_signature() {
        let svc = TokenService::new(TimeDelta::hours(1));
        let issued = svc
            .issue_at(&user(), SECRET, Utc::now() - TimeDelta::hours(2))
            .unwrap();

        let err = svc.validate(&issued.token, b"wrong").unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_invalid_signature() {
        let svc = TokenService::default();
        for t in ["", "abc", "a.b.c", "...."] {
            assert!(matches!(
                svc.validate(t, SECRET).unwrap_err(),
                TokenError::InvalidSignature
            ));
        }
    }
}
