//! Token issuance, validation, and refresh-value generation.
//!
//! Access tokens are HMAC-SHA256 signed JWTs with a 15 minute default
//! lifetime. Refresh tokens are opaque 64-byte random values, base64-encoded.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{AccessClaims, IssuedTokens, User, ROLE_MEMBER},
};

#[derive(Clone)]
pub struct TokenService {
    config: AuthConfig,
}

impl TokenService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issue a fresh credential pair for an authenticated identity.
    pub fn issue(&self, user: &User, roles: &[String]) -> AppResult<IssuedTokens> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.config.access_token_minutes);

        let claims = AccessClaims {
            sub: user.id.to_string(),
            name: user.username.clone(),
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            roles: roles.to_vec(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(IssuedTokens {
            access_token,
            refresh_token: Self::generate_refresh_token(),
            expires_at,
            user_id: user.id,
            email: user.email.clone(),
            role: roles
                .first()
                .cloned()
                .unwrap_or_else(|| ROLE_MEMBER.to_string()),
        })
    }

    /// Strict validation: signature, issuer, audience, and lifetime must all
    /// match configured expectations.
    pub fn validate(&self, token: &str) -> AppResult<AccessClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Authentication("Invalid token".to_string()))
    }

    /// Validation for the refresh flow: the signature must hold and the
    /// algorithm must be exactly HMAC-SHA256, but the lifetime check is
    /// skipped so an expired access token still yields its claims.
    pub fn decode_expired(&self, token: &str) -> AppResult<AccessClaims> {
        let header = decode_header(token)
            .map_err(|_| AppError::Authentication("Invalid token".to_string()))?;
        if header.alg != Algorithm::HS256 {
            return Err(AppError::Authentication("Invalid token".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        // Signature-only check: issuer and audience are not re-verified here,
        // and validate_aud defaults to on even with no expected audience set
        validation.validate_aud = false;

        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Authentication("Invalid token".to_string()))
    }

    /// Opaque refresh value: 64 cryptographically-random bytes, base64-encoded
    fn generate_refresh_token() -> String {
        let mut bytes = [0u8; 64];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        BASE64.encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig::default()
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "reader@example.com".to_string(),
            email: "reader@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issue_then_validate_returns_subject_and_role() {
        let service = TokenService::new(test_config());
        let user = test_user();

        let tokens = service
            .issue(&user, &["Member".to_string()])
            .expect("issue failed");
        let claims = service.validate(&tokens.access_token).expect("validate failed");

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.roles, vec!["Member".to_string()]);
        assert_eq!(tokens.role, "Member");
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn primary_role_defaults_to_member() {
        let service = TokenService::new(test_config());
        let tokens = service.issue(&test_user(), &[]).expect("issue failed");
        assert_eq!(tokens.role, "Member");
    }

    #[test]
    fn expired_token_fails_strict_validation_but_decodes_expired() {
        let config = AuthConfig {
            // Issue tokens already past their lifetime, beyond default leeway
            access_token_minutes: -5,
            ..AuthConfig::default()
        };
        let service = TokenService::new(config);
        let user = test_user();

        let tokens = service
            .issue(&user, &["Member".to_string()])
            .expect("issue failed");

        assert!(service.validate(&tokens.access_token).is_err());

        let claims = service
            .decode_expired(&tokens.access_token)
            .expect("expired decode failed");
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[test]
    fn decode_expired_accepts_live_token_with_audience_claim() {
        // Issued tokens always carry an aud claim; the refresh-path decode
        // must still yield their claims
        let service = TokenService::new(test_config());
        let user = test_user();

        let tokens = service
            .issue(&user, &["Member".to_string()])
            .expect("issue failed");
        let claims = service
            .decode_expired(&tokens.access_token)
            .expect("expired decode failed");

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.aud, test_config().audience);
    }

    #[test]
    fn validate_rejects_wrong_issuer() {
        let issuing = TokenService::new(AuthConfig {
            issuer: "someone-else".to_string(),
            ..AuthConfig::default()
        });
        let validating = TokenService::new(test_config());

        let tokens = issuing
            .issue(&test_user(), &["Member".to_string()])
            .expect("issue failed");
        assert!(validating.validate(&tokens.access_token).is_err());
    }

    #[test]
    fn validate_rejects_tampered_signature() {
        let service = TokenService::new(test_config());
        let other = TokenService::new(AuthConfig {
            jwt_secret: "AnotherSecretThatIsAlsoLongEnoughForHmacSigning!".to_string(),
            ..AuthConfig::default()
        });

        let tokens = other
            .issue(&test_user(), &["Member".to_string()])
            .expect("issue failed");
        assert!(service.validate(&tokens.access_token).is_err());
        assert!(service.decode_expired(&tokens.access_token).is_err());
    }

    #[test]
    fn decode_expired_rejects_non_hs256_algorithm() {
        let service = TokenService::new(test_config());
        let user = test_user();
        let now = Utc::now();

        let claims = AccessClaims {
            sub: user.id.to_string(),
            name: user.username.clone(),
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            roles: vec!["Member".to_string()],
            iss: "libris".to_string(),
            aud: "libris-users".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(15)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(test_config().jwt_secret.as_bytes()),
        )
        .expect("encode failed");

        assert!(service.decode_expired(&token).is_err());
    }

    #[test]
    fn refresh_tokens_are_unique_and_high_entropy() {
        let a = TokenService::generate_refresh_token();
        let b = TokenService::generate_refresh_token();

        assert_ne!(a, b);
        assert_eq!(BASE64.decode(&a).expect("not base64").len(), 64);
    }
}
