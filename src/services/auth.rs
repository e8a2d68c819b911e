//! Authentication and identity service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{IssuedTokens, LoginRequest, RegisterRequest, User, ROLE_MEMBER},
    repository::Repository,
    services::tokens::TokenService,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    pub tokens: TokenService,
}

impl AuthService {
    pub fn new(repository: Repository, tokens: TokenService) -> Self {
        Self { repository, tokens }
    }

    /// Register a new identity and issue its first credential pair.
    ///
    /// Identity-creation rule violations (password policy, duplicate email)
    /// are aggregated into a single validation message.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<IssuedTokens> {
        let mut errors: Vec<String> = Vec::new();

        if request.validate().is_err() {
            errors.push("Invalid email format".to_string());
        }
        errors.extend(validate_password(&request.password));

        if self.repository.users.email_exists(&request.email).await? {
            errors.push(format!("Email '{}' is already taken", request.email));
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join(", ")));
        }

        let password_hash = self.hash_password(&request.password)?;
        let user = match self
            .repository
            .users
            .create(&request.email, &request.email, &password_hash)
            .await
        {
            Ok(user) => user,
            // Lost a race with a concurrent registration for the same email:
            // the unique constraint fires after the email_exists check passed
            Err(AppError::Database(e)) if is_unique_violation(&e) => {
                return Err(AppError::Validation(format!(
                    "Email '{}' is already taken",
                    request.email
                )));
            }
            Err(e) => return Err(e),
        };

        // New accounts start as plain members
        self.repository.users.ensure_role(ROLE_MEMBER).await?;
        self.repository
            .users
            .add_to_role(user.id, ROLE_MEMBER)
            .await?;

        let roles = self.repository.users.get_roles(user.id).await?;
        self.tokens.issue(&user, &roles)
    }

    /// Authenticate by email and password, issuing a credential pair.
    pub async fn login(&self, request: LoginRequest) -> AppResult<IssuedTokens> {
        let user = self
            .repository
            .users
            .get_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, &request.password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        let roles = self.repository.users.get_roles(user.id).await?;
        self.tokens.issue(&user, &roles)
    }

    /// Re-issue a credential pair from an expired-but-otherwise-valid access
    /// token. The presented refresh value is not cross-checked against any
    /// stored value; the identity lookup alone gates re-issuance.
    pub async fn refresh(&self, expired_access_token: &str) -> AppResult<IssuedTokens> {
        let claims = self.tokens.decode_expired(expired_access_token)?;
        let user_id = claims.user_id()?;

        let user = self
            .repository
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;

        let roles = self.repository.users.get_roles(user.id).await?;
        self.tokens.issue(&user, &roles)
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verify a password against the stored argon2 hash
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

/// Postgres unique-constraint violation (SQLSTATE 23505)
fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

/// Password policy: at least 6 characters with upper, lower, and digit;
/// no symbol required. Returns one message per violated rule.
fn validate_password(password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password.len() < 6 {
        errors.push("Passwords must be at least 6 characters".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Passwords must have at least one uppercase ('A'-'Z')".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Passwords must have at least one lowercase ('a'-'z')".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Passwords must have at least one digit ('0'-'9')".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_policy_accepts_conforming_password() {
        assert!(validate_password("Passw0rd").is_empty());
    }

    #[test]
    fn password_policy_does_not_require_symbols() {
        assert!(validate_password("Abcde1").is_empty());
    }

    #[test]
    fn password_policy_aggregates_all_violations() {
        let errors = validate_password("abc");
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("6 characters")));
        assert!(errors.iter().any(|e| e.contains("uppercase")));
        assert!(errors.iter().any(|e| e.contains("digit")));
    }

    #[test]
    fn password_policy_requires_lowercase() {
        let errors = validate_password("ABCDE1");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("lowercase"));
    }

    #[test]
    fn unique_violation_requires_a_database_error_code() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
