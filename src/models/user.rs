//! User identity model and access-token claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Well-known role names
pub const ROLE_LIBRARIAN: &str = "Librarian";
pub const ROLE_MEMBER: &str = "Member";

/// User identity as stored in the database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// JWT claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: user id
    pub sub: String,
    /// Username
    pub name: String,
    pub email: String,
    /// Unique token id, for replay tracking
    pub jti: String,
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    /// Subject id parsed back to a user id
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::Authentication("Invalid token subject".to_string()))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_librarian(&self) -> bool {
        self.has_role(ROLE_LIBRARIAN)
    }

    /// Require the librarian role
    pub fn require_librarian(&self) -> Result<(), AppError> {
        if self.is_librarian() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Librarian privileges required".to_string(),
            ))
        }
    }
}

/// Credential pair produced by the token service
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub email: String,
    /// Primary role: first assigned role, or "Member" by default
    pub role: String,
}

/// Auth response body; tokens travel in HTTP-only cookies, not here
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&IssuedTokens> for AuthResponse {
    fn from(tokens: &IssuedTokens) -> Self {
        AuthResponse {
            user_id: tokens.user_id,
            email: tokens.email.clone(),
            role: tokens.role.clone(),
            expires_at: tokens.expires_at,
        }
    }
}
