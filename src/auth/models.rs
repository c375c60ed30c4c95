//! Authentication Models
//! Mission: Define secure user and authentication data structures

use crate::auth::password::MAX_PASSWORD_BYTES;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_FIELD_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 6;

/// User account as stored in the credential store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Outward view of the account. The stored record is left untouched.
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Insert payload for a user that has no id yet
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User response (sanitized)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// JWT Claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub iat: i64, // issued at, unix seconds
    pub exp: i64, // expiration timestamp
}

/// Identity attached to a request by the auth middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}

/// Register request body
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Field-level checks, reported in field order.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("name is required".to_string());
        } else if self.name.chars().count() > MAX_FIELD_LEN {
            errors.push(format!("name must be at most {} characters", MAX_FIELD_LEN));
        }

        check_email(&self.email, &mut errors);

        if self.password.is_empty() {
            errors.push("password is required".to_string());
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            ));
        } else if self.password.len() > MAX_PASSWORD_BYTES {
            // bcrypt input limit, counted in bytes
            errors.push(format!(
                "password must be at most {} characters",
                MAX_PASSWORD_BYTES
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Login request body
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        check_email(&self.email, &mut errors);

        if self.password.is_empty() {
            errors.push("password is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64, // seconds until expiration
    pub user: UserProfile,
}

fn check_email(email: &str, errors: &mut Vec<String>) {
    if email.trim().is_empty() {
        errors.push("email is required".to_string());
    } else if email.chars().count() > MAX_FIELD_LEN {
        errors.push(format!("email must be at most {} characters", MAX_FIELD_LEN));
    } else if !is_valid_email(email) {
        errors.push("email must be a valid email".to_string());
    }
}

/// Shape check only: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    !host.is_empty() && !tld.is_empty() && !domain.starts_with('.')
}
