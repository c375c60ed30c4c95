//! Authentication Service
//! Mission: Register, authenticate and look up users without leaking secrets

use crate::auth::{
    models::{NewUser, UserProfile},
    password::{hash_password, verify_password, DEFAULT_COST},
    user_store::{StoreError, UserStore},
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Domain failures are the named variants; `Store` and `Hashing` carry
/// infrastructure faults through untouched.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered")]
    EmailAlreadyExists,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("user store failure")]
    Store(#[source] StoreError),
    #[error("password hashing failure")]
    Hashing(#[source] anyhow::Error),
}

pub struct AuthService<S: ?Sized> {
    store: Arc<S>,
    bcrypt_cost: u32,
}

impl<S: UserStore + ?Sized> AuthService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_cost(store, DEFAULT_COST)
    }

    pub fn with_cost(store: Arc<S>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AuthError> {
        // Best-effort check; the store's unique constraint settles races
        if self
            .store
            .find_by_email(email)
            .await
            .map_err(AuthError::Store)?
            .is_some()
        {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(password, self.bcrypt_cost)
            .await
            .map_err(AuthError::Hashing)?;

        let now = Utc::now();
        let user = self
            .store
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => AuthError::EmailAlreadyExists,
                other => AuthError::Store(other),
            })?;

        info!("✅ Registered user {}", user.id);

        Ok(user.to_profile())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let Some(user) = self
            .store
            .find_by_email(email)
            .await
            .map_err(AuthError::Store)?
        else {
            warn!("❌ Failed login attempt: unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        let valid = verify_password(password, &user.password_hash)
            .await
            .map_err(AuthError::Hashing)?;

        if !valid {
            warn!("❌ Failed login attempt for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user.to_profile())
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<UserProfile, AuthError> {
        self.store
            .find_by_id(id)
            .await
            .map_err(AuthError::Store)?
            .map(|user| user.to_profile())
            .ok_or(AuthError::UserNotFound)
    }
}
