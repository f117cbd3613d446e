//! Account and session service
//!
//! Sign-up, sign-in with bearer sessions, sign-out, session lookup,
//! password-reset requests and profile updates.

use chrono::{Duration, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthError, AuthResult};
use crate::storage::types::new_id;
use crate::storage::{HabitStore, Session, StorageError, User, UserRecord};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

/// A signed-in user and their session token
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub user: User,
    pub token: String,
    pub expires_at: chrono::DateTime<Utc>,
}

/// Authentication service over a habit store
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn HabitStore>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn HabitStore>, session_ttl: Duration) -> Self {
        Self { store, session_ttl }
    }

    /// Create an account
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<String>,
    ) -> AuthResult<User> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        let user = User {
            id: new_id(),
            email,
            full_name: full_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            created_at: Utc::now(),
        };
        let record = UserRecord {
            user: user.clone(),
            password_hash: hash_password(password)?,
        };

        self.store.create_user(record).await.map_err(|e| match e {
            StorageError::Conflict(_) => AuthError::EmailTaken,
            other => AuthError::Storage(other),
        })?;

        tracing::info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// Verify credentials and open a session
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<SignedIn> {
        let email = normalize_email(email);
        let record = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &record.password_hash)? {
            tracing::warn!(user_id = %record.user.id, "Rejected sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        let session = Session {
            token: new_id(),
            user_id: record.user.id.clone(),
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        self.store.create_session(session.clone()).await?;

        tracing::info!(user_id = %record.user.id, "User signed in");
        Ok(SignedIn {
            user: record.user,
            token: session.token,
            expires_at: session.expires_at,
        })
    }

    /// End a session
    pub async fn sign_out(&self, token: &str) -> AuthResult<()> {
        self.store.delete_session(token).await?;
        Ok(())
    }

    /// Resolve a bearer token to its user
    pub async fn session_user(&self, token: &str) -> AuthResult<User> {
        let session = self
            .store
            .find_session(token)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Invalid session".to_string()))?;

        if session.is_expired(Utc::now()) {
            self.store.delete_session(token).await?;
            return Err(AuthError::Unauthorized("Session expired".to_string()));
        }

        self.store
            .find_user(&session.user_id)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Account no longer exists".to_string()))
    }

    /// Accept a password-reset request for a known account
    ///
    /// Nothing is delivered; the request is only validated and logged.
    pub async fn request_password_reset(&self, email: &str) -> AuthResult<()> {
        let email = normalize_email(email);
        let record = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = %record.user.id, "Password reset requested");
        Ok(())
    }

    /// Change the display name
    pub async fn update_profile(&self, user_id: &str, full_name: Option<String>) -> AuthResult<User> {
        let full_name = full_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        if full_name.as_ref().map(|n| n.chars().count() > 100).unwrap_or(false) {
            return Err(AuthError::Validation(
                "Name exceeds maximum length of 100 characters".to_string(),
            ));
        }

        Ok(self.store.update_user_name(user_id, full_name).await?)
    }

    /// Drop expired sessions
    pub async fn purge_expired(&self) -> AuthResult<usize> {
        let removed = self.store.purge_expired_sessions(Utc::now()).await?;
        if removed > 0 {
            tracing::debug!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> AuthResult<()> {
    if !email_regex().is_match(email) {
        return Err(AuthError::Validation(format!(
            "Invalid email address: {}",
            email
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
