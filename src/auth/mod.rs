//! Authentication for AnsuryX
//!
//! Provides:
//! - Account sign-up and sign-in
//! - Opaque bearer-token sessions with a configurable lifetime
//! - Password hashing with Argon2

pub mod password;
pub mod service;

pub use password::{hash_password, verify_password};
pub use service::{AuthService, SignedIn};

use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Email/password pair did not match an account
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Sign-up with an email that already has an account
    #[error("User already registered")]
    EmailTaken,

    /// No account for the given email
    #[error("User not found")]
    UserNotFound,

    /// Missing, unknown or expired session
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Input rejected
    #[error("Validation error: {0}")]
    Validation(String),

    /// Password hashing failed
    #[error("Hash error: {0}")]
    Hash(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
