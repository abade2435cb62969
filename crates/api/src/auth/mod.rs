//! Authentication module for Autra

pub mod password;
pub mod service;

pub use password::{generate_impossible_hash, hash_password, verify_password, PasswordError};
pub use service::{
    normalize_identity_code, AuthFailure, AuthService, CanonicalIdentity,
    INVALID_CREDENTIALS_MESSAGE,
};
