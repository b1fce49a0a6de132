//! `stockbridge-auth`: session tokens and credential hashing.
//!
//! This crate is intentionally decoupled from HTTP and storage: the API layer
//! extracts raw tokens from requests, infra stores password hashes.

pub mod claims;
pub mod password;
pub mod token;

pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use password::{PasswordError, hash_password, verify_password};
pub use token::{Hs256TokenService, TokenConfig, TokenError, TokenIssuer, TokenValidator};
