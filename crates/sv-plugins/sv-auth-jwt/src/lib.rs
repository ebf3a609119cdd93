//! # sv-auth-jwt
//!
//! Argon2 + JWT implementation of `IdentityProvider`.
//! Handles registration, credential checks, and access/refresh token rotation.

mod accounts;
mod password;
mod tokens;

pub use accounts::{AccountService, LoginRequest, RegisterRequest, Session, DEFAULT_AVATAR};
pub use password::{hash_password, verify_password};
pub use tokens::{token_digest, Claims, TokenConfig, TokenIssuer, TokenPair};
