//! Authentication primitives.
//!
//! Everything here is transport agnostic: the HTTP layer in `crate::api`
//! decides which header carries which credential and maps [`AuthError`] to
//! status codes.

mod config;
mod error;
mod opaque;
mod password;
mod secret;
mod session;
mod token;

pub use config::{
    AuthConfig, DEFAULT_ACCESS_TOKEN_TTL_SECONDS, DEFAULT_BCRYPT_COST, DEFAULT_HASH_CONCURRENCY,
    DEFAULT_ISSUER, DEFAULT_REFRESH_TOKEN_TTL_SECONDS, PRODUCTION_PLATFORM,
};
pub use error::AuthError;
pub use opaque::{REFRESH_TOKEN_BYTES, generate_refresh_token};
pub use password::{MAX_PASSWORD_BYTES, PasswordHasher, hash_password, verify_password};
pub use secret::validate_super_admin;
pub use session::{RefreshSession, RefreshSessionManager, RenewedAccess};
pub use token::{AccessClaims, IssuedToken, TokenCodec};
