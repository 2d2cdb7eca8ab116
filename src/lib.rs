//! # Plantae (plant collection API)
//!
//! `plantae` serves the plant collection API. The only part of it with real
//! security invariants is the authentication and authorization layer, which
//! lives in [`auth`] and [`api::gate`].
//!
//! ## Trust tiers
//!
//! - **Anonymous:** `register`, `login` and `health`.
//! - **Authenticated:** a valid `Bearer` access token (HS256 JWT).
//! - **Admin:** an authenticated account whose `is_admin` flag is set.
//! - **Super-admin:** a static shared secret sent as
//!   `Authorization: SuperAdminToken <secret>`. Only used for promotion,
//!   demotion and table resets. Table resets refuse to run on `production`.
//!
//! ## Sessions
//!
//! Login returns a short-lived access token and a long-lived opaque refresh
//! token. Refresh tokens are persisted, never rotated, and can be revoked.
//! Revocation is always stamped with the store's own clock.

pub mod api;
pub mod auth;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
