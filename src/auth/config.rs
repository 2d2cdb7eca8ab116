//! Auth configuration assembled once at startup.

use chrono::Duration;
use secrecy::SecretString;

pub const DEFAULT_ISSUER: &str = "plantae";
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 2 * 60 * 60;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
pub const DEFAULT_HASH_CONCURRENCY: usize = 4;
pub const PRODUCTION_PLATFORM: &str = "production";

#[derive(Debug)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    super_admin_token: SecretString,
    issuer: String,
    platform: String,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
    bcrypt_cost: u32,
    hash_concurrency: usize,
}

impl AuthConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString, super_admin_token: SecretString) -> Self {
        Self {
            jwt_secret,
            super_admin_token,
            issuer: DEFAULT_ISSUER.to_string(),
            platform: "development".to_string(),
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            hash_concurrency: DEFAULT_HASH_CONCURRENCY,
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: String) -> Self {
        self.issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_platform(mut self, platform: String) -> Self {
        self.platform = platform;
        self
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn with_hash_concurrency(mut self, permits: usize) -> Self {
        self.hash_concurrency = permits;
        self
    }

    #[must_use]
    pub fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    #[must_use]
    pub fn super_admin_token(&self) -> &SecretString {
        &self.super_admin_token
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    #[must_use]
    pub fn access_token_ttl(&self) -> Duration {
        Duration::seconds(self.access_token_ttl_seconds)
    }

    #[must_use]
    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_token_ttl_seconds)
    }

    #[must_use]
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    #[must_use]
    pub fn hash_concurrency(&self) -> usize {
        self.hash_concurrency
    }

    /// Destructive super-admin operations are refused on production.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.platform.trim().eq_ignore_ascii_case(PRODUCTION_PLATFORM)
    }
}
