use crate::{api, auth::AuthConfig, cli::telemetry};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: SecretString,
    pub platform: String,
    pub request_timeout_seconds: u64,
    pub jwt_secret: SecretString,
    pub jwt_issuer: String,
    pub super_admin_token: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub bcrypt_cost: u32,
    pub hash_concurrency: usize,
}

impl Args {
    #[must_use]
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.jwt_secret.clone(), self.super_admin_token.clone())
            .with_issuer(self.jwt_issuer.clone())
            .with_platform(self.platform.clone())
            .with_access_token_ttl_seconds(self.access_token_ttl_seconds)
            .with_refresh_token_ttl_seconds(self.refresh_token_ttl_seconds)
            .with_bcrypt_cost(self.bcrypt_cost)
            .with_hash_concurrency(self.hash_concurrency)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let auth_config = args.auth_config();
    let result = api::new(
        args.port,
        args.dsn.expose_secret().to_string(),
        auth_config,
        Duration::from_secs(args.request_timeout_seconds),
    )
    .await;

    telemetry::shutdown_tracer();

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn auth_config_carries_every_setting() {
        let args = Args {
            port: 8080,
            dsn: SecretString::from("postgres://localhost/plantae".to_string()),
            platform: "production".to_string(),
            request_timeout_seconds: 30,
            jwt_secret: SecretString::from("jwt".to_string()),
            jwt_issuer: "greenhouse".to_string(),
            super_admin_token: SecretString::from("c3VwZXI=".to_string()),
            access_token_ttl_seconds: 60,
            refresh_token_ttl_seconds: 120,
            bcrypt_cost: 5,
            hash_concurrency: 2,
        };

        let config = args.auth_config();
        assert_eq!(config.issuer(), "greenhouse");
        assert!(config.is_production());
        assert_eq!(config.access_token_ttl(), ChronoDuration::seconds(60));
        assert_eq!(config.refresh_token_ttl(), ChronoDuration::seconds(120));
        assert_eq!(config.bcrypt_cost(), 5);
        assert_eq!(config.hash_concurrency(), 2);

        let rendered = format!("{args:?}");
        assert!(!rendered.contains("postgres://localhost"));
        assert!(!rendered.contains("c3VwZXI="));
    }
}
