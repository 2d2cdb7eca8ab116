//! Map parsed CLI arguments to an action.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_DSN, ARG_PLATFORM, ARG_PORT, ARG_REQUEST_TIMEOUT, auth};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let platform = matches
        .get_one::<String>(ARG_PLATFORM)
        .map(|platform| platform.trim().to_string())
        .filter(|platform| !platform.is_empty())
        .unwrap_or_else(|| "development".to_string());
    let request_timeout_seconds = matches
        .get_one::<u64>(ARG_REQUEST_TIMEOUT)
        .copied()
        .unwrap_or(30);

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn: SecretString::from(dsn),
        platform,
        request_timeout_seconds,
        jwt_secret: auth_opts.jwt_secret,
        jwt_issuer: auth_opts.jwt_issuer,
        super_admin_token: auth_opts.super_admin_token,
        access_token_ttl_seconds: auth_opts.access_token_ttl_seconds,
        refresh_token_ttl_seconds: auth_opts.refresh_token_ttl_seconds,
        bcrypt_cost: auth_opts.bcrypt_cost,
        hash_concurrency: auth_opts.hash_concurrency,
    }))
}
