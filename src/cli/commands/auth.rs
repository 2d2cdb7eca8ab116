//! Token, secret and hashing flags.

use anyhow::{Result, bail};
use base64ct::{Base64, Encoding};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::auth::{
    DEFAULT_ACCESS_TOKEN_TTL_SECONDS, DEFAULT_BCRYPT_COST, DEFAULT_HASH_CONCURRENCY,
    DEFAULT_ISSUER, DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
};

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_JWT_ISSUER: &str = "jwt-issuer";
pub const ARG_SUPER_ADMIN_TOKEN: &str = "super-admin-token";
pub const ARG_ACCESS_TOKEN_TTL: &str = "access-token-ttl-seconds";
pub const ARG_REFRESH_TOKEN_TTL: &str = "refresh-token-ttl-seconds";
pub const ARG_BCRYPT_COST: &str = "bcrypt-cost";
pub const ARG_HASH_CONCURRENCY: &str = "hash-concurrency";

#[derive(Debug)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub jwt_issuer: String,
    pub super_admin_token: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub bcrypt_cost: u32,
    pub hash_concurrency: usize,
}

impl Options {
    /// # Errors
    /// Returns an error for missing or empty secrets, a super-admin token that
    /// is not standard base64, or a non-positive TTL.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let secret = |id: &str| -> Result<SecretString> {
            match matches.get_one::<String>(id) {
                Some(value) if !value.trim().is_empty() => {
                    Ok(SecretString::from(value.trim().to_string()))
                }
                _ => bail!("missing required argument: --{id}"),
            }
        };

        let jwt_secret = secret(ARG_JWT_SECRET)?;

        let super_admin_token = secret(ARG_SUPER_ADMIN_TOKEN)?;
        if matches
            .get_one::<String>(ARG_SUPER_ADMIN_TOKEN)
            .is_some_and(|value| Base64::decode_vec(value.trim()).is_err())
        {
            bail!("--{ARG_SUPER_ADMIN_TOKEN} must be standard base64");
        }

        let ttl = |id: &str, default: i64| -> Result<i64> {
            let seconds = matches.get_one::<i64>(id).copied().unwrap_or(default);
            if seconds <= 0 {
                bail!("--{id} must be positive");
            }
            Ok(seconds)
        };

        Ok(Self {
            jwt_secret,
            jwt_issuer: matches
                .get_one::<String>(ARG_JWT_ISSUER)
                .cloned()
                .filter(|issuer| !issuer.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            super_admin_token,
            access_token_ttl_seconds: ttl(ARG_ACCESS_TOKEN_TTL, DEFAULT_ACCESS_TOKEN_TTL_SECONDS)?,
            refresh_token_ttl_seconds: ttl(
                ARG_REFRESH_TOKEN_TTL,
                DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            )?,
            bcrypt_cost: matches
                .get_one::<u32>(ARG_BCRYPT_COST)
                .copied()
                .unwrap_or(DEFAULT_BCRYPT_COST),
            hash_concurrency: matches
                .get_one::<usize>(ARG_HASH_CONCURRENCY)
                .copied()
                .unwrap_or(DEFAULT_HASH_CONCURRENCY),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    with_hashing_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("HMAC secret used to sign access tokens")
                .env("PLANTAE_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_JWT_ISSUER)
                .long(ARG_JWT_ISSUER)
                .help("Issuer claim written into and required on access tokens")
                .env("PLANTAE_JWT_ISSUER")
                .default_value(DEFAULT_ISSUER),
        )
        .arg(
            Arg::new(ARG_SUPER_ADMIN_TOKEN)
                .long(ARG_SUPER_ADMIN_TOKEN)
                .help("Base64 static secret for the SuperAdminToken authorization scheme")
                .env("PLANTAE_SUPER_ADMIN_TOKEN")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_TTL)
                .long(ARG_ACCESS_TOKEN_TTL)
                .help("Access token lifetime in seconds")
                .env("PLANTAE_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("7200")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TOKEN_TTL)
                .long(ARG_REFRESH_TOKEN_TTL)
                .help("Refresh token lifetime in seconds")
                .env("PLANTAE_REFRESH_TOKEN_TTL_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_hashing_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BCRYPT_COST)
                .long(ARG_BCRYPT_COST)
                .help("bcrypt cost factor for new password hashes")
                .env("PLANTAE_BCRYPT_COST")
                .default_value("12")
                .value_parser(clap::value_parser!(u32).range(4..=31)),
        )
        .arg(
            Arg::new(ARG_HASH_CONCURRENCY)
                .long(ARG_HASH_CONCURRENCY)
                .help("Maximum concurrent bcrypt operations")
                .env("PLANTAE_HASH_CONCURRENCY")
                .default_value("4")
                .value_parser(clap::value_parser!(usize)),
        )
}
