use rand::{RngCore, rngs::OsRng};
use tracing::error;

use super::AuthError;

/// Number of random bytes behind each refresh token.
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a refresh token: 32 bytes from the OS RNG, hex encoded.
///
/// # Errors
/// Returns `RandomSourceUnavailable` if the OS RNG fails. There is no fallback source.
pub fn generate_refresh_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(|err| {
        error!("OS random source failed: {err}");
        AuthError::RandomSourceUnavailable
    })?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::HashSet;

    #[test]
    fn tokens_are_64_lowercase_hex_chars() -> Result<()> {
        let token = generate_refresh_token()?;
        assert_eq!(token.len(), REFRESH_TOKEN_BYTES * 2);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
        Ok(())
    }

    #[test]
    fn ten_thousand_tokens_are_distinct() -> Result<()> {
        let mut seen = HashSet::with_capacity(10_000);
        for _ in 0..10_000 {
            let token = generate_refresh_token()?;
            assert_eq!(token.len(), 64);
            assert!(seen.insert(token), "duplicate refresh token generated");
        }
        Ok(())
    }
}
