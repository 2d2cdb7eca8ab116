//! Super-admin secret comparison.

use base64ct::{Base64, Encoding};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::debug;

/// Compare a supplied super-admin token against the configured one.
///
/// Both values are standard padded base64. A value that fails to decode, or
/// decodes to nothing, never matches. The byte comparison runs in constant
/// time for equal-length inputs.
#[must_use]
pub fn validate_super_admin(expected: &SecretString, supplied: &str) -> bool {
    let (Ok(expected), Ok(supplied)) = (
        Base64::decode_vec(expected.expose_secret()),
        Base64::decode_vec(supplied),
    ) else {
        debug!("Super-admin token is not valid base64");
        return false;
    };

    if expected.is_empty() || supplied.is_empty() {
        debug!("Super-admin token is empty");
        return false;
    }

    expected.as_slice().ct_eq(supplied.as_slice()).into()
}
