//! Access token minting and verification (HS256 JWT).
//!
//! Flow Overview:
//! 1) Build `{iss, iat, exp, sub}` claims for an account id.
//! 2) Sign with the shared HMAC secret.
//! 3) On verify, inspect the header before anything else and refuse every
//!    algorithm outside the HMAC family, including `none`.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
    errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::AuthError;

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub sub: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies access tokens with one HMAC secret.
#[derive(Clone)]
pub struct TokenCodec {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &SecretString, issuer: impl Into<String>) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            issuer: issuer.into(),
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
        }
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue an access token for `subject` valid for `ttl`.
    ///
    /// # Errors
    /// Returns `InvalidTtl` for a non-positive ttl, `MalformedToken` if signing fails.
    pub fn issue(&self, subject: Uuid, ttl: Duration) -> Result<IssuedToken, AuthError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        subject: Uuid,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        if ttl <= Duration::zero() {
            return Err(AuthError::InvalidTtl);
        }
        let expires_at = now + ttl;
        let claims = AccessClaims {
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            sub: subject.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| {
                debug!("Failed to sign access token: {err}");
                AuthError::MalformedToken
            })?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify an access token and return the subject account id.
    ///
    /// # Errors
    /// - `UnsupportedSigningAlgorithm` if the header names a non-HMAC algorithm
    /// - `BadSignature` if the signature does not match this secret
    /// - `ExpiredToken` once `exp` has passed
    /// - `MalformedToken` for anything unparsable, a foreign issuer, or a non-UUID subject
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let header = decode_header(token).map_err(|_| classify_bad_header(token))?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            debug!("Rejected access token signed with {:?}", header.alg);
            return Err(AuthError::UnsupportedSigningAlgorithm);
        }

        let mut validation = Validation::new(header.alg);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);

        let data = decode::<AccessClaims>(token, &self.decoding_key, &validation).map_err(
            |err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidSignature => AuthError::BadSignature,
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    AuthError::UnsupportedSigningAlgorithm
                }
                _ => {
                    debug!("Rejected malformed access token: {err}");
                    AuthError::MalformedToken
                }
            },
        )?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::MalformedToken)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("secret", &"***")
            .finish()
    }
}

/// A header that `jsonwebtoken` cannot parse is either garbage or names an
/// algorithm it does not know (`none` among them). Only a non-HMAC `alg` is
/// an algorithm rejection; a broken header claiming HMAC is just malformed.
fn classify_bad_header(token: &str) -> AuthError {
    let alg = token
        .split('.')
        .next()
        .and_then(|segment| Base64UrlUnpadded::decode_vec(segment).ok())
        .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(&bytes).ok())
        .and_then(|value| value.get("alg").and_then(|alg| alg.as_str()).map(str::to_string));

    match alg {
        Some(alg) if !matches!(alg.as_str(), "HS256" | "HS384" | "HS512") => {
            debug!("Rejected access token with unsupported alg {alg}");
            AuthError::UnsupportedSigningAlgorithm
        }
        _ => AuthError::MalformedToken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(&SecretString::from(secret.to_string()), "plantae")
    }

    fn b64(value: &serde_json::Value) -> String {
        Base64UrlUnpadded::encode_string(value.to_string().as_bytes())
    }

    #[test]
    fn issue_then_verify_returns_subject() -> Result<()> {
        let codec = codec("signing-secret");
        let subject = Uuid::new_v4();
        let issued = codec.issue(subject, Duration::hours(2))?;
        assert_eq!(codec.verify(&issued.token)?, subject);
        assert!(issued.expires_at > Utc::now());
        Ok(())
    }

    #[test]
    fn claims_carry_issuer_and_subject() -> Result<()> {
        let codec = codec("signing-secret");
        let subject = Uuid::new_v4();
        let now = Utc::now();
        let issued = codec.issue_at(subject, Duration::seconds(90), now)?;

        let payload = issued.token.split('.').nth(1).unwrap_or_default();
        let decoded = Base64UrlUnpadded::decode_vec(payload)
            .map_err(|err| anyhow::anyhow!("payload is not base64url: {err}"))?;
        let claims: AccessClaims = serde_json::from_slice(&decoded)?;
        assert_eq!(claims.iss, "plantae");
        assert_eq!(claims.sub, subject.to_string());
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, now.timestamp() + 90);
        Ok(())
    }

    #[test]
    fn different_issue_times_give_different_tokens() -> Result<()> {
        let codec = codec("signing-secret");
        let subject = Uuid::new_v4();
        let now = Utc::now();
        let first = codec.issue_at(subject, Duration::minutes(5), now)?;
        let second = codec.issue_at(subject, Duration::minutes(5), now + Duration::seconds(1))?;
        assert_ne!(first.token, second.token);
        Ok(())
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        let codec = codec("signing-secret");
        assert!(matches!(
            codec.issue(Uuid::new_v4(), Duration::zero()),
            Err(AuthError::InvalidTtl)
        ));
        assert!(matches!(
            codec.issue(Uuid::new_v4(), Duration::seconds(-5)),
            Err(AuthError::InvalidTtl)
        ));
    }

    #[test]
    fn expired_token_is_rejected() -> Result<()> {
        let codec = codec("signing-secret");
        let issued = codec.issue_at(
            Uuid::new_v4(),
            Duration::minutes(1),
            Utc::now() - Duration::minutes(5),
        )?;
        assert!(matches!(
            codec.verify(&issued.token),
            Err(AuthError::ExpiredToken)
        ));
        Ok(())
    }

    #[test]
    fn foreign_secret_is_bad_signature() -> Result<()> {
        let issued = codec("secret-a").issue(Uuid::new_v4(), Duration::minutes(5))?;
        assert!(matches!(
            codec("secret-b").verify(&issued.token),
            Err(AuthError::BadSignature)
        ));
        Ok(())
    }

    #[test]
    fn none_algorithm_is_rejected() {
        let codec = codec("signing-secret");
        let now = Utc::now().timestamp();
        let header = b64(&json!({"alg": "none", "typ": "JWT"}));
        let claims = b64(&json!({
            "iss": "plantae",
            "iat": now,
            "exp": now + 600,
            "sub": Uuid::new_v4().to_string(),
        }));
        for token in [format!("{header}.{claims}."), format!("{header}.{claims}")] {
            assert!(matches!(
                codec.verify(&token),
                Err(AuthError::UnsupportedSigningAlgorithm)
            ));
        }
    }

    #[test]
    fn asymmetric_algorithm_header_is_rejected() {
        let codec = codec("signing-secret");
        let now = Utc::now().timestamp();
        for alg in ["RS256", "ES256", "EdDSA", "PS512"] {
            let header = b64(&json!({"alg": alg, "typ": "JWT"}));
            let claims = b64(&json!({
                "iss": "plantae",
                "iat": now,
                "exp": now + 600,
                "sub": Uuid::new_v4().to_string(),
            }));
            let token = format!("{header}.{claims}.c2lnbmF0dXJl");
            assert!(
                matches!(
                    codec.verify(&token),
                    Err(AuthError::UnsupportedSigningAlgorithm)
                ),
                "{alg} must be rejected"
            );
        }
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec("signing-secret");
        for token in ["", "not-a-jwt", "a.b.c", "....."] {
            assert!(
                matches!(codec.verify(token), Err(AuthError::MalformedToken)),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn broken_hmac_header_is_malformed() {
        let codec = codec("signing-secret");
        let claims = b64(&json!({"sub": Uuid::new_v4().to_string()}));
        for header in [
            json!({"alg": "HS256", "kid": 7}),
            json!({"alg": "HS512", "typ": ["JWT"]}),
        ] {
            let token = format!("{}.{claims}.c2lnbmF0dXJl", b64(&header));
            assert!(
                matches!(codec.verify(&token), Err(AuthError::MalformedToken)),
                "{header} should be malformed"
            );
        }
    }

    #[test]
    fn non_uuid_subject_is_malformed() -> Result<()> {
        let codec = codec("signing-secret");
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            iss: "plantae".to_string(),
            iat: now,
            exp: now + 600,
            sub: "not-a-uuid".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"signing-secret"),
        )?;
        assert!(matches!(
            codec.verify(&token),
            Err(AuthError::MalformedToken)
        ));
        Ok(())
    }

    #[test]
    fn foreign_issuer_is_malformed() -> Result<()> {
        let secret = SecretString::from("signing-secret".to_string());
        let other = TokenCodec::new(&secret, "someone-else");
        let issued = other.issue(Uuid::new_v4(), Duration::minutes(5))?;
        assert!(matches!(
            codec("signing-secret").verify(&issued.token),
            Err(AuthError::MalformedToken)
        ));
        Ok(())
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", codec("super-sensitive"));
        assert!(!rendered.contains("super-sensitive"));
    }
}
