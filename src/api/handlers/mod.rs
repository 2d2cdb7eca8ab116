pub mod auth;
pub mod health;
pub mod super_admin;
pub mod users;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::AccountRecord;

static EMAIL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email_normalized: &str) -> bool {
    EMAIL_RE
        .as_ref()
        .is_some_and(|regex| regex.is_match(email_normalized))
}

/// Deserialize a plaintext credential straight into a `SecretString`.
pub(crate) fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Public view of an account; never includes the password hash.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lang_code_pref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccountRecord> for AccountSummary {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            is_admin: record.is_admin,
            lang_code_pref: record.lang_code_pref,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@x.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("spaces in@example.com"));
    }

    #[derive(Deserialize)]
    struct Credential {
        #[serde(deserialize_with = "deserialize_secret")]
        password: SecretString,
    }

    #[test]
    fn secret_fields_deserialize_and_stay_redacted() -> anyhow::Result<()> {
        let credential: Credential = serde_json::from_str(r#"{"password":"hunter2"}"#)?;
        assert_eq!(credential.password.expose_secret(), "hunter2");
        assert!(!format!("{:?}", credential.password).contains("hunter2"));
        Ok(())
    }

    #[test]
    fn summary_omits_missing_language() -> anyhow::Result<()> {
        let now = Utc::now();
        let summary = AccountSummary::from(AccountRecord {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            is_admin: false,
            lang_code_pref: None,
            created_at: now,
            updated_at: now,
        });
        let json = serde_json::to_value(&summary)?;
        assert!(json.get("langCodePref").is_none());
        assert!(json.get("isAdmin").is_some());
        assert!(!json.to_string().contains("secret"));
        Ok(())
    }
}
