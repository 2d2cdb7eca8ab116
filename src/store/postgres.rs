//! Postgres-backed stores (see `sql/schema.sql`).

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use super::{
    AccountRecord, AccountStore, AdminTransition, NewAccount, NewRefreshToken, RefreshTokenRecord,
    RefreshTokenStore, StoreError,
};

const ACCOUNT_COLUMNS: &str =
    "id, email, password_hash, is_admin, lang_code_pref, created_at, updated_at";
const REFRESH_TOKEN_COLUMNS: &str =
    "token, account_id, created_at, expires_at, revoked_at, revoked_by";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_span(operation: &'static str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn account_from_row(row: &PgRow) -> AccountRecord {
    AccountRecord {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_admin: row.get("is_admin"),
        lang_code_pref: row.get("lang_code_pref"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn refresh_token_from_row(row: &PgRow) -> RefreshTokenRecord {
    RefreshTokenRecord {
        token: row.get("token"),
        account_id: row.get("account_id"),
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
        revoked_at: row.get("revoked_at"),
        revoked_by: row.get("revoked_by"),
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Conflict
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn create_account(&self, account: NewAccount) -> Result<AccountRecord, StoreError> {
        let query = format!(
            "INSERT INTO accounts (email, password_hash, lang_code_pref) \
             VALUES ($1, $2, $3) RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.lang_code_pref)
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT", &query))
            .await
            .map_err(map_insert_error)?;

        Ok(account_from_row(&row))
    }

    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountRecord>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await?;

        Ok(row.as_ref().map(account_from_row))
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<AccountRecord>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await?;

        Ok(row.as_ref().map(account_from_row))
    }

    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at, email");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await?;

        Ok(rows.iter().map(account_from_row).collect())
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<AdminTransition, StoreError> {
        // The guard on the current value makes a repeated promote/demote a no-op.
        let query = format!(
            "UPDATE accounts SET is_admin = $2, updated_at = NOW() \
             WHERE id = $1 AND is_admin <> $2 RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(is_admin)
            .fetch_optional(&self.pool)
            .instrument(db_span("UPDATE", &query))
            .await?;

        if let Some(row) = row {
            return Ok(AdminTransition::Changed(account_from_row(&row)));
        }

        match self.find_account_by_id(id).await? {
            Some(_) => Ok(AdminTransition::AlreadySet),
            None => Ok(AdminTransition::UnknownAccount),
        }
    }

    async fn delete_all_accounts(&self) -> Result<u64, StoreError> {
        // refresh_tokens rows go with their account (ON DELETE CASCADE).
        let query = "DELETE FROM accounts";
        let result = sqlx::query(query)
            .execute(&self.pool)
            .instrument(db_span("DELETE", query))
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let query = "SELECT 1";
        sqlx::query(query)
            .execute(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn insert_refresh_token(&self, token: NewRefreshToken) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO refresh_tokens
                (token, account_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
        ";
        sqlx::query(query)
            .bind(&token.token)
            .bind(token.account_id)
            .bind(token.created_at)
            .bind(token.expires_at)
            .execute(&self.pool)
            .instrument(db_span("INSERT", query))
            .await
            .map_err(map_insert_error)?;

        Ok(())
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let query = format!("SELECT {REFRESH_TOKEN_COLUMNS} FROM refresh_tokens WHERE token = $1");
        let row = sqlx::query(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await?;

        Ok(row.as_ref().map(refresh_token_from_row))
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_by: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        // Single statement; COALESCE keeps the first revocation stamp.
        let query = format!(
            "UPDATE refresh_tokens \
             SET revoked_at = COALESCE(revoked_at, NOW()), \
                 revoked_by = COALESCE(revoked_by, $2) \
             WHERE token = $1 RETURNING {REFRESH_TOKEN_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(token)
            .bind(revoked_by)
            .fetch_optional(&self.pool)
            .instrument(db_span("UPDATE", &query))
            .await?;

        Ok(row.as_ref().map(refresh_token_from_row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct FakeDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fake database error")
        }
    }

    impl StdError for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &'static str {
            "fake database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn duplicate_email_maps_to_conflict() {
        let err = sqlx::Error::Database(Box::new(FakeDbError {
            code: Some("23505"),
        }));
        assert!(matches!(map_insert_error(err), StoreError::Conflict));
    }

    #[test]
    fn other_database_errors_pass_through() {
        let err = sqlx::Error::Database(Box::new(FakeDbError {
            code: Some("40001"),
        }));
        assert!(matches!(map_insert_error(err), StoreError::Database(_)));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn ping_fails_without_database() {
        let pool = match sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:1/plantae")
        {
            Ok(pool) => pool,
            Err(_) => return,
        };
        assert!(PgStore::new(pool).ping().await.is_err());
    }
}
