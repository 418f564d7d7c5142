/// Credential Store
///
/// Read access to accounts for login, and the single write used by
/// registration. Usernames are matched case-sensitively.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{AppError, DatabaseError};

/// The minimal account view the auth flows need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub uid: String,
    pub username: String,
    /// bcrypt hash
    pub password_hash: String,
    pub is_active: bool,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, AppError>;

    async fn account_exists(&self, username: &str) -> Result<bool, AppError>;

    /// Insert a new account. A taken username is a `UniqueConstraintViolation`.
    async fn create_account(&self, account: &Account) -> Result<(), AppError>;
}

/// Postgres-backed credential store over the `users` table
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, (String, String, String, bool)>(
            "SELECT uid, username, password_hash, is_active FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(uid, username, password_hash, is_active)| Account {
            uid,
            username,
            password_hash,
            is_active,
        }))
    }

    async fn account_exists(&self, username: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_account(&self, account: &Account) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (uid, username, password_hash, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&account.uid)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.is_active)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// In-process credential store keyed by username
#[derive(Default)]
pub struct InMemoryCredentialStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> AppError {
        AppError::Internal("credential map lock poisoned".to_string())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.read().map_err(|_| Self::poisoned())?;
        Ok(accounts.get(username).cloned())
    }

    async fn account_exists(&self, username: &str) -> Result<bool, AppError> {
        let accounts = self.accounts.read().map_err(|_| Self::poisoned())?;
        Ok(accounts.contains_key(username))
    }

    async fn create_account(&self, account: &Account) -> Result<(), AppError> {
        let mut accounts = self.accounts.write().map_err(|_| Self::poisoned())?;
        if accounts.contains_key(&account.username) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Username already taken".to_string(),
            )
            .into());
        }
        accounts.insert(account.username.clone(), account.clone());
        Ok(())
    }
}
