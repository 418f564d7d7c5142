/// Authentication Service
///
/// Login, refresh and logout flows over the token codec, the credential store
/// and the session store. Session state per account lives entirely in the
/// session store: no record means no session, a record means exactly one live
/// refresh token.
///
/// ```text
/// NoSession --login--> Active(T, R) --refresh--> Active(T', remaining(R)) --logout--> NoSession
/// Active --ttl expiry--> NoSession
/// ```
///
/// Any refresh or logout presenting a token other than the live `T` is rejected
/// without touching the store.

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::claims::{AccessClaims, RefreshClaims, TokenKind, TokenPair};
use crate::auth::credentials::{Account, CredentialStore};
use crate::auth::jwt::TokenCodec;
use crate::auth::password::{hash_password, verify_against_dummy, verify_credentials};
use crate::auth::session_store::SessionStore;
use crate::error::{AppError, AuthError, DatabaseError, SessionStoreError};
use crate::validators::{is_valid_username, require_login_fields};

/// Result of a successful login or refresh
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub uid: String,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct AuthService {
    codec: TokenCodec,
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(
        codec: TokenCodec,
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            codec,
            credentials,
            sessions,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Create an account. Returns the new account's UID.
    ///
    /// # Errors
    /// - 400: invalid username or weak password
    /// - 409: username already taken
    pub async fn register(&self, username: &str, password: &str) -> Result<String, AppError> {
        let username = is_valid_username(username)?;

        if self.credentials.account_exists(&username).await? {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Username already taken".to_string(),
            )
            .into());
        }

        let password_hash = hash_password(password)?;
        let account = Account {
            uid: Uuid::new_v4().simple().to_string(),
            username,
            password_hash,
            is_active: true,
        };

        self.credentials.create_account(&account).await?;

        tracing::info!(uid = %account.uid, "Account registered");
        Ok(account.uid)
    }

    /// Verify credentials and open a new session, replacing any existing one
    /// for the same account.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionGrant, AppError> {
        require_login_fields(username, password)?;
        // Same normalization as registration
        let username = username.trim();

        let account = match self.credentials.find_account_by_username(username).await? {
            Some(account) => account,
            None => {
                verify_against_dummy(password);
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        verify_credentials(password, &account.password_hash)?;

        if !account.is_active {
            tracing::warn!(uid = %account.uid, "Login attempt on inactive account");
            return Err(AuthError::AccountInactive.into());
        }

        let tokens = self.codec.issue_pair(&account.uid)?;

        self.sessions
            .set_refresh_token(
                &account.uid,
                &tokens.refresh_token,
                to_std(self.codec.refresh_ttl()),
            )
            .await?;

        tracing::info!(uid = %account.uid, "Session opened");
        Ok(SessionGrant {
            uid: account.uid,
            tokens,
        })
    }

    /// Rotate the session: new access token with the full access TTL, new
    /// refresh token inheriting only the remaining lifetime of the presented one.
    pub async fn refresh(&self, presented: &str) -> Result<SessionGrant, AppError> {
        let claims = self.codec.parse::<RefreshClaims>(presented)?;

        let now = Utc::now().timestamp();
        let remaining = claims.remaining_seconds(now);
        if remaining <= 0 {
            return Err(AuthError::TokenExpired.into());
        }

        let uid = claims.uid.as_str();
        self.ensure_live_session(uid, presented).await?;

        let access_ttl = self.codec.access_ttl();
        let access_token = self.codec.issue_at(uid, TokenKind::Access, now, access_ttl)?;
        let refresh_token =
            self.codec
                .issue_at(uid, TokenKind::Refresh, now, Duration::seconds(remaining))?;

        self.sessions
            .set_refresh_token(
                uid,
                &refresh_token,
                std::time::Duration::from_secs(remaining as u64),
            )
            .await?;

        tracing::info!(uid = %uid, remaining_seconds = remaining, "Session rotated");
        Ok(SessionGrant {
            uid: uid.to_string(),
            tokens: TokenPair {
                access_token,
                refresh_token,
                expires_at: now + access_ttl.num_seconds(),
                refresh_expires_at: claims.exp,
            },
        })
    }

    /// End the session the presented refresh token belongs to.
    ///
    /// `acting_uid` is the subject of the caller's access token, when the
    /// transport requires one; it must match the refresh token's subject.
    pub async fn logout(&self, presented: &str, acting_uid: Option<&str>) -> Result<(), AppError> {
        let claims = self.codec.parse::<RefreshClaims>(presented)?;
        let uid = claims.uid.as_str();

        if let Some(acting_uid) = acting_uid {
            if acting_uid != uid {
                tracing::warn!(
                    uid = %uid,
                    acting_uid = %acting_uid,
                    "Logout with refresh token of another account"
                );
                return Err(AuthError::SessionMismatch.into());
            }
        }

        self.ensure_live_session(uid, presented).await?;

        self.sessions.delete_refresh_token(uid).await?;

        tracing::info!(uid = %uid, "Session closed");
        Ok(())
    }

    /// Verify an access token (signature, expiry and kind only; no store lookup)
    pub fn authenticate(&self, access_token: &str) -> Result<AccessClaims, AuthError> {
        self.codec.parse::<AccessClaims>(access_token)
    }

    /// The presented refresh token must be byte-equal to the stored one
    async fn ensure_live_session(&self, uid: &str, presented: &str) -> Result<(), AppError> {
        let stored = match self.sessions.get_refresh_token(uid).await {
            Ok(stored) => stored,
            Err(SessionStoreError::NotFound) => {
                tracing::warn!(
                    uid = %uid,
                    token = %fingerprint(presented),
                    "Refresh token presented with no live session"
                );
                return Err(AuthError::SessionNotFound.into());
            }
            Err(e) => return Err(e.into()),
        };

        if stored.as_bytes() != presented.as_bytes() {
            tracing::warn!(
                uid = %uid,
                token = %fingerprint(presented),
                live = %fingerprint(&stored),
                "Stale or replayed refresh token rejected"
            );
            return Err(AuthError::SessionMismatch.into());
        }

        Ok(())
    }
}

fn to_std(ttl: Duration) -> std::time::Duration {
    ttl.to_std().unwrap_or_default()
}

/// Short SHA-256 fingerprint of a token, safe to log
fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}
