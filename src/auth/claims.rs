/// JWT Claims
///
/// The signed payload of both token kinds, plus kind-typed wrappers so that
/// "an access token where a refresh token is required" is a type mismatch
/// rather than a string comparison.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

const TOKEN_ID_LENGTH: usize = 32;

/// Token kind, carried in the `token_type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Wire claims for every token this service issues
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject account UID
    pub uid: String,
    pub token_type: TokenKind,
    /// Random token id; keeps two tokens minted in the same second distinct
    pub jti: String,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// Absolute expiry (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Build claims valid from `now` for `ttl_seconds`
    pub fn new(
        uid: impl Into<String>,
        kind: TokenKind,
        issuer: impl Into<String>,
        now: i64,
        ttl_seconds: i64,
    ) -> Self {
        Self {
            uid: uid.into(),
            token_type: kind,
            jti: generate_token_id(),
            iss: issuer.into(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(ttl_seconds),
        }
    }

    /// Seconds left before `exp`, measured from `now`. Zero or negative once expired.
    pub fn remaining_seconds(&self, now: i64) -> i64 {
        self.exp - now
    }
}

/// Random alphanumeric token id
fn generate_token_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Claims of a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims(Claims);

/// Claims of a verified refresh token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshClaims(Claims);

/// Verified claims tagged by kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifiedClaims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

impl From<Claims> for VerifiedClaims {
    fn from(claims: Claims) -> Self {
        match claims.token_type {
            TokenKind::Access => VerifiedClaims::Access(AccessClaims(claims)),
            TokenKind::Refresh => VerifiedClaims::Refresh(RefreshClaims(claims)),
        }
    }
}

impl VerifiedClaims {
    pub fn kind(&self) -> TokenKind {
        match self {
            VerifiedClaims::Access(_) => TokenKind::Access,
            VerifiedClaims::Refresh(_) => TokenKind::Refresh,
        }
    }

    pub fn claims(&self) -> &Claims {
        match self {
            VerifiedClaims::Access(c) => &c.0,
            VerifiedClaims::Refresh(c) => &c.0,
        }
    }
}

/// A claims type bound to exactly one token kind
pub trait KindedClaims: Sized {
    const KIND: TokenKind;

    /// Pick this kind out of verified claims, `None` for any other kind
    fn select(verified: VerifiedClaims) -> Option<Self>;
}

impl KindedClaims for AccessClaims {
    const KIND: TokenKind = TokenKind::Access;

    fn select(verified: VerifiedClaims) -> Option<Self> {
        match verified {
            VerifiedClaims::Access(c) => Some(c),
            VerifiedClaims::Refresh(_) => None,
        }
    }
}

impl KindedClaims for RefreshClaims {
    const KIND: TokenKind = TokenKind::Refresh;

    fn select(verified: VerifiedClaims) -> Option<Self> {
        match verified {
            VerifiedClaims::Refresh(c) => Some(c),
            VerifiedClaims::Access(_) => None,
        }
    }
}

impl Deref for AccessClaims {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.0
    }
}

impl Deref for RefreshClaims {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.0
    }
}

/// Access + refresh token pair handed to the client
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry (Unix timestamp)
    pub expires_at: i64,
    /// Refresh token absolute expiry (Unix timestamp)
    pub refresh_expires_at: i64,
}
