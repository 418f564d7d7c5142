/// Authentication module
///
/// Token issuance and verification, credential checks, the refresh-token
/// session store and the login/refresh/logout flows built on them.

mod claims;
mod credentials;
mod jwt;
mod password;
mod service;
mod session_store;

pub use claims::{AccessClaims, Claims, KindedClaims, RefreshClaims, TokenKind, TokenPair, VerifiedClaims};
pub use credentials::{Account, CredentialStore, InMemoryCredentialStore, PgCredentialStore};
pub use jwt::TokenCodec;
pub use password::{hash_password, verify_credentials, verify_password};
pub use service::{AuthService, SessionGrant};
pub use session_store::{session_key, InMemorySessionStore, RedisSessionStore, SessionStore};
