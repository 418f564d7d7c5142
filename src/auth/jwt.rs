/// JWT Token Codec
///
/// Issues and verifies HS256-signed bearer tokens. Pure CPU work: the only
/// state is the signing secret, the issuer and the TTL policy.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, KindedClaims, TokenKind, TokenPair, VerifiedClaims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ConfigError};

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, issuer: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; a token issued with a past expiry must fail.
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "iat", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer: issuer.to_string(),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Build from validated settings; out-of-range expiries are rejected
    /// before they reach `chrono`.
    pub fn from_settings(config: &JwtSettings) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            &config.secret,
            &config.issuer,
            Duration::seconds(config.access_token_expiry),
            Duration::seconds(config.refresh_token_expiry),
        ))
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a token of `kind` for `uid`, valid from now for `ttl`
    pub fn issue(&self, uid: &str, kind: TokenKind, ttl: Duration) -> Result<String, AppError> {
        self.issue_at(uid, kind, Utc::now().timestamp(), ttl)
    }

    /// Issue a token against an explicit clock reading, so callers that
    /// derived `ttl` from the same reading get an exact expiry.
    pub fn issue_at(
        &self,
        uid: &str,
        kind: TokenKind,
        now: i64,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let claims = Claims::new(uid, kind, self.issuer.as_str(), now, ttl.num_seconds());

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Issue a fresh access + refresh pair with the full configured TTLs
    pub fn issue_pair(&self, uid: &str) -> Result<TokenPair, AppError> {
        let now = Utc::now().timestamp();
        let access_token = self.issue_at(uid, TokenKind::Access, now, self.access_ttl)?;
        let refresh_token = self.issue_at(uid, TokenKind::Refresh, now, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_at: now + self.access_ttl.num_seconds(),
            refresh_expires_at: now + self.refresh_ttl.num_seconds(),
        })
    }

    /// Verify a token and require it to be of kind `K`.
    ///
    /// # Errors
    /// - `TokenExpired` if the signature is valid but `exp` has passed
    /// - `TokenInvalid` for anything else, including the wrong kind
    pub fn parse<K: KindedClaims>(&self, token: &str) -> Result<K, AuthError> {
        let verified = self.parse_any(token)?;
        let presented = verified.kind();

        K::select(verified).ok_or_else(|| {
            tracing::warn!(
                expected = K::KIND.as_str(),
                presented = presented.as_str(),
                "Token of wrong kind presented"
            );
            AuthError::TokenInvalid
        })
    }

    /// Verify a token of either kind
    pub fn parse_any(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| VerifiedClaims::from(data.claims))
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!("JWT validation error: {}", e);
                    AuthError::TokenInvalid
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::{AccessClaims, RefreshClaims};

    fn get_test_codec() -> TokenCodec {
        TokenCodec::new(
            "test-secret-key-at-least-32-characters-long",
            "test",
            Duration::seconds(900),
            Duration::seconds(604800),
        )
    }

    #[test]
    fn test_issue_and_parse_round_trip() {
        let codec = get_test_codec();

        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let token = codec
                .issue("uid-123", kind, Duration::seconds(60))
                .expect("Failed to issue token");
            let verified = codec.parse_any(&token).expect("Failed to parse token");

            assert_eq!(verified.kind(), kind);
            assert_eq!(verified.claims().uid, "uid-123");
            assert_eq!(verified.claims().iss, "test");
            assert_eq!(verified.claims().exp - verified.claims().iat, 60);
        }
    }

    #[test]
    fn test_compact_three_segment_format() {
        let codec = get_test_codec();
        let token = codec.issue("uid-123", TokenKind::Access, Duration::seconds(60)).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_already_expired_token_is_expired_not_invalid() {
        let codec = get_test_codec();

        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let token = codec.issue("uid-123", kind, Duration::seconds(-1)).unwrap();
            assert_eq!(codec.parse_any(&token).unwrap_err(), AuthError::TokenExpired);
        }

        let token = codec.issue("uid-123", TokenKind::Refresh, Duration::seconds(-1)).unwrap();
        assert_eq!(
            codec.parse::<RefreshClaims>(&token).unwrap_err(),
            AuthError::TokenExpired
        );
    }

    #[test]
    fn test_kind_isolation() {
        let codec = get_test_codec();
        let access = codec.issue("uid-123", TokenKind::Access, Duration::seconds(60)).unwrap();
        let refresh = codec.issue("uid-123", TokenKind::Refresh, Duration::seconds(60)).unwrap();

        assert_eq!(
            codec.parse::<RefreshClaims>(&access).unwrap_err(),
            AuthError::TokenInvalid
        );
        assert_eq!(
            codec.parse::<AccessClaims>(&refresh).unwrap_err(),
            AuthError::TokenInvalid
        );
        assert_eq!(codec.parse::<AccessClaims>(&access).unwrap().uid, "uid-123");
        assert_eq!(codec.parse::<RefreshClaims>(&refresh).unwrap().uid, "uid-123");
    }

    #[test]
    fn test_invalid_token() {
        let codec = get_test_codec();
        assert_eq!(
            codec.parse_any("invalid.token.here").unwrap_err(),
            AuthError::TokenInvalid
        );
        assert_eq!(codec.parse_any("").unwrap_err(), AuthError::TokenInvalid);
    }

    #[test]
    fn test_tampered_signature() {
        let codec = get_test_codec();
        let token = codec.issue("uid-123", TokenKind::Refresh, Duration::seconds(60)).unwrap();

        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut chars: Vec<char> = signature.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{}.{}", head, chars.into_iter().collect::<String>());

        assert_eq!(codec.parse_any(&tampered).unwrap_err(), AuthError::TokenInvalid);
    }

    #[test]
    fn test_expired_token_with_bad_signature_is_invalid() {
        let codec = get_test_codec();
        let other = TokenCodec::new(
            "another-secret-key-at-least-32-characters",
            "test",
            Duration::seconds(900),
            Duration::seconds(604800),
        );
        let token = other.issue("uid-123", TokenKind::Refresh, Duration::seconds(-1)).unwrap();

        assert_eq!(codec.parse_any(&token).unwrap_err(), AuthError::TokenInvalid);
    }

    #[test]
    fn test_wrong_issuer() {
        let codec = get_test_codec();
        let foreign = TokenCodec::new(
            "test-secret-key-at-least-32-characters-long",
            "someone-else",
            Duration::seconds(900),
            Duration::seconds(604800),
        );
        let token = foreign.issue("uid-123", TokenKind::Access, Duration::seconds(60)).unwrap();

        assert_eq!(codec.parse_any(&token).unwrap_err(), AuthError::TokenInvalid);
    }

    #[test]
    fn test_issue_pair() {
        let codec = get_test_codec();
        let before = Utc::now().timestamp();
        let pair = codec.issue_pair("uid-123").unwrap();

        assert_ne!(pair.access_token, pair.refresh_token);
        assert!(pair.expires_at >= before + 900);
        assert_eq!(pair.refresh_expires_at - pair.expires_at, 604800 - 900);

        let refresh = codec.parse::<RefreshClaims>(&pair.refresh_token).unwrap();
        assert_eq!(refresh.exp, pair.refresh_expires_at);
    }

    #[test]
    fn test_same_second_tokens_are_distinct() {
        let codec = get_test_codec();
        let now = Utc::now().timestamp();
        let a = codec.issue_at("uid-123", TokenKind::Refresh, now, Duration::seconds(60)).unwrap();
        let b = codec.issue_at("uid-123", TokenKind::Refresh, now, Duration::seconds(60)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_settings_rejects_out_of_range_expiry() {
        let settings = JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: i64::MAX,
            issuer: "test".to_string(),
        };
        assert!(TokenCodec::from_settings(&settings).is_err());

        let settings = JwtSettings {
            refresh_token_expiry: 604800,
            ..settings
        };
        let codec = TokenCodec::from_settings(&settings).unwrap();
        assert_eq!(codec.refresh_ttl(), Duration::seconds(604800));
    }
}
