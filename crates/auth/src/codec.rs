//! Signed token encoding/decoding (HS256 JWT).
//!
//! Tokens are issued once, at user creation, and carry no expiry. This is a
//! deliberate simplification: there is no refresh or revocation path.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use thiserror::Error;

use itembox_core::UserId;

use crate::ClaimSet;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token has expired")]
    Expired,

    #[error("failed to encode token: {0}")]
    Encode(String),
}

/// Issues and verifies API tokens.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, user_id: UserId) -> Result<String, TokenError>;

    fn decode(&self, token: &str) -> Result<ClaimSet, TokenError>;
}

/// Symmetric-key codec using HS256.
#[derive(Clone)]
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is optional; it is still checked when a token carries one.
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign an arbitrary claim set (used for tokens with an explicit expiry).
    pub fn encode_claims(&self, claims: &ClaimSet) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn encode(&self, user_id: UserId) -> Result<String, TokenError> {
        self.encode_claims(&ClaimSet::for_user(user_id))
    }

    fn decode(&self, token: &str) -> Result<ClaimSet, TokenError> {
        jsonwebtoken::decode::<ClaimSet>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn round_trip() {
        let codec = Hs256TokenCodec::new(SECRET);
        let token = codec.encode(UserId::new(1)).unwrap();
        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.user_id, Some(UserId::new(1)));
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn encoding_is_deterministic() {
        let codec = Hs256TokenCodec::new(SECRET);
        assert_eq!(
            codec.encode(UserId::new(9)).unwrap(),
            codec.encode(UserId::new(9)).unwrap()
        );
    }

    #[test]
    fn other_key_fails_signature() {
        let token = Hs256TokenCodec::new("another-secret")
            .encode(UserId::new(1))
            .unwrap();
        let err = Hs256TokenCodec::new(SECRET).decode(&token).unwrap_err();
        assert_eq!(err, TokenError::InvalidSignature);
    }

    #[test]
    fn tampered_payload_fails_signature() {
        let codec = Hs256TokenCodec::new(SECRET);
        let token = codec.encode(UserId::new(1)).unwrap();
        let forged_payload = codec.encode(UserId::new(2)).unwrap();

        // Splice the payload of a token for user 2 onto the signature for user 1.
        let parts: Vec<&str> = token.split('.').collect();
        let forged: Vec<&str> = forged_payload.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged[1], parts[2]);

        assert_eq!(codec.decode(&tampered).unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = Hs256TokenCodec::new(SECRET);
        assert!(matches!(codec.decode("invalid_token"), Err(TokenError::Malformed(_))));
        assert!(matches!(codec.decode(""), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn elapsed_expiry_is_rejected() {
        let codec = Hs256TokenCodec::new(SECRET);
        let claims = ClaimSet::for_user(UserId::new(1)).expiring_at(Utc::now() - Duration::hours(1));
        let token = codec.encode_claims(&claims).unwrap();
        assert_eq!(codec.decode(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn future_expiry_is_accepted() {
        let codec = Hs256TokenCodec::new(SECRET);
        let claims = ClaimSet::for_user(UserId::new(3)).expiring_at(Utc::now() + Duration::hours(1));
        let token = codec.encode_claims(&claims).unwrap();
        assert_eq!(codec.decode(&token).unwrap().user_id, Some(UserId::new(3)));
    }

    #[test]
    fn token_without_user_id_still_decodes() {
        let codec = Hs256TokenCodec::new(SECRET);
        let token = codec
            .encode_claims(&ClaimSet { user_id: None, exp: None })
            .unwrap();
        assert_eq!(codec.decode(&token).unwrap().user_id, None);
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(id in any::<i64>()) {
            let codec = Hs256TokenCodec::new(SECRET);
            let token = codec.encode(UserId::new(id)).unwrap();
            prop_assert_eq!(codec.decode(&token).unwrap().user_id, Some(UserId::new(id)));
        }

        #[test]
        fn arbitrary_strings_never_decode(token in "[A-Za-z0-9_.-]{0,64}") {
            let codec = Hs256TokenCodec::new(SECRET);
            prop_assert!(codec.decode(&token).is_err());
        }
    }
}
