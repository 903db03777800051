//! Token issuance and validation.

use std::sync::{Arc, RwLock};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use serde::Deserialize;
use tracing::info;

use crate::claims::Claims;
use crate::error::AuthError;
use crate::keystore::KeyStore;

const ALGORITHM: Algorithm = Algorithm::EdDSA;

/// Issues tokens with the active key and validates tokens signed by any key
/// the store can resolve.
pub struct Auth {
    active_kid: RwLock<String>,
    keystore: Arc<dyn KeyStore>,
    validation: Validation,
}

/// Only the header fields needed before a key is chosen. `alg` stays a raw
/// string so unsupported algorithms (including `none`) are rejected here
/// instead of failing as a parse error.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

impl Auth {
    pub fn new(
        active_kid: impl Into<String>,
        keystore: Arc<dyn KeyStore>,
    ) -> Result<Self, AuthError> {
        let active_kid = active_kid.into();
        keystore.private_key(&active_kid)?;

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Ok(Self {
            active_kid: RwLock::new(active_kid),
            keystore,
            validation,
        })
    }

    pub fn active_kid(&self) -> String {
        self.active_kid
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Switches the key used for new tokens. Tokens signed by the previous
    /// key keep validating as long as the store still resolves it.
    pub fn rotate(&self, kid: impl Into<String>) -> Result<(), AuthError> {
        let kid = kid.into();
        self.keystore.private_key(&kid)?;

        let mut active = self
            .active_kid
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        info!(old_kid = %active, new_kid = %kid, "rotated signing key");
        *active = kid;
        Ok(())
    }

    pub fn generate_token(&self, claims: &Claims) -> Result<String, AuthError> {
        claims.check()?;

        let kid = self.active_kid();
        let key = self.keystore.private_key(&kid)?;

        let mut header = Header::new(ALGORITHM);
        header.kid = Some(kid);

        encode(&header, claims, &key).map_err(AuthError::Signing)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let header = parse_header(token)?;

        if header.alg != "EdDSA" {
            return Err(AuthError::Signature(format!(
                "unexpected signing algorithm {}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::Parse("missing kid in token header".to_string()))?;

        let key = self
            .keystore
            .public_key(&kid)
            .map_err(|e| AuthError::Signature(e.to_string()))?;

        let data = decode::<Claims>(token, &key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat => AuthError::Signature(e.to_string()),
            _ => AuthError::Parse(e.to_string()),
        })?;

        data.claims.check()?;
        Ok(data.claims)
    }
}

fn parse_header(token: &str) -> Result<RawHeader, AuthError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::Parse(
            "expected a token with three segments".to_string(),
        ));
    };

    let raw = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|e| AuthError::Parse(format!("decoding header: {e}")))?;
    serde_json::from_slice(&raw).map_err(|e| AuthError::Parse(format!("decoding header: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{ROLE_ADMIN, ROLE_USER};
    use crate::keystore::MemoryKeyStore;
    use chrono::{Duration, Utc};
    use ed25519_dalek::SigningKey;
    use jsonwebtoken::EncodingKey;

    const KID: &str = "54bb2165-71e1-41a6-af3e-7da4a0e1e2c1";

    fn signing_key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    fn setup() -> Auth {
        let store = MemoryKeyStore::new()
            .with_signing_key(KID, &signing_key(7))
            .unwrap();
        Auth::new(KID, Arc::new(store)).unwrap()
    }

    fn claims(subject: &str, roles: &[&str]) -> Claims {
        Claims::issue(
            "service project",
            subject,
            Utc::now(),
            Duration::hours(1),
            roles.iter().copied(),
        )
        .unwrap()
    }

    fn forge(header: &str, payload: &str, signature: &str) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload),
            signature
        )
    }

    #[test]
    fn test_round_trip() {
        let auth = setup();
        let original = claims("u1", &[ROLE_ADMIN]);

        let token = auth.generate_token(&original).unwrap();
        let parsed = auth.validate_token(&token).unwrap();

        assert_eq!(parsed, original);
    }

    #[test]
    fn test_header_carries_kid() {
        let auth = setup();
        let token = auth.generate_token(&claims("u1", &[ROLE_USER])).unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::EdDSA);
        assert_eq!(header.kid.as_deref(), Some(KID));
    }

    #[test]
    fn test_new_requires_private_key() {
        let store = MemoryKeyStore::new();
        let result = Auth::new("missing", Arc::new(store));
        assert!(matches!(result, Err(AuthError::KeyLookup(_))));
    }

    #[test]
    fn test_expired_token() {
        let auth = setup();
        let now = Utc::now();
        let expired = Claims::new(
            "service project",
            "u1",
            now - Duration::hours(2),
            now - Duration::hours(1),
            [ROLE_USER],
        )
        .unwrap();

        let token = auth.generate_token(&expired).unwrap();
        assert!(matches!(auth.validate_token(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_symmetric_algorithm_rejected() {
        let auth = setup();
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(KID.to_string());
        let secret = signing_key(7).verifying_key().to_bytes();
        let token = encode(
            &header,
            &claims("u1", &[ROLE_ADMIN]),
            &EncodingKey::from_secret(&secret),
        )
        .unwrap();

        assert!(matches!(auth.validate_token(&token), Err(AuthError::Signature(_))));
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let auth = setup();
        let payload = serde_json::to_string(&claims("u1", &[ROLE_ADMIN])).unwrap();
        let token = forge(&format!(r#"{{"alg":"none","kid":"{KID}"}}"#), &payload, "");

        assert!(matches!(auth.validate_token(&token), Err(AuthError::Signature(_))));
    }

    #[test]
    fn test_unknown_kid_rejected() {
        let auth = setup();
        let other = MemoryKeyStore::new()
            .with_signing_key("other", &signing_key(9))
            .unwrap();
        let other = Auth::new("other", Arc::new(other)).unwrap();
        let token = other.generate_token(&claims("u1", &[ROLE_ADMIN])).unwrap();

        assert!(matches!(auth.validate_token(&token), Err(AuthError::Signature(_))));
    }

    #[test]
    fn test_missing_kid_is_parse_error() {
        let auth = setup();
        let token = forge(r#"{"alg":"EdDSA"}"#, "{}", "c2ln");
        assert!(matches!(auth.validate_token(&token), Err(AuthError::Parse(_))));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let auth = setup();
        let user = auth.generate_token(&claims("u1", &[ROLE_USER])).unwrap();
        let admin = auth.generate_token(&claims("u1", &[ROLE_ADMIN])).unwrap();

        let user_parts: Vec<&str> = user.split('.').collect();
        let admin_parts: Vec<&str> = admin.split('.').collect();
        let spliced = format!("{}.{}.{}", user_parts[0], admin_parts[1], user_parts[2]);

        assert!(matches!(auth.validate_token(&spliced), Err(AuthError::Signature(_))));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let auth = setup();
        assert!(matches!(auth.validate_token("not-a-token"), Err(AuthError::Parse(_))));
        assert!(matches!(auth.validate_token("a.b.c.d"), Err(AuthError::Parse(_))));
    }

    #[test]
    fn test_rotation_keeps_old_tokens_valid() {
        let store = MemoryKeyStore::new()
            .with_signing_key("k1", &signing_key(1))
            .unwrap()
            .with_signing_key("k2", &signing_key(2))
            .unwrap();
        let auth = Auth::new("k1", Arc::new(store)).unwrap();

        let old = auth.generate_token(&claims("u1", &[ROLE_USER])).unwrap();
        auth.rotate("k2").unwrap();
        let new = auth.generate_token(&claims("u1", &[ROLE_USER])).unwrap();

        assert_eq!(auth.active_kid(), "k2");
        assert_eq!(jsonwebtoken::decode_header(&new).unwrap().kid.as_deref(), Some("k2"));
        assert!(auth.validate_token(&old).is_ok());
        assert!(auth.validate_token(&new).is_ok());
    }

    #[test]
    fn test_rotate_to_unknown_kid_keeps_active() {
        let auth = setup();
        assert!(auth.rotate("missing").is_err());
        assert_eq!(auth.active_kid(), KID);
    }
}
