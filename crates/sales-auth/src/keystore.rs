//! Key storage for token signing and verification.
//!
//! A [`KeyStore`] maps a key id (`kid`) to Ed25519 key material. It is built
//! once at startup and only read afterwards, so lookups take `&self`.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use ed25519_dalek::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use jsonwebtoken::{DecodingKey, EncodingKey};
use tracing::debug;

use crate::error::KeyStoreError;

/// Resolves key ids to the keys needed to sign or verify a token.
pub trait KeyStore: Send + Sync {
    fn private_key(&self, kid: &str) -> Result<EncodingKey, KeyStoreError>;
    fn public_key(&self, kid: &str) -> Result<DecodingKey, KeyStoreError>;
}

#[derive(Clone)]
struct Entry {
    signing: Option<EncodingKey>,
    verifying: DecodingKey,
}

/// In-memory key store.
///
/// A kid added with [`add_signing_key`](Self::add_signing_key) can both sign
/// and verify. A kid added with [`add_verifying_key`](Self::add_verifying_key)
/// can only verify, which is how retired keys are kept around after rotation.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    keys: HashMap<String, Entry>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_signing_key(
        &mut self,
        kid: impl Into<String>,
        key: &SigningKey,
    ) -> Result<(), KeyStoreError> {
        let kid = kid.into();
        let der = key
            .to_pkcs8_der()
            .map_err(|e| KeyStoreError::InvalidKey {
                kid: kid.clone(),
                reason: e.to_string(),
            })?;

        let entry = Entry {
            signing: Some(EncodingKey::from_ed_der(der.as_bytes())),
            verifying: DecodingKey::from_ed_der(key.verifying_key().as_bytes()),
        };
        self.keys.insert(kid, entry);
        Ok(())
    }

    pub fn add_verifying_key(&mut self, kid: impl Into<String>, key: &VerifyingKey) {
        let entry = Entry {
            signing: None,
            verifying: DecodingKey::from_ed_der(key.as_bytes()),
        };
        self.keys.insert(kid.into(), entry);
    }

    /// Builder form of [`add_signing_key`](Self::add_signing_key).
    pub fn with_signing_key(
        mut self,
        kid: impl Into<String>,
        key: &SigningKey,
    ) -> Result<Self, KeyStoreError> {
        self.add_signing_key(kid, key)?;
        Ok(self)
    }

    /// Loads every `<kid>.pem` file in `folder`. Each file must hold a
    /// PKCS#8 Ed25519 private key; other files are ignored.
    pub fn from_folder(folder: impl AsRef<Path>) -> Result<Self, KeyStoreError> {
        let folder = folder.as_ref();
        let io_err = |source| KeyStoreError::Io {
            path: folder.to_path_buf(),
            source,
        };

        let mut store = Self::new();
        for dirent in fs::read_dir(folder).map_err(io_err)? {
            let path = dirent.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("pem") {
                continue;
            }
            let Some(kid) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let pem = fs::read_to_string(&path).map_err(|source| KeyStoreError::Io {
                path: path.clone(),
                source,
            })?;
            let key =
                SigningKey::from_pkcs8_pem(&pem).map_err(|e| KeyStoreError::InvalidKey {
                    kid: kid.to_string(),
                    reason: e.to_string(),
                })?;

            store.add_signing_key(kid, &key)?;
            debug!(kid, path = %path.display(), "loaded signing key");
        }

        Ok(store)
    }

    /// Known key ids, sorted.
    pub fn kids(&self) -> Vec<String> {
        let mut kids: Vec<String> = self.keys.keys().cloned().collect();
        kids.sort();
        kids
    }
}

impl KeyStore for MemoryKeyStore {
    fn private_key(&self, kid: &str) -> Result<EncodingKey, KeyStoreError> {
        let entry = self
            .keys
            .get(kid)
            .ok_or_else(|| KeyStoreError::NotFound(kid.to_string()))?;
        entry
            .signing
            .clone()
            .ok_or_else(|| KeyStoreError::NoPrivateKey(kid.to_string()))
    }

    fn public_key(&self, kid: &str) -> Result<DecodingKey, KeyStoreError> {
        self.keys
            .get(kid)
            .map(|entry| entry.verifying.clone())
            .ok_or_else(|| KeyStoreError::NotFound(kid.to_string()))
    }
}

impl fmt::Debug for MemoryKeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryKeyStore")
            .field("kids", &self.kids())
            .finish()
    }
}
