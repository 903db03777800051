use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("kid lookup failed: {0}")]
    NotFound(String),

    #[error("no private key registered for kid {0}")]
    NoPrivateKey(String),

    #[error("invalid key material for kid {kid}: {reason}")]
    InvalidKey { kid: String, reason: String },

    #[error("reading key folder {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    #[error("key lookup: {0}")]
    KeyLookup(#[from] KeyStoreError),

    #[error("signing token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("parsing token: {0}")]
    Parse(String),

    #[error("verifying signature: {0}")]
    Signature(String),

    #[error("token expired")]
    Expired,
}
