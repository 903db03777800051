//! # Sales Auth
//!
//! Token issuance and validation for the sales API.
//!
//! - [`claims`]: the authenticated principal carried inside a token
//! - [`keystore`]: resolving a key id to Ed25519 signing/verification keys
//! - [`auth`]: [`Auth`], which signs tokens with the active key and verifies
//!   them with whichever key the token header names
//! - [`error`]: error types for the above
//!
//! Tokens are JWTs signed with EdDSA. The header always carries a `kid`, so
//! a verifier can pick the right public key without prior negotiation and
//! old keys stay usable for verification after a rotation.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sales_auth::{Auth, Claims, MemoryKeyStore, ROLE_ADMIN};
//!
//! let store = MemoryKeyStore::from_folder("zarf/keys")?;
//! let auth = Auth::new("54bb2165-71e1-41a6-af3e-7da4a0e1e2c1", Arc::new(store))?;
//!
//! let claims = Claims::issue("sales api", user_id, Utc::now(), Duration::hours(1), [ROLE_ADMIN])?;
//! let token = auth.generate_token(&claims)?;
//! let parsed = auth.validate_token(&token)?;
//! assert_eq!(parsed.subject(), claims.subject());
//! ```

pub mod auth;
pub mod claims;
pub mod error;
pub mod keystore;

// Re-export commonly used types at crate root
pub use auth::Auth;
pub use claims::{Claims, ROLE_ADMIN, ROLE_USER};
pub use error::{AuthError, KeyStoreError};
pub use keystore::{KeyStore, MemoryKeyStore};
