//! Claims carried by every access token.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_USER: &str = "USER";

/// An authenticated principal.
///
/// Fields are private so a value built in process always satisfies
/// `exp > iat` and a non-empty subject. Values decoded from a token are
/// re-checked by [`Claims::check`] before being handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    iss: String,
    /// Subject (user id)
    sub: String,
    /// Issued-at, seconds since the epoch
    iat: i64,
    /// Expires-at, seconds since the epoch
    exp: i64,
    #[serde(default)]
    roles: BTreeSet<String>,
}

impl Claims {
    pub fn new<I, R>(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        roles: I,
    ) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let claims = Self {
            iss: issuer.into(),
            sub: subject.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            roles: roles.into_iter().map(Into::into).collect(),
        };
        claims.check()?;
        Ok(claims)
    }

    /// Claims valid from `now` for `ttl`.
    pub fn issue<I, R>(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
        roles: I,
    ) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self::new(issuer, subject, now, now + ttl, roles)
    }

    pub fn check(&self) -> Result<(), AuthError> {
        if self.sub.trim().is_empty() {
            return Err(AuthError::InvalidClaims("subject is empty".to_string()));
        }
        if self.exp <= self.iat {
            return Err(AuthError::InvalidClaims(format!(
                "expires-at {} is not after issued-at {}",
                self.exp, self.iat
            )));
        }
        Ok(())
    }

    pub fn issuer(&self) -> &str {
        &self.iss
    }

    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn issued_at(&self) -> i64 {
        self.iat
    }

    pub fn expires_at(&self) -> i64 {
        self.exp
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// True when at least one of `roles` is held. An empty slice matches nothing.
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|r| self.has_role(r.as_ref()))
    }
}
