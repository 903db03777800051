use std::sync::Arc;

use chrono::{DateTime, Utc};
use sales_auth::{ROLE_ADMIN, ROLE_USER};
use sales_core::validate::check;
use sales_core::{AppError, FieldErrors, hash_password_with_cost, verify_password};
use sales_web::run_until;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::modules::users::model::{NewUser, User};
use crate::modules::users::store::UserStore;

/// Message for every failed credential check. Unknown email and wrong
/// password are reported identically.
pub const AUTHENTICATION_FAILED: &str = "authentication failed";

const KNOWN_ROLES: [&str; 2] = [ROLE_ADMIN, ROLE_USER];

pub struct UserCore {
    store: Arc<dyn UserStore>,
    bcrypt_cost: u32,
}

impl UserCore {
    pub fn new(store: Arc<dyn UserStore>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    /// Checks `password` against the stored hash for `email`.
    ///
    /// bcrypt runs on the blocking pool under `deadline`. For an unknown email
    /// a throwaway hash of the same cost is computed so the response time does
    /// not reveal whether the account exists.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        deadline: Option<Instant>,
    ) -> Result<User, AppError> {
        let user = self.store.query_by_email(email).await?;

        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        let verified = run_until(deadline, async move {
            tokio::task::spawn_blocking(move || match stored_hash {
                Some(hash) => verify_password(&password, &hash),
                None => hash_password_with_cost(&password, cost).map(|_| false),
            })
            .await?
        })
        .await?;

        match user {
            Some(user) if verified => Ok(user),
            _ => {
                debug!(email, "credential check failed");
                Err(AppError::unauthorized(AUTHENTICATION_FAILED))
            }
        }
    }

    pub async fn query_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.store
            .query_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("not found"))
    }

    pub async fn create(
        &self,
        nu: NewUser,
        now: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Result<User, AppError> {
        check(&nu)?;

        let mut fields = FieldErrors::new();
        for role in nu.roles.iter().filter(|r| !KNOWN_ROLES.contains(&r.as_str())) {
            fields.push("roles", format!("unknown role {role}"));
        }
        fields.into_result()?;

        let password = nu.password;
        let cost = self.bcrypt_cost;
        let password_hash = run_until(deadline, async move {
            tokio::task::spawn_blocking(move || hash_password_with_cost(&password, cost)).await?
        })
        .await?;

        let user = User {
            id: Uuid::new_v4(),
            name: nu.name,
            email: nu.email,
            roles: nu.roles,
            password_hash,
            date_created: now,
            date_updated: now,
        };

        self.store.create(user).await
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::users::store::MemoryUserStore;
    use axum::http::StatusCode;

    const TEST_COST: u32 = 4;

    fn new_user(email: &str, roles: &[&str]) -> NewUser {
        NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            password: "gophers123".to_string(),
            password_confirm: "gophers123".to_string(),
        }
    }

    async fn core_with_user() -> (UserCore, User) {
        let core = UserCore::new(Arc::new(MemoryUserStore::new()), TEST_COST);
        let user = core
            .create(
                new_user("admin@example.com", &[ROLE_ADMIN]),
                Utc::now(),
                None,
            )
            .await
            .unwrap();
        (core, user)
    }

    fn assert_auth_failed(result: Result<User, AppError>) {
        match result {
            Err(AppError::Request { status, message }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, AUTHENTICATION_FAILED);
            }
            other => panic!("expected authentication failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let (core, user) = core_with_user().await;
        let authed = core
            .authenticate("admin@example.com", "gophers123", None)
            .await
            .unwrap();
        assert_eq!(authed.id, user.id);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_converge() {
        let (core, _) = core_with_user().await;
        let unknown = core
            .authenticate("nobody@example.com", "gophers123", None)
            .await;
        let wrong = core
            .authenticate("admin@example.com", "wrong-password", None)
            .await;
        assert_auth_failed(unknown);
        assert_auth_failed(wrong);
    }

    #[tokio::test]
    async fn test_create_stores_hash_not_password() {
        let (_, user) = core_with_user().await;
        assert_ne!(user.password_hash, "gophers123");
        assert!(verify_password("gophers123", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_role() {
        let core = UserCore::new(Arc::new(MemoryUserStore::new()), TEST_COST);
        let result = core
            .create(new_user("a@example.com", &["ROOT"]), Utc::now(), None)
            .await;

        match result {
            Err(AppError::Fields(fields)) => {
                assert_eq!(fields.as_slice()[0].field, "roles");
                assert_eq!(fields.as_slice()[0].error, "unknown role ROOT");
            }
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_query_by_id_not_found() {
        let (core, _) = core_with_user().await;
        match core.query_by_id(Uuid::new_v4()).await {
            Err(AppError::Request { status, .. }) => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("expected not found, got {other:?}"),
        }
    }
}
