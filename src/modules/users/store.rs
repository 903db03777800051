//! User persistence.
//!
//! [`UserStore`] is implemented over Postgres for deployments and in memory
//! for local runs and tests.

use std::collections::HashMap;

use anyhow::Context as _;
use async_trait::async_trait;
use sales_core::AppError;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::modules::users::model::User;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn query_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn query_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn create(&self, user: User) -> Result<User, AppError>;
    /// Checks the backing store is reachable.
    async fn ping(&self) -> Result<(), AppError>;
}

fn email_taken() -> AppError {
    AppError::conflict("email already in use")
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn query_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, roles, password_hash, date_created, date_updated
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")?;

        Ok(user)
    }

    async fn query_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, roles, password_hash, date_created, date_updated
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by id")?;

        Ok(user)
    }

    async fn create(&self, user: User) -> Result<User, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, roles, password_hash, date_created, date_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.roles)
        .bind(&user.password_hash)
        .bind(user.date_created)
        .bind(user.date_updated)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(email_taken()),
            Err(e) => {
                let err = anyhow::Error::new(e).context("Failed to insert user");
                Err(err.into())
            }
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Failed to ping database")?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn query_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn query_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(email_taken());
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
