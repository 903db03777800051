use std::sync::Arc;

use axum::http::StatusCode;
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::{Authorization, HeaderMapExt};
use chrono::Duration;
use sales_auth::{Auth, Claims};
use sales_core::AppError;
use sales_web::{Context, Request, decode, respond};
use tracing::info;
use uuid::Uuid;

use crate::modules::users::model::{NewUser, TokenResponse};
use crate::modules::users::service::UserCore;

/// HTTP handlers for the users module.
pub struct UserHandlers {
    core: Arc<UserCore>,
    auth: Arc<Auth>,
    issuer: String,
    token_ttl: Duration,
}

impl UserHandlers {
    pub fn new(
        core: Arc<UserCore>,
        auth: Arc<Auth>,
        issuer: impl Into<String>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            core,
            auth,
            issuer: issuer.into(),
            token_ttl,
        }
    }

    /// Issues a token for the user named by the Basic credentials.
    pub async fn token(&self, ctx: &mut Context, req: Request) -> Result<(), AppError> {
        let creds = req
            .headers()
            .typed_get::<Authorization<Basic>>()
            .ok_or_else(|| {
                AppError::unauthorized("must provide email and password in Basic auth")
            })?;

        let now = ctx.require_values()?.now;
        let user = self
            .core
            .authenticate(creds.username(), creds.password(), ctx.deadline())
            .await?;

        let claims = Claims::issue(
            self.issuer.as_str(),
            user.id.to_string(),
            now,
            self.token_ttl,
            user.roles.iter().map(String::as_str),
        )?;
        let token = self.auth.generate_token(&claims)?;

        info!(trace_id = %ctx.trace_id(), user_id = %user.id, "token issued");
        respond(ctx, &TokenResponse { token }, StatusCode::OK)
    }

    pub async fn query_by_id(&self, ctx: &mut Context, _req: Request) -> Result<(), AppError> {
        let id = ctx
            .param("id")
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| AppError::bad_request("ID is not in its proper form"))?;

        let user = self.core.query_by_id(id).await?;
        respond(ctx, &user, StatusCode::OK)
    }

    pub async fn create(&self, ctx: &mut Context, req: Request) -> Result<(), AppError> {
        let nu: NewUser = decode(req).await?;
        let now = ctx.require_values()?.now;

        let user = self.core.create(nu, now, ctx.deadline()).await?;

        info!(trace_id = %ctx.trace_id(), user_id = %user.id, "user created");
        respond(ctx, &user, StatusCode::CREATED)
    }
}
