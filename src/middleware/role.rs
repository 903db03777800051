//! Role based authorization.
//!
//! Runs after [`authenticate`](super::auth::authenticate) and fails closed:
//! anything short of a positive match is a denial.

use std::sync::Arc;

use sales_auth::Claims;
use sales_core::AppError;
use sales_web::{BoxFuture, BoxedHandler, Context, Handler, Middleware, Request};
use tracing::debug;
use uuid::Uuid;

/// How a denied request is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Denial {
    /// 403, the resource exists but is off limits.
    #[default]
    Forbidden,
    /// 404, indistinguishable from a missing resource.
    NotFound,
}

/// Access policy for one route.
#[derive(Debug, Clone, Default)]
pub struct Authorize {
    roles: Vec<String>,
    self_param: Option<String>,
    denial: Denial,
}

/// Permits claims holding any of `roles`.
pub fn authorize(roles: &[&str]) -> Authorize {
    Authorize {
        roles: roles.iter().map(|r| r.to_string()).collect(),
        ..Authorize::default()
    }
}

impl Authorize {
    /// Also permits the subject named by route parameter `param`.
    pub fn or_self(mut self, param: &str) -> Self {
        self.self_param = Some(param.to_string());
        self
    }

    pub fn deny_as(mut self, denial: Denial) -> Self {
        self.denial = denial;
        self
    }

    pub fn permits(&self, claims: &Claims, ctx: &Context) -> bool {
        if claims.has_any_role(&self.roles) {
            return true;
        }
        self.self_param
            .as_deref()
            .and_then(|param| ctx.param(param))
            .is_some_and(|id| same_subject(id, claims.subject()))
    }

    fn deny(&self) -> AppError {
        match self.denial {
            Denial::Forbidden => AppError::forbidden("you are not authorized for that action"),
            Denial::NotFound => AppError::not_found("not found"),
        }
    }

    pub fn into_middleware(self) -> Arc<dyn Middleware> {
        Arc::new(self)
    }
}

/// Ids that parse as UUIDs compare by value, so case and hyphenation do not
/// matter. Anything else must match exactly.
fn same_subject(id: &str, subject: &str) -> bool {
    match (Uuid::parse_str(id), Uuid::parse_str(subject)) {
        (Ok(id), Ok(subject)) => id == subject,
        _ => id == subject,
    }
}

struct AuthorizeHandler {
    policy: Authorize,
    next: BoxedHandler,
}

impl Middleware for Authorize {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(AuthorizeHandler {
            policy: self.clone(),
            next,
        })
    }
}

impl Handler for AuthorizeHandler {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(async move {
            let permitted = {
                let claims = ctx.extensions().get::<Claims>().ok_or_else(|| {
                    AppError::internal(anyhow::anyhow!(
                        "claims missing from context: authorize registered without authenticate"
                    ))
                })?;
                let permitted = self.policy.permits(claims, ctx);
                if !permitted {
                    debug!(
                        trace_id = %ctx.trace_id(),
                        subject = %claims.subject(),
                        required = ?self.policy.roles,
                        "authorization denied"
                    );
                }
                permitted
            };

            if !permitted {
                return Err(self.policy.deny());
            }
            self.next.call(ctx, req).await
        })
    }
}
