use std::sync::Arc;

use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use sales_auth::Auth;
use sales_core::AppError;
use sales_web::{BoxFuture, BoxedHandler, Context, Handler, Middleware, Request};
use tracing::debug;

/// Validates the bearer token and stores its [`Claims`](sales_auth::Claims)
/// in the context extensions for the layers below.
pub struct Authenticate {
    auth: Arc<Auth>,
}

pub fn authenticate(auth: &Arc<Auth>) -> Arc<dyn Middleware> {
    Arc::new(Authenticate {
        auth: Arc::clone(auth),
    })
}

struct AuthenticateHandler {
    auth: Arc<Auth>,
    next: BoxedHandler,
}

impl Middleware for Authenticate {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(AuthenticateHandler {
            auth: Arc::clone(&self.auth),
            next,
        })
    }
}

impl Handler for AuthenticateHandler {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(async move {
            let bearer = req
                .headers()
                .typed_get::<Authorization<Bearer>>()
                .ok_or_else(|| {
                    AppError::unauthorized("expected authorization header format: Bearer <token>")
                })?;

            let claims = self.auth.validate_token(bearer.token()).map_err(|e| {
                debug!(trace_id = %ctx.trace_id(), error = %e, "token rejected");
                AppError::unauthorized("invalid or expired token")
            })?;

            ctx.extensions_mut().insert(claims);
            self.next.call(ctx, req).await
        })
    }
}
