use std::sync::Arc;

use axum::http::StatusCode;
use sales_core::{AppError, ErrorResponse};
use sales_web::{BoxFuture, BoxedHandler, Context, Handler, Middleware, Request, respond};
use tracing::{error, warn};

/// Body message for every error whose detail must not reach the client.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Translates errors from the inner chain into responses.
///
/// Every kind except [`AppError::Shutdown`] is answered and then cleared, so
/// outer layers see `Ok(())`. A shutdown error gets a best-effort 500 and is
/// returned unchanged for the router to act on.
pub struct Errors;

struct ErrorsHandler {
    next: BoxedHandler,
}

impl Middleware for Errors {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(ErrorsHandler { next })
    }
}

/// Status and body for `err`, or `None` for an error that must propagate.
pub fn translate(err: &AppError) -> Option<(StatusCode, ErrorResponse)> {
    match err {
        AppError::Fields(fields) => Some((
            StatusCode::BAD_REQUEST,
            ErrorResponse::with_fields("data validation error", fields),
        )),
        AppError::Request { status, message } => {
            Some((*status, ErrorResponse::new(message.clone())))
        }
        AppError::Unclassified(_) => Some((
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new(INTERNAL_SERVER_ERROR),
        )),
        AppError::Shutdown(_) => None,
    }
}

impl Handler for ErrorsHandler {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(async move {
            let Err(err) = self.next.call(ctx, req).await else {
                return Ok(());
            };

            let trace_id = ctx.trace_id().to_owned();
            match translate(&err) {
                Some((status, body)) => {
                    if status.is_server_error() {
                        error!(trace_id = %trace_id, error = %err, "request failed");
                    } else {
                        warn!(trace_id = %trace_id, error = %err, "request failed");
                    }
                    respond(ctx, &body, status)?;
                    Ok(())
                }
                None => {
                    error!(trace_id = %trace_id, error = %err, "unrecoverable error");
                    if !ctx.has_response() {
                        let body = ErrorResponse::new(INTERNAL_SERVER_ERROR);
                        if let Err(write_err) =
                            respond(ctx, &body, StatusCode::INTERNAL_SERVER_ERROR)
                        {
                            warn!(
                                trace_id = %trace_id,
                                error = %write_err,
                                "unable to respond before shutdown"
                            );
                        }
                    }
                    Err(err)
                }
            }
        })
    }
}
