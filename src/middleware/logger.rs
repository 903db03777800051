use std::sync::Arc;

use chrono::Utc;
use sales_core::AppError;
use sales_web::{BoxFuture, BoxedHandler, Context, Handler, Middleware, Request, Values};
use tracing::{error, info, warn};

/// Logs each request as it starts and as it completes.
///
/// Must sit outside the error middleware so the completion line carries the
/// status that was actually sent.
pub struct Logger;

struct LoggerHandler {
    next: BoxedHandler,
}

impl Middleware for Logger {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(LoggerHandler { next })
    }
}

impl Handler for LoggerHandler {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(async move {
            let values = ctx.require_values()?;
            let trace_id = values.trace_id.clone();
            let started = values.now;
            let tracer = values.tracer.clone();

            let method = req.method().clone();
            let path = req.uri().path().to_owned();
            let remote_addr = ctx
                .remote_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_default();

            info!(
                trace_id = %trace_id,
                method = %method,
                path = %path,
                remote_addr = %remote_addr,
                "request started"
            );

            let result = self.next.call(ctx, req).await;

            let Some(status) = ctx.values().and_then(Values::status_code) else {
                error!(
                    trace_id = %trace_id,
                    method = %method,
                    path = %path,
                    "request completed without a status code"
                );
                return match result {
                    Ok(()) => Err(AppError::shutdown("status code missing from context")),
                    Err(err) => Err(err),
                };
            };

            tracer.record("status", status.as_u16());
            let elapsed_ms = (Utc::now() - started).num_milliseconds();

            match status.as_u16() {
                500..=599 => error!(
                    trace_id = %trace_id,
                    method = %method,
                    path = %path,
                    remote_addr = %remote_addr,
                    status = status.as_u16(),
                    elapsed_ms,
                    "request completed"
                ),
                400..=499 => warn!(
                    trace_id = %trace_id,
                    method = %method,
                    path = %path,
                    remote_addr = %remote_addr,
                    status = status.as_u16(),
                    elapsed_ms,
                    "request completed"
                ),
                _ => info!(
                    trace_id = %trace_id,
                    method = %method,
                    path = %path,
                    remote_addr = %remote_addr,
                    status = status.as_u16(),
                    elapsed_ms,
                    "request completed"
                ),
            }

            result
        })
    }
}
