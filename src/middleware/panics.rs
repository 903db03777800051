use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use metrics::counter;
use sales_core::AppError;
use sales_web::{BoxFuture, BoxedHandler, Context, Handler, Middleware, Request};
use tracing::error;

use crate::metrics::{Counters, PANICS_TOTAL};

/// Recovers a panic in the inner chain as an unclassified error, so the
/// error middleware still answers with a 500 and the connection survives.
pub struct Panics {
    counters: Arc<Counters>,
}

impl Panics {
    pub fn new(counters: Arc<Counters>) -> Self {
        Self { counters }
    }
}

struct PanicsHandler {
    counters: Arc<Counters>,
    next: BoxedHandler,
}

impl Middleware for Panics {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(PanicsHandler {
            counters: Arc::clone(&self.counters),
            next,
        })
    }
}

impl Handler for PanicsHandler {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(async move {
            let trace_id = ctx.trace_id().to_owned();
            match AssertUnwindSafe(self.next.call(ctx, req)).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    self.counters.panic();
                    counter!(PANICS_TOTAL).increment(1);
                    error!(trace_id = %trace_id, panic = %message, "recovered from panic");
                    Err(AppError::internal(anyhow::anyhow!("PANIC [{message}]")))
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
