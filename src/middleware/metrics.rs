use std::sync::Arc;

use metrics::{counter, gauge};
use sales_core::AppError;
use sales_web::{BoxFuture, BoxedHandler, Context, Handler, Middleware, Request};

use crate::metrics::{Counters, REQUEST_ERRORS_TOTAL, REQUESTS_IN_FLIGHT, REQUESTS_TOTAL};

/// Counts requests, in-flight requests and errors returned by the inner
/// chain. Never changes the outcome.
pub struct Metrics {
    counters: Arc<Counters>,
}

impl Metrics {
    pub fn new(counters: Arc<Counters>) -> Self {
        Self { counters }
    }
}

struct MetricsHandler {
    counters: Arc<Counters>,
    next: BoxedHandler,
}

impl Middleware for Metrics {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(MetricsHandler {
            counters: Arc::clone(&self.counters),
            next,
        })
    }
}

impl Handler for MetricsHandler {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(async move {
            self.counters.request_started();
            counter!(REQUESTS_TOTAL).increment(1);
            gauge!(REQUESTS_IN_FLIGHT).increment(1.0);

            let result = self.next.call(ctx, req).await;

            self.counters.request_finished();
            gauge!(REQUESTS_IN_FLIGHT).decrement(1.0);
            if result.is_err() {
                self.counters.error();
                counter!(REQUEST_ERRORS_TOTAL).increment(1);
            }

            result
        })
    }
}
