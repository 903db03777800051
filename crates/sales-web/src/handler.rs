//! Handlers and the middleware that wraps them.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use sales_core::AppError;

use crate::context::Context;

pub type Request = axum::extract::Request;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One unit of request processing.
///
/// A handler either writes a response into the [`Context`] and returns
/// `Ok(())`, or returns an error for the error layer to turn into one.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
    ) -> BoxFuture<'a, Result<(), AppError>>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Context, Request) -> BoxFuture<'a, Result<(), AppError>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        self(ctx, req)
    }
}

/// Pins down a closure's signature as a [`Handler`].
///
/// Closures only infer a return type borrowing from their argument when the
/// expected signature is known at the call site, so wrap stateful route
/// closures in this:
///
/// ```ignore
/// let users = Arc::clone(&users);
/// app.handle(Method::GET, "v1", "/users/:id", handler_fn(move |ctx, req| {
///     let users = Arc::clone(&users);
///     Box::pin(async move { users.query_by_id(ctx, req).await })
/// }), &[]);
/// ```
pub fn handler_fn<F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut Context, Request) -> BoxFuture<'a, Result<(), AppError>>
        + Send
        + Sync
        + 'static,
{
    f
}

pub type BoxedHandler = Arc<dyn Handler>;

/// A cross-cutting concern applied around a handler.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

/// Wraps `handler` so that `mw[0]` is the outermost layer: it runs first on
/// the way in and last on the way out.
pub fn wrap_middleware(mw: &[Arc<dyn Middleware>], handler: BoxedHandler) -> BoxedHandler {
    mw.iter().rev().fold(handler, |next, m| m.wrap(next))
}
