//! # Sales Web
//!
//! A small request framework on top of axum.
//!
//! - [`context`]: the per-request [`Context`] and its [`Values`]
//! - [`handler`]: the [`Handler`] and [`Middleware`] traits
//! - [`app`]: [`App`], which binds method + path + middleware to handlers
//!   and dispatches requests through the composed chain
//! - [`respond`]: writing JSON responses and decoding JSON payloads
//!
//! Handlers take the request scope by `&mut` and either write exactly one
//! response into it or return an [`AppError`](sales_core::AppError) for the
//! error middleware to translate.
//!
//! # Example
//!
//! ```ignore
//! use sales_web::{App, BoxFuture, Context, Request, respond};
//!
//! fn health<'a>(ctx: &'a mut Context, _req: Request) -> BoxFuture<'a, Result<(), AppError>> {
//!     Box::pin(async move { respond(ctx, &json!({ "status": "OK" }), StatusCode::OK) })
//! }
//!
//! let mut app = App::new(shutdown_tx, vec![logger, errors]);
//! app.handle(Method::GET, "v1", "/health", health, &[]);
//! axum::serve(listener, app.into_router()).await?;
//! ```

pub mod app;
pub mod context;
pub mod handler;
pub mod respond;

// Re-export commonly used types at crate root
pub use app::{App, Group, ShutdownSignal};
pub use context::{Context, NIL_TRACE_ID, Values, run_until};
pub use handler::{
    BoxFuture, BoxedHandler, Handler, Middleware, Request, handler_fn, wrap_middleware,
};
pub use respond::{decode, respond};
