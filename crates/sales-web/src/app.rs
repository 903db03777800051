//! The application router.
//!
//! Routes live in one radix tree per HTTP method. Every registered handler is
//! wrapped in its route middleware and then in the app-wide middleware once,
//! at registration, so dispatch is a lookup plus one call.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use chrono::Utc;
use sales_core::{AppError, ErrorResponse};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{Instrument, error, field, info_span};
use uuid::Uuid;

use crate::context::{Context, Values};
use crate::handler::{BoxFuture, BoxedHandler, Handler, Middleware, Request, wrap_middleware};
use crate::respond::respond;

/// Raised when a request surfaces an error the process cannot recover from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownSignal {
    pub trace_id: String,
    pub reason: String,
}

pub struct App {
    routes: HashMap<Method, matchit::Router<BoxedHandler>>,
    mw: Vec<Arc<dyn Middleware>>,
    not_found: BoxedHandler,
    method_not_allowed: BoxedHandler,
    shutdown: mpsc::Sender<ShutdownSignal>,
    request_timeout: Option<Duration>,
}

impl App {
    /// `mw` wraps every route, `mw[0]` outermost.
    pub fn new(shutdown: mpsc::Sender<ShutdownSignal>, mw: Vec<Arc<dyn Middleware>>) -> Self {
        let not_found = wrap_middleware(&mw, Arc::new(Unmatched(StatusCode::NOT_FOUND)));
        let method_not_allowed =
            wrap_middleware(&mw, Arc::new(Unmatched(StatusCode::METHOD_NOT_ALLOWED)));
        Self {
            routes: HashMap::new(),
            mw,
            not_found,
            method_not_allowed,
            shutdown,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Registers `handler` for `method` at `/{version}{path}`. `path` may use
    /// `:name` segments, available through [`Context::param`]. `mw` wraps this
    /// route only and runs inside the app-wide middleware.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid or conflicts with an existing route.
    pub fn handle<H: Handler>(
        &mut self,
        method: Method,
        version: &str,
        path: &str,
        handler: H,
        mw: &[Arc<dyn Middleware>],
    ) {
        let handler = wrap_middleware(mw, Arc::new(handler));
        let handler = wrap_middleware(&self.mw, handler);

        let pattern = route_pattern(version, path);
        if let Err(e) = self
            .routes
            .entry(method.clone())
            .or_insert_with(matchit::Router::new)
            .insert(pattern.clone(), handler)
        {
            panic!("invalid route {method} {pattern}: {e}");
        }
    }

    /// Registers routes under a shared version prefix.
    pub fn group<'a>(&'a mut self, version: &'a str) -> Group<'a> {
        Group { app: self, version }
    }

    /// Converts the app into an axum router that sends every request through
    /// [`App::dispatch`].
    pub fn into_router(self) -> Router {
        let app = Arc::new(self);
        Router::new().fallback(move |req: Request| {
            let app = Arc::clone(&app);
            async move { app.dispatch(req).await }
        })
    }

    pub async fn dispatch(&self, req: Request) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        // Unmatched requests still run the app-wide middleware so they are
        // logged and counted.
        let (handler, params) = match self.lookup(&method, &path) {
            Lookup::Found(handler, params) => (handler, params),
            Lookup::MethodNotAllowed => (Arc::clone(&self.method_not_allowed), HashMap::new()),
            Lookup::NotFound => (Arc::clone(&self.not_found), HashMap::new()),
        };

        let trace_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "request",
            trace_id = %trace_id,
            method = %method,
            path = %path,
            status = field::Empty,
        );
        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let mut ctx = Context::new(Values::new(trace_id.clone(), Utc::now(), span.clone()))
            .with_params(params)
            .with_remote_addr(remote_addr)
            .with_deadline(self.request_timeout.map(|t| Instant::now() + t));

        let result = handler.call(&mut ctx, req).instrument(span.clone()).await;

        if let Err(err) = result {
            let _enter = span.enter();
            if err.is_shutdown() {
                error!(trace_id = %trace_id, error = %err, "shutdown requested");
                let signal = ShutdownSignal {
                    trace_id: trace_id.clone(),
                    reason: err.to_string(),
                };
                if let Err(e) = self.shutdown.try_send(signal) {
                    error!(trace_id = %trace_id, error = %e, "unable to signal shutdown");
                }
            } else {
                error!(trace_id = %trace_id, error = %err, "error escaped the handler chain");
            }
        }

        match ctx.take_response() {
            Some(response) => response,
            None => {
                error!(trace_id = %trace_id, "handler chain returned without writing a response");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup {
        if let Some(matched) = self.routes.get(method).and_then(|r| r.at(path).ok()) {
            let params = matched
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            return Lookup::Found(Arc::clone(matched.value), params);
        }

        let other_method_matches = self
            .routes
            .iter()
            .any(|(m, r)| m != method && r.at(path).is_ok());
        if other_method_matches {
            Lookup::MethodNotAllowed
        } else {
            Lookup::NotFound
        }
    }
}

/// Routes registered through [`App::group`].
pub struct Group<'a> {
    app: &'a mut App,
    version: &'a str,
}

impl Group<'_> {
    pub fn handle<H: Handler>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
        mw: &[Arc<dyn Middleware>],
    ) -> &mut Self {
        self.app.handle(method, self.version, path, handler, mw);
        self
    }
}

enum Lookup {
    Found(BoxedHandler, HashMap<String, String>),
    MethodNotAllowed,
    NotFound,
}

/// Joins the version prefix and path, translating `:name` and `*name`
/// segments into the radix tree's `{name}` and `{*name}` syntax.
fn route_pattern(version: &str, path: &str) -> String {
    let path = path
        .split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                format!("{{*{name}}}")
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    let version = version.trim_matches('/');
    if version.is_empty() {
        path
    } else {
        format!("/{version}{path}")
    }
}

/// Terminal handler for requests no route matched.
struct Unmatched(StatusCode);

impl Handler for Unmatched {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        _req: Request,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        let message = self.0.canonical_reason().unwrap_or("Not Found");
        Box::pin(async move { respond(ctx, &ErrorResponse::new(message), self.0) })
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}
