use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::Method;
use axum::routing::get;
use sales_auth::{Auth, ROLE_ADMIN};
use sales_web::{App, Middleware, ShutdownSignal, handler_fn};
use tokio::sync::mpsc;

use crate::metrics::Counters;
use crate::middleware::auth::authenticate;
use crate::middleware::errors::Errors;
use crate::middleware::logger::Logger;
use crate::middleware::metrics::Metrics;
use crate::middleware::panics::Panics;
use crate::middleware::role::{Denial, authorize};
use crate::modules::check::controller::{self as check, DebugState};
use crate::modules::users::controller::UserHandlers;
use crate::modules::users::service::UserCore;

/// Everything the API routes need.
pub struct ApiMuxConfig {
    pub shutdown: mpsc::Sender<ShutdownSignal>,
    pub auth: Arc<Auth>,
    pub users: Arc<UserCore>,
    pub counters: Arc<Counters>,
    pub issuer: String,
    pub token_ttl: chrono::Duration,
    pub request_timeout: Duration,
}

/// App-wide middleware, outermost first. Logging must see the status chosen
/// by error translation, and panics must be recovered inside it so they are
/// still answered.
pub fn global_middleware(counters: &Arc<Counters>) -> Vec<Arc<dyn Middleware>> {
    vec![
        Arc::new(Logger),
        Arc::new(Errors),
        Arc::new(Metrics::new(Arc::clone(counters))),
        Arc::new(Panics::new(Arc::clone(counters))),
    ]
}

/// Builds the API with all v1 routes registered.
pub fn api_app(cfg: ApiMuxConfig) -> App {
    let mut app = App::new(cfg.shutdown, global_middleware(&cfg.counters))
        .with_request_timeout(cfg.request_timeout);

    let authenticated = authenticate(&cfg.auth);
    let admin_only = authorize(&[ROLE_ADMIN]).into_middleware();
    let admin_or_self = authorize(&[ROLE_ADMIN])
        .or_self("id")
        .deny_as(Denial::NotFound)
        .into_middleware();

    let users = Arc::new(UserHandlers::new(
        cfg.users,
        Arc::clone(&cfg.auth),
        cfg.issuer,
        cfg.token_ttl,
    ));

    let mut v1 = app.group("v1");

    v1.handle(Method::GET, "/test", check::test, &[]);
    v1.handle(
        Method::GET,
        "/testauth",
        check::test,
        &[Arc::clone(&authenticated), Arc::clone(&admin_only)],
    );

    let h = Arc::clone(&users);
    v1.handle(
        Method::GET,
        "/users/token",
        handler_fn(move |ctx, req| {
            let h = Arc::clone(&h);
            Box::pin(async move { h.token(ctx, req).await })
        }),
        &[],
    );

    let h = Arc::clone(&users);
    v1.handle(
        Method::GET,
        "/users/:id",
        handler_fn(move |ctx, req| {
            let h = Arc::clone(&h);
            Box::pin(async move { h.query_by_id(ctx, req).await })
        }),
        &[Arc::clone(&authenticated), admin_or_self],
    );

    let h = Arc::clone(&users);
    v1.handle(
        Method::POST,
        "/users",
        handler_fn(move |ctx, req| {
            let h = Arc::clone(&h);
            Box::pin(async move { h.create(ctx, req).await })
        }),
        &[authenticated, admin_only],
    );

    app
}

pub fn api_mux(cfg: ApiMuxConfig) -> Router {
    api_app(cfg).into_router()
}

/// Probes and metrics, served on their own listener without the API
/// middleware.
pub fn debug_mux(state: DebugState) -> Router {
    Router::new()
        .route("/debug/liveness", get(check::liveness))
        .route("/debug/readiness", get(check::readiness))
        .route("/debug/vars", get(check::vars))
        .route("/metrics", get(check::metrics))
        .with_state(state)
}
