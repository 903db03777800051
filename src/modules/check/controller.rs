//! Health checks.
//!
//! [`test`] is served by the main app through the full middleware chain. The
//! remaining handlers make up the debug surface, a plain axum router on its
//! own listener that bypasses the app middleware entirely.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::PrometheusHandle;
use sales_core::AppError;
use sales_web::{BoxFuture, Context, Request, respond};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::metrics::{Counters, CountersSnapshot};
use crate::modules::users::service::UserCore;

#[derive(Serialize)]
struct Status {
    status: &'static str,
}

pub fn test<'a>(ctx: &'a mut Context, _req: Request) -> BoxFuture<'a, Result<(), AppError>> {
    Box::pin(async move { respond(ctx, &Status { status: "OK" }, StatusCode::OK) })
}

#[derive(Clone)]
pub struct DebugState {
    pub users: Arc<UserCore>,
    pub counters: Arc<Counters>,
    pub prometheus: Option<PrometheusHandle>,
}

pub async fn liveness() -> Json<serde_json::Value> {
    Json(json!({
        "status": "up",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn readiness(State(state): State<DebugState>) -> Response {
    let ping = tokio::time::timeout(Duration::from_secs(1), state.users.ping()).await;
    match ping {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Ok(Err(err)) => {
            warn!(error = %err, "readiness failure");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "status": "db not ready" })))
                .into_response()
        }
        Err(_) => {
            warn!("readiness check timed out");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "status": "db not ready" })))
                .into_response()
        }
    }
}

pub async fn vars(State(state): State<DebugState>) -> Json<CountersSnapshot> {
    Json(state.counters.snapshot())
}

pub async fn metrics(State(state): State<DebugState>) -> Response {
    match state.prometheus {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
