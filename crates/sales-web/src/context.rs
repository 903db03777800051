//! Per-request state threaded through the handler chain.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;

use axum::http::{Extensions, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Utc};
use sales_core::AppError;
use tokio::time::Instant;
use tracing::Span;

/// Trace id reported when a request has no [`Values`] attached.
pub const NIL_TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

/// State created once per request by the router before any middleware runs.
#[derive(Debug, Clone)]
pub struct Values {
    pub trace_id: String,
    pub now: DateTime<Utc>,
    pub tracer: Span,
    status_code: Option<StatusCode>,
}

impl Values {
    pub fn new(trace_id: impl Into<String>, now: DateTime<Utc>, tracer: Span) -> Self {
        Self {
            trace_id: trace_id.into(),
            now,
            tracer,
            status_code: None,
        }
    }

    /// Status of the response written for this request, once one has been.
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status_code
    }
}

/// The request scope.
///
/// Owned by the dispatching task and passed by `&mut` down the chain, so no
/// locking is needed and nothing leaks between requests.
#[derive(Default)]
pub struct Context {
    values: Option<Values>,
    params: HashMap<String, String>,
    remote_addr: Option<SocketAddr>,
    deadline: Option<Instant>,
    extensions: Extensions,
    response: Option<Response>,
}

impl Context {
    pub fn new(values: Values) -> Self {
        Self {
            values: Some(values),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_remote_addr(mut self, addr: Option<SocketAddr>) -> Self {
        self.remote_addr = addr;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn values(&self) -> Option<&Values> {
        self.values.as_ref()
    }

    /// Values for this request. Their absence means the router was bypassed,
    /// which the server cannot recover from.
    pub fn require_values(&self) -> Result<&Values, AppError> {
        self.values.as_ref().ok_or_else(missing_values)
    }

    pub fn set_status_code(&mut self, status: StatusCode) -> Result<(), AppError> {
        let values = self.values.as_mut().ok_or_else(missing_values)?;
        values.status_code = Some(status);
        Ok(())
    }

    pub fn trace_id(&self) -> &str {
        self.values
            .as_ref()
            .map(|v| v.trace_id.as_str())
            .unwrap_or(NIL_TRACE_ID)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Typed slots for data middleware hands to inner layers (parsed claims).
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// Stores the response for this request. Only one may be written.
    pub fn set_response(&mut self, response: Response) -> Result<(), AppError> {
        if self.response.is_some() {
            return Err(AppError::internal(anyhow::anyhow!(
                "response already written for trace id {}",
                self.trace_id()
            )));
        }
        self.response = Some(response);
        Ok(())
    }

    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }
}

fn missing_values() -> AppError {
    AppError::shutdown("web value missing from context")
}

/// Runs `fut` against the request deadline, failing with 503 when it passes.
pub async fn run_until<F, T>(deadline: Option<Instant>, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| {
                AppError::request(StatusCode::SERVICE_UNAVAILABLE, "request deadline exceeded")
            })?,
        None => fut.await,
    }
}
