use axum::body::{Body, to_bytes};
use axum::http::{StatusCode, header};
use axum::response::Response;
use sales_core::AppError;
use sales_core::validate::check;
use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::context::Context;
use crate::handler::Request;

/// Largest request body [`decode`] will buffer.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Writes `data` as the JSON response for this request and records `status`
/// in the request values. `204 No Content` is sent without a body.
pub fn respond<T>(ctx: &mut Context, data: &T, status: StatusCode) -> Result<(), AppError>
where
    T: Serialize + ?Sized,
{
    if ctx.has_response() {
        return Err(AppError::internal(anyhow::anyhow!(
            "response already written for trace id {}",
            ctx.trace_id()
        )));
    }

    let response = if status == StatusCode::NO_CONTENT {
        Response::builder().status(status).body(Body::empty())?
    } else {
        let body = serde_json::to_vec(data)?;
        Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))?
    };

    ctx.set_status_code(status)?;
    ctx.set_response(response)
}

/// Reads a JSON body and validates it.
pub async fn decode<T>(req: Request) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    let bytes = to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::bad_request(format!("unable to read payload: {e}")))?;
    let value: T = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request(format!("unable to decode payload: {e}")))?;
    check(&value)?;
    Ok(value)
}
