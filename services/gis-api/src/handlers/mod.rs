//! HTTP request handlers.
//!
//! Split into submodules:
//! - `api` - JSON endpoints for the map frontend
//! - `wms` - WMS/WFS passthrough endpoints
//! - `health` - health, info, and Prometheus endpoints

pub mod api;
pub mod health;
pub mod wms;

use axum::http::StatusCode;
use axum::Json;
use ogc_common::GatewayError;

/// JSON error body: `{"error": "<message>"}`.
pub(crate) type ErrorBody = (StatusCode, Json<serde_json::Value>);

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> ErrorBody {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
}

/// Map a gateway error onto its HTTP status and JSON body.
pub(crate) fn gateway_error(err: &GatewayError) -> ErrorBody {
    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, err.to_string())
}
