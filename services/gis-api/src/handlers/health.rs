//! Health, info, and Prometheus endpoints.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::state::AppState;

/// GET / - Service info document.
pub async fn root_handler(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "GIS gateway is running",
        "timestamp": Utc::now().to_rfc3339(),
        "geoserver_url": state.config.geoserver_url,
        "workspace": state.config.workspace,
        "endpoints": [
            "/api/layers",
            "/api/spatial-query",
            "/api/features",
            "/api/performance",
            "/wms-capabilities",
            "/wms-layers",
            "/wms-filter",
            "/wms-proxy",
            "/wms-features",
            "/test-wms",
        ],
    }))
}

/// GET /health - Basic health check.
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler(
    prometheus: Option<Extension<PrometheusHandle>>,
) -> impl IntoResponse {
    match prometheus {
        Some(Extension(handle)) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
