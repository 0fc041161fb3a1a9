//! JSON API handlers for the map frontend.
//!
//! Provides endpoints for:
//! - Listing configured layers
//! - Multi-layer spatial intersection queries
//! - Paginated per-layer feature queries
//! - Performance metrics

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use ogc_common::{LayerDescriptor, PageInfo, PageParams};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::{error_response, gateway_error, ErrorBody};
use crate::state::AppState;

/// Spatial-query cap: the frontend never renders more than this per layer.
const SPATIAL_QUERY_MAX_FEATURES: u32 = 1000;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SpatialQueryRequest {
    /// Query geometry in WKT. Forwarded verbatim; never validated here.
    pub geometry: Option<String>,
    /// Layer IDs to query.
    #[serde(default)]
    pub layers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LayersResponse {
    pub layers: Vec<LayerDescriptor>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerQueryResult {
    pub success: bool,
    pub features: Vec<Value>,
    pub count: usize,
    /// Upstream fetch time in milliseconds.
    pub load_time: f64,
    pub layer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialQueryResponse {
    pub success: bool,
    pub results: HashMap<String, LayerQueryResult>,
    /// Total wall time for all layers, milliseconds.
    pub total_time: f64,
    pub query_time: String,
    pub geometry: String,
}

#[derive(Debug, Deserialize)]
pub struct FeaturesQuery {
    pub layer: Option<String>,
    pub geometry: Option<String>,
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
    #[serde(rename = "getTotalCount")]
    pub get_total_count: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub features: Vec<Value>,
    pub pagination: PageInfo,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/layers - Configured layer list.
///
/// Served from configuration rather than live capabilities so the frontend
/// can render its layer panel even when GeoServer is down.
#[instrument(skip(state))]
pub async fn layers_handler(Extension(state): Extension<Arc<AppState>>) -> Json<LayersResponse> {
    state.metrics.record_api_request();
    Json(LayersResponse {
        layers: state.config.layers.clone(),
    })
}

/// POST /api/spatial-query - Query multiple layers for features
/// intersecting a WKT geometry.
#[instrument(skip(state, request))]
pub async fn spatial_query_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<SpatialQueryRequest>,
) -> Result<Json<SpatialQueryResponse>, ErrorBody> {
    state.metrics.record_api_request();

    let geometry = match request.geometry.as_deref() {
        Some(g) if !g.trim().is_empty() => g.to_string(),
        _ => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "Geometry (WKT) is required",
            ))
        }
    };

    if request.layers.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "At least one layer is required",
        ));
    }

    let start = Instant::now();
    let mut results = HashMap::with_capacity(request.layers.len());

    // Layers are queried sequentially; per-layer failures become
    // per-layer results, never a failed envelope.
    for layer_id in &request.layers {
        let layer_start = Instant::now();
        let outcome = state
            .client
            .query_layer(layer_id, &geometry, SPATIAL_QUERY_MAX_FEATURES)
            .await;
        let load_time = layer_start.elapsed().as_secs_f64() * 1000.0;
        let layer_name = state.config.layer_title(layer_id);

        let result = match outcome {
            Ok(features) => LayerQueryResult {
                success: true,
                count: features.len(),
                features,
                load_time,
                layer_name,
                error: None,
            },
            Err(e) => {
                warn!(layer = %layer_id, error = %e, "Spatial query failed for layer");
                state.metrics.record_upstream_error();
                LayerQueryResult {
                    success: false,
                    features: Vec::new(),
                    count: 0,
                    load_time,
                    layer_name,
                    error: Some(e.to_string()),
                }
            }
        };
        results.insert(layer_id.clone(), result);
    }

    let total_time = start.elapsed().as_secs_f64() * 1000.0;
    state
        .metrics
        .record_timing("spatial_query", start.elapsed().as_micros() as u64)
        .await;
    info!(
        layers = request.layers.len(),
        total_time_ms = total_time,
        "Spatial query completed"
    );

    Ok(Json(SpatialQueryResponse {
        success: true,
        results,
        total_time,
        query_time: Utc::now().to_rfc3339(),
        geometry,
    }))
}

/// GET /api/features - Paginated features for one layer, optionally
/// filtered by a WKT geometry.
#[instrument(skip(state))]
pub async fn features_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<FeaturesQuery>,
) -> Result<Json<FeaturesResponse>, ErrorBody> {
    state.metrics.record_api_request();

    let Some(layer) = query.layer.filter(|l| !l.is_empty()) else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Layer ID is required",
        ));
    };

    // "1=1" is the frontend's no-op filter.
    let geometry = query
        .geometry
        .as_deref()
        .filter(|g| !g.is_empty() && *g != "1=1");

    let page = PageParams::new(query.page.unwrap_or(1), query.page_size.unwrap_or(100));
    let start = Instant::now();

    // The count request runs regardless of getTotalCount: pagination
    // metadata needs it either way. The hits request is cheap.
    if query.get_total_count.unwrap_or(false) {
        info!(layer = %layer, "Total count explicitly requested");
    }
    let total_features = state.client.feature_count(&layer, geometry).await;

    let feature_page = state
        .client
        .get_features(&layer, geometry, page)
        .await
        .map_err(|e| {
            state.metrics.record_upstream_error();
            gateway_error(&e)
        })?;

    state
        .metrics
        .record_timing("features", start.elapsed().as_micros() as u64)
        .await;

    let pagination = PageInfo::compute(page, total_features, feature_page.features.len());
    info!(
        layer = %layer,
        returned = feature_page.features.len(),
        total = total_features,
        page = page.page,
        "Features request completed"
    );

    Ok(Json(FeaturesResponse {
        features: feature_page.features,
        pagination,
    }))
}

/// GET /api/performance - Metrics snapshot for recent queries.
#[instrument(skip(state))]
pub async fn performance_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    use std::sync::atomic::Ordering;

    let endpoints = state.metrics.endpoint_timings().await;

    Json(serde_json::json!({
        "requests": {
            "api": state.metrics.api_requests.load(Ordering::Relaxed),
            "wms": state.metrics.wms_requests.load(Ordering::Relaxed),
            "upstreamErrors": state.metrics.upstream_errors.load(Ordering::Relaxed),
        },
        "endpoints": endpoints,
        "uptimeSeconds": state.metrics.uptime_secs(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_query_result_serialization() {
        let result = LayerQueryResult {
            success: true,
            features: vec![serde_json::json!({"type": "Feature"})],
            count: 1,
            load_time: 12.5,
            layer_name: "Boundary".to_string(),
            error: None,
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"loadTime\":12.5"));
        assert!(json.contains("\"layerName\":\"Boundary\""));
        // error is omitted on success
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_failed_layer_result_serialization() {
        let result = LayerQueryResult {
            success: false,
            features: Vec::new(),
            count: 0,
            load_time: 3.0,
            layer_name: "Boundary".to_string(),
            error: Some("No working geometry field found".to_string()),
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"error\":\"No working geometry field found\""));
    }

    #[test]
    fn test_spatial_query_request_defaults() {
        let request: SpatialQueryRequest = serde_json::from_str("{}").unwrap();
        assert!(request.geometry.is_none());
        assert!(request.layers.is_empty());
    }
}
