//! WMS/WFS passthrough handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use geoserver_client::WmsImage;
use ogc_common::{BoundingBox, GatewayError, LayerSummary};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{error_response, gateway_error, ErrorBody};
use crate::state::AppState;

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GeometryFilterQuery {
    pub bbox: Option<String>,
    pub wkt: Option<String>,
    pub layer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestWmsQuery {
    pub layer: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /wms-capabilities - Raw GetCapabilities XML passthrough.
#[instrument(skip(state))]
pub async fn capabilities_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Response, ErrorBody> {
    state.metrics.record_wms_request();

    let xml = state.client.capabilities_xml().await.map_err(|e| {
        state.metrics.record_upstream_error();
        gateway_error(&e)
    })?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/xml")
        .body(xml.into())
        .unwrap())
}

/// GET /wms-layers - Layers scraped from capabilities, with fallback to
/// the configured defaults. Never returns an error status.
#[instrument(skip(state))]
pub async fn wms_layers_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    state.metrics.record_wms_request();

    let layers: Vec<LayerSummary> = state.client.list_layers().await;
    info!(count = layers.len(), "Returning WMS layer list");
    Json(serde_json::json!({ "layers": layers }))
}

/// GET /test-wms - Connectivity probe: request a small map image.
#[instrument(skip(state))]
pub async fn test_wms_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<TestWmsQuery>,
) -> Result<Response, ErrorBody> {
    state.metrics.record_wms_request();

    let layer = query.layer.unwrap_or_else(|| default_layer(&state));
    let image = state.client.test_map(&layer).await.map_err(|e| {
        state.metrics.record_upstream_error();
        gateway_error(&e)
    })?;

    Ok(image_response(image))
}

/// GET /wms-filter - Map image restricted to features intersecting the
/// given extent.
///
/// Accepts `bbox=minx,miny,maxx,maxy`; a `wkt` parameter alone is rejected
/// because the map extent is still needed to render.
#[instrument(skip(state))]
pub async fn wms_filter_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<GeometryFilterQuery>,
) -> Result<Response, ErrorBody> {
    state.metrics.record_wms_request();

    let (bbox, wkt) = match (&query.bbox, &query.wkt) {
        (Some(bbox_str), _) => {
            let bbox = BoundingBox::from_wms_string(bbox_str)
                .map_err(|_| gateway_error(&GatewayError::InvalidBbox(bbox_str.clone())))?;
            (bbox, bbox.to_polygon_wkt())
        }
        (None, Some(_)) => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "BBOX is required when using WKT",
            ))
        }
        (None, None) => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "Provide 'bbox' or 'wkt'",
            ))
        }
    };

    let layer = query.layer.clone().unwrap_or_else(|| default_layer(&state));
    info!(layer = %layer, bbox = %bbox.to_wms_string(), "Filtered map request");

    let image = state
        .client
        .get_map_filtered(&layer, &bbox, &wkt)
        .await
        .map_err(|e| {
            state.metrics.record_upstream_error();
            gateway_error(&e)
        })?;

    Ok(image_response(image))
}

/// GET /wms-proxy - Forward arbitrary WMS parameters upstream, filling in
/// defaults for anything omitted.
#[instrument(skip(state, params))]
pub async fn wms_proxy_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ErrorBody> {
    state.metrics.record_wms_request();

    let image = state.client.get_map(params).await.map_err(|e| {
        state.metrics.record_upstream_error();
        warn!(error = %e, "WMS proxy request failed");
        gateway_error(&e)
    })?;

    Ok(image_response(image))
}

/// GET /wms-features - GeoJSON features intersecting the given geometry.
///
/// Unlike `/wms-filter`, a standalone `wkt` is accepted here: no map
/// extent is needed for vector results.
#[instrument(skip(state))]
pub async fn wms_features_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<GeometryFilterQuery>,
) -> Result<Json<serde_json::Value>, ErrorBody> {
    state.metrics.record_wms_request();

    let wkt = match (&query.bbox, &query.wkt) {
        (Some(bbox_str), _) => BoundingBox::from_wms_string(bbox_str)
            .map_err(|_| gateway_error(&GatewayError::InvalidBbox(bbox_str.clone())))?
            .to_polygon_wkt(),
        (None, Some(wkt)) => wkt.clone(),
        (None, None) => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "Provide 'bbox' or 'wkt'",
            ))
        }
    };

    let layer = query.layer.clone().unwrap_or_else(|| default_layer(&state));
    let doc = state.client.wfs_geojson(&layer, &wkt).await.map_err(|e| {
        state.metrics.record_upstream_error();
        gateway_error(&e)
    })?;

    Ok(Json(doc))
}

// ============================================================================
// Helpers
// ============================================================================

/// The layer used when a passthrough request does not name one.
fn default_layer(state: &AppState) -> String {
    state
        .config
        .layers
        .first()
        .map(|l| l.id.0.clone())
        .unwrap_or_else(|| "Picarro:Boundary".to_string())
}

fn image_response(image: WmsImage) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, image.content_type)
        .body(image.bytes.into())
        .unwrap()
}
