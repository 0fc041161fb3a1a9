//! GIS gateway service library.
//!
//! HTTP glue layer in front of a GeoServer instance: forwards WMS/WFS
//! requests, reshapes responses, and serves convenience endpoints to a
//! map-based frontend.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the gateway router.
///
/// `prometheus` is optional so tests can construct the router without
/// installing a global metrics recorder.
pub fn build_router(state: Arc<AppState>, prometheus: Option<PrometheusHandle>) -> Router {
    let mut app = Router::new()
        // Service info and health
        .route("/", get(handlers::health::root_handler))
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // JSON API
        .route("/api/layers", get(handlers::api::layers_handler))
        .route("/api/spatial-query", post(handlers::api::spatial_query_handler))
        .route("/api/features", get(handlers::api::features_handler))
        .route("/api/performance", get(handlers::api::performance_handler))
        // WMS/WFS passthroughs
        .route("/wms-capabilities", get(handlers::wms::capabilities_handler))
        .route("/wms-layers", get(handlers::wms::wms_layers_handler))
        .route("/test-wms", get(handlers::wms::test_wms_handler))
        .route("/wms-filter", get(handlers::wms::wms_filter_handler))
        .route("/wms-proxy", get(handlers::wms::wms_proxy_handler))
        .route("/wms-features", get(handlers::wms::wms_features_handler))
        // Layer extensions
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    if let Some(handle) = prometheus {
        app = app.layer(Extension(handle));
    }

    app
}
