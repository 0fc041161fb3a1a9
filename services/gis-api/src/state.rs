//! Application state and shared resources.

use std::sync::Arc;

use anyhow::Result;
use geoserver_client::GeoServerClient;

use crate::config::GatewayConfig;
use crate::metrics::MetricsCollector;

/// Shared application state.
pub struct AppState {
    pub config: GatewayConfig,
    pub client: GeoServerClient,
    pub metrics: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = GeoServerClient::new(config.client_config())?;
        let metrics = Arc::new(MetricsCollector::new());

        Ok(Self {
            config,
            client,
            metrics,
        })
    }
}
