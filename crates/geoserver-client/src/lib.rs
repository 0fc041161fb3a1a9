//! HTTP client for a GeoServer WMS/WFS endpoint.
//!
//! Wraps a [`reqwest::Client`] and normalizes GeoServer's inconsistent
//! responses: capabilities scraping with a fallback layer list, feature
//! counts from `resultType=hits` XML, and paginated GetFeature queries with
//! geometry-column probing.

mod capabilities;
mod features;
mod hits;
mod wms;

pub use features::FeaturePage;
pub use wms::WmsImage;

use std::collections::HashMap;
use std::time::Duration;

use ogc_common::{GatewayError, GatewayResult, LayerDescriptor};
use tokio::sync::RwLock;

/// Configuration for the GeoServer client.
#[derive(Debug, Clone)]
pub struct GeoServerConfig {
    /// Base URL of the GeoServer instance, without a trailing slash
    /// (e.g. "http://localhost:8181/geoserver").
    pub base_url: String,
    /// Workspace the gateway fronts (e.g. "Picarro").
    pub workspace: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Candidate geometry column names, probed in order. The working name
    /// is not discoverable generically, so this is deployment configuration.
    pub geometry_fields: Vec<String>,
    /// Layers served when the capabilities document cannot be used.
    pub default_layers: Vec<LayerDescriptor>,
}

impl Default for GeoServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8181/geoserver".to_string(),
            workspace: "Picarro".to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            geometry_fields: vec![
                "geom".to_string(),
                "the_geom".to_string(),
                "geometry".to_string(),
            ],
            default_layers: vec![
                LayerDescriptor::new("Picarro:Boundary", "Boundary", true),
                LayerDescriptor::new("Picarro:OtherLayer", "Other Layer", false),
            ],
        }
    }
}

/// Client for GeoServer's WMS/WFS HTTP API.
pub struct GeoServerClient {
    http: reqwest::Client,
    config: GeoServerConfig,
    /// Geometry column resolved per layer after the first successful probe,
    /// so the candidate loop runs at most once per layer.
    resolved_geometry: RwLock<HashMap<String, String>>,
}

impl GeoServerClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GeoServerConfig) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| GatewayError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            resolved_geometry: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &GeoServerConfig {
        &self.config
    }

    /// Workspace-scoped WMS endpoint URL.
    pub fn wms_url(&self) -> String {
        format!("{}/{}/wms", self.config.base_url, self.config.workspace)
    }

    /// Workspace-scoped WFS endpoint URL.
    pub fn wfs_url(&self) -> String {
        format!("{}/{}/wfs", self.config.base_url, self.config.workspace)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The geometry column resolved for a layer, if a probe has succeeded.
    pub async fn resolved_geometry_field(&self, layer: &str) -> Option<String> {
        self.resolved_geometry.read().await.get(layer).cloned()
    }

    pub(crate) async fn remember_geometry_field(&self, layer: &str, field: &str) {
        self.resolved_geometry
            .write()
            .await
            .insert(layer.to_string(), field.to_string());
    }

    /// Candidate geometry columns for a layer, resolved column first.
    pub(crate) async fn candidate_geometry_fields(&self, layer: &str) -> Vec<String> {
        let mut candidates = Vec::with_capacity(self.config.geometry_fields.len() + 1);
        if let Some(resolved) = self.resolved_geometry_field(layer).await {
            candidates.push(resolved);
        }
        for field in &self.config.geometry_fields {
            if !candidates.contains(field) {
                candidates.push(field.clone());
            }
        }
        candidates
    }
}

/// Build a CQL INTERSECTS predicate for a geometry column and WKT string.
///
/// The WKT is forwarded verbatim; malformed geometry surfaces as an
/// upstream error.
pub(crate) fn intersects_filter(field: &str, wkt: &str) -> String {
    format!("INTERSECTS({}, {})", field, wkt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let client = GeoServerClient::new(GeoServerConfig::default()).unwrap();
        assert_eq!(client.wms_url(), "http://localhost:8181/geoserver/Picarro/wms");
        assert_eq!(client.wfs_url(), "http://localhost:8181/geoserver/Picarro/wfs");
    }

    #[test]
    fn test_intersects_filter() {
        assert_eq!(
            intersects_filter("the_geom", "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))"),
            "INTERSECTS(the_geom, POLYGON((0 0, 1 0, 1 1, 0 1, 0 0)))"
        );
    }

    #[tokio::test]
    async fn test_candidates_start_with_resolved_field() {
        let client = GeoServerClient::new(GeoServerConfig::default()).unwrap();
        assert_eq!(
            client.candidate_geometry_fields("Picarro:Boundary").await,
            vec!["geom", "the_geom", "geometry"]
        );

        client
            .remember_geometry_field("Picarro:Boundary", "the_geom")
            .await;
        assert_eq!(
            client.candidate_geometry_fields("Picarro:Boundary").await,
            vec!["the_geom", "geom", "geometry"]
        );
    }
}
