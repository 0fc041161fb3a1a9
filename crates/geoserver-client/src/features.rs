//! WFS GetFeature queries with geometry-column probing.

use ogc_common::{GatewayError, GatewayResult, PageParams};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::capabilities::snippet;
use crate::{intersects_filter, GeoServerClient};

/// One page of GeoJSON features from a GetFeature request.
#[derive(Debug, Clone)]
pub struct FeaturePage {
    /// Raw GeoJSON feature objects.
    pub features: Vec<Value>,
    /// Geometry column the query used, when a spatial filter was applied.
    pub geometry_field: Option<String>,
}

impl GeoServerClient {
    /// Fetch a page of features from a layer (WFS 1.1.0,
    /// `outputFormat=application/json`), optionally filtered to features
    /// intersecting `geometry_wkt`.
    pub async fn get_features(
        &self,
        layer: &str,
        geometry_wkt: Option<&str>,
        page: PageParams,
    ) -> GatewayResult<FeaturePage> {
        let max_features = page.page_size.to_string();
        let start_index = page.start_index().to_string();
        let paging = [
            ("maxFeatures", max_features.as_str()),
            ("startIndex", start_index.as_str()),
        ];

        match geometry_wkt {
            None => {
                let features = self.fetch_features(layer, &paging, None).await?;
                Ok(FeaturePage {
                    features,
                    geometry_field: None,
                })
            }
            Some(wkt) => self.fetch_with_geometry_probe(layer, wkt, &paging).await,
        }
    }

    /// Fetch up to `max_features` features intersecting `geometry_wkt`,
    /// without pagination. Used by the spatial-query endpoint.
    pub async fn query_layer(
        &self,
        layer: &str,
        geometry_wkt: &str,
        max_features: u32,
    ) -> GatewayResult<Vec<Value>> {
        let max_features = max_features.to_string();
        let paging = [("maxFeatures", max_features.as_str())];
        let page = self
            .fetch_with_geometry_probe(layer, geometry_wkt, &paging)
            .await?;
        Ok(page.features)
    }

    /// Try the GetFeature request against each candidate geometry column
    /// until one returns HTTP 200 with parseable JSON. The working column
    /// is cached so later requests for the same layer skip the probe.
    async fn fetch_with_geometry_probe(
        &self,
        layer: &str,
        wkt: &str,
        extra: &[(&str, &str)],
    ) -> GatewayResult<FeaturePage> {
        for field in self.candidate_geometry_fields(layer).await {
            let filter = intersects_filter(&field, wkt);
            match self.fetch_features(layer, extra, Some(&filter)).await {
                Ok(features) => {
                    info!(layer = %layer, field = %field, count = features.len(), "GetFeature succeeded");
                    self.remember_geometry_field(layer, &field).await;
                    return Ok(FeaturePage {
                        features,
                        geometry_field: Some(field),
                    });
                }
                Err(e) => {
                    debug!(layer = %layer, field = %field, error = %e, "Geometry field probe failed");
                }
            }
        }

        warn!(layer = %layer, "No working geometry field found");
        Err(GatewayError::GeometryFieldNotFound {
            layer: layer.to_string(),
        })
    }

    /// Issue one GetFeature request and pull out the `features` array.
    async fn fetch_features(
        &self,
        layer: &str,
        extra: &[(&str, &str)],
        cql_filter: Option<&str>,
    ) -> GatewayResult<Vec<Value>> {
        let mut params = vec![
            ("service", "WFS"),
            ("version", "1.1.0"),
            ("request", "GetFeature"),
            ("typeName", layer),
            ("outputFormat", "application/json"),
        ];
        params.extend_from_slice(extra);
        if let Some(filter) = cql_filter {
            params.push(("CQL_FILTER", filter));
        }

        let response = self
            .http()
            .get(self.wfs_url())
            .query(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamStatus {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        let doc: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::UpstreamJson(e.to_string()))?;

        Ok(doc
            .get("features")
            .and_then(|f| f.as_array())
            .cloned()
            .unwrap_or_default())
    }
}
