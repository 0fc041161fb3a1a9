//! WMS GetMap passthroughs and the WFS GeoJSON passthrough.

use std::collections::HashMap;

use bytes::Bytes;
use ogc_common::{BoundingBox, GatewayError, GatewayResult};
use serde_json::Value;
use tracing::{info, warn};

use crate::capabilities::snippet;
use crate::{intersects_filter, GeoServerClient};

/// A rendered map image (or whatever bytes the WMS returned).
#[derive(Debug, Clone)]
pub struct WmsImage {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Parameters filled in when the caller omits them from a proxy request.
const WMS_DEFAULTS: [(&str, &str); 5] = [
    ("service", "WMS"),
    ("version", "1.1.1"),
    ("request", "GetMap"),
    ("format", "image/png"),
    ("srs", "EPSG:4326"),
];

/// Fill in missing WMS parameters, matching keys case-insensitively.
pub(crate) fn fill_wms_defaults(params: &mut HashMap<String, String>) {
    for (key, value) in WMS_DEFAULTS {
        if !params.keys().any(|k| k.eq_ignore_ascii_case(key)) {
            params.insert(key.to_string(), value.to_string());
        }
    }
}

impl GeoServerClient {
    /// Flexible GetMap passthrough: forwards the caller's parameters,
    /// filling in defaults for service, version, request, format, and srs.
    pub async fn get_map(&self, mut params: HashMap<String, String>) -> GatewayResult<WmsImage> {
        fill_wms_defaults(&mut params);

        let response = self
            .http()
            .get(self.wms_url())
            .query(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        let content_type = content_type_of(&response, "image/png");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamStatus {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(WmsImage {
            bytes,
            content_type,
        })
    }

    /// GetMap restricted to features intersecting `wkt`, rendered over the
    /// given extent as a transparent 800x600 PNG.
    ///
    /// If the filtered request fails upstream, retries once without the CQL
    /// filter; some layers reject spatial predicates outright.
    pub async fn get_map_filtered(
        &self,
        layer: &str,
        bbox: &BoundingBox,
        wkt: &str,
    ) -> GatewayResult<WmsImage> {
        let field = self
            .candidate_geometry_fields(layer)
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| "geom".to_string());
        let filter = intersects_filter(&field, wkt);

        let mut params = base_map_params(layer, bbox);
        params.push(("CQL_FILTER", filter));

        match self.send_map_request(&params).await {
            Ok(image) => Ok(image),
            Err(e) => {
                warn!(layer = %layer, error = %e, "Filtered GetMap failed, retrying without filter");
                params.pop();
                self.send_map_request(&params).await
            }
        }
    }

    /// GeoJSON features intersecting `wkt`, fetched via WFS 1.0.0 without
    /// pagination. Returns the raw upstream document.
    pub async fn wfs_geojson(&self, layer: &str, wkt: &str) -> GatewayResult<Value> {
        let field = self
            .candidate_geometry_fields(layer)
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| "geom".to_string());
        let filter = intersects_filter(&field, wkt);

        let params = [
            ("service", "WFS"),
            ("version", "1.0.0"),
            ("request", "GetFeature"),
            ("typeName", layer),
            ("outputFormat", "application/json"),
            ("CQL_FILTER", filter.as_str()),
            ("srsName", "EPSG:4326"),
        ];

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

        let count = doc
            .get("features")
            .and_then(|f| f.as_array())
            .map(|f| f.len())
            .unwrap_or(0);
        info!(layer = %layer, count = count, "WFS GeoJSON passthrough succeeded");

        Ok(doc)
    }

    /// Connectivity probe: request a small fixed-extent map tile and verify
    /// the upstream actually returns an image.
    pub async fn test_map(&self, layer: &str) -> GatewayResult<WmsImage> {
        let params = [
            ("service", "WMS"),
            ("version", "1.1.1"),
            ("request", "GetMap"),
            ("layers", layer),
            ("styles", ""),
            ("bbox", "-100,30,-90,40"),
            ("width", "256"),
            ("height", "256"),
            ("srs", "EPSG:4326"),
            ("format", "image/png"),
            ("TRANSPARENT", "true"),
        ];

        let response = self
            .http()
            .get(self.wms_url())
            .query(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        let content_type = content_type_of(&response, "");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamStatus {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        if !content_type.contains("image") {
            return Err(GatewayError::UnexpectedContentType(content_type));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(WmsImage {
            bytes,
            content_type: "image/png".to_string(),
        })
    }

    async fn send_map_request(&self, params: &[(&str, String)]) -> GatewayResult<WmsImage> {
        let response = self
            .http()
            .get(self.wms_url())
            .query(params)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        let content_type = content_type_of(&response, "image/png");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamStatus {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(WmsImage {
            bytes,
            content_type,
        })
    }
}

fn base_map_params(layer: &str, bbox: &BoundingBox) -> Vec<(&'static str, String)> {
    vec![
        ("service", "WMS".to_string()),
        ("version", "1.1.1".to_string()),
        ("request", "GetMap".to_string()),
        ("layers", layer.to_string()),
        ("styles", String::new()),
        ("bbox", bbox.to_wms_string()),
        ("width", "800".to_string()),
        ("height", "600".to_string()),
        ("srs", "EPSG:4326".to_string()),
        ("format", "image/png".to_string()),
        ("TRANSPARENT", "true".to_string()),
    ]
}

fn content_type_of(response: &reqwest::Response, default: &str) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(default)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_wms_defaults() {
        let mut params = HashMap::new();
        params.insert("layers".to_string(), "Picarro:Boundary".to_string());
        fill_wms_defaults(&mut params);

        assert_eq!(params.get("service").map(String::as_str), Some("WMS"));
        assert_eq!(params.get("version").map(String::as_str), Some("1.1.1"));
        assert_eq!(params.get("request").map(String::as_str), Some("GetMap"));
        assert_eq!(params.get("format").map(String::as_str), Some("image/png"));
        assert_eq!(params.get("srs").map(String::as_str), Some("EPSG:4326"));
    }

    #[test]
    fn test_fill_wms_defaults_respects_caller_values() {
        let mut params = HashMap::new();
        params.insert("REQUEST".to_string(), "GetFeatureInfo".to_string());
        params.insert("format".to_string(), "image/jpeg".to_string());
        fill_wms_defaults(&mut params);

        // Case-insensitive match: caller's REQUEST wins, no lowercase dup
        assert!(!params.contains_key("request"));
        assert_eq!(params.get("REQUEST").map(String::as_str), Some("GetFeatureInfo"));
        assert_eq!(params.get("format").map(String::as_str), Some("image/jpeg"));
    }

    #[test]
    fn test_base_map_params_extent() {
        let bbox = BoundingBox::new(-100.0, 30.0, -90.0, 40.0);
        let params = base_map_params("Picarro:Boundary", &bbox);
        let bbox_param = params.iter().find(|(k, _)| *k == "bbox").unwrap();
        assert_eq!(bbox_param.1, "-100,30,-90,40");
        assert!(params.iter().any(|(k, v)| *k == "width" && v == "800"));
        assert!(params.iter().any(|(k, v)| *k == "height" && v == "600"));
    }
}
