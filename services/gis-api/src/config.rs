//! Gateway configuration from environment variables and an optional
//! layer-configuration YAML file.

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use geoserver_client::GeoServerConfig;
use ogc_common::LayerDescriptor;
use serde::Deserialize;
use tracing::{info, warn};

/// Runtime configuration for the gateway service.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the GeoServer instance.
    pub geoserver_url: String,
    /// GeoServer workspace the gateway fronts.
    pub workspace: String,
    /// Per-request timeout for upstream calls.
    pub request_timeout: Duration,
    /// Layers advertised by `/api/layers` and used as the capabilities
    /// fallback.
    pub layers: Vec<LayerDescriptor>,
    /// Geometry column candidates, probed in order. Deployment-specific.
    pub geometry_fields: Vec<String>,
}

impl GatewayConfig {
    /// Load configuration from the environment, with defaults for local
    /// development. `GATEWAY_LAYER_CONFIG` may point at a YAML file
    /// overriding the layer list and geometry-field probe order.
    pub fn from_env() -> Result<Self> {
        let geoserver_url = env::var("GEOSERVER_URL")
            .unwrap_or_else(|_| "http://localhost:8181/geoserver".to_string());
        let geoserver_url = geoserver_url.trim_end_matches('/').to_string();

        let workspace = env::var("GEOSERVER_WORKSPACE").unwrap_or_else(|_| "Picarro".to_string());

        let timeout_secs = env::var("GEOSERVER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30u64);

        let mut config = Self {
            geoserver_url,
            workspace,
            request_timeout: Duration::from_secs(timeout_secs),
            layers: default_layers(),
            geometry_fields: default_geometry_fields(),
        };

        if let Ok(path) = env::var("GATEWAY_LAYER_CONFIG") {
            config.apply_layer_file(Path::new(&path))?;
        }

        Ok(config)
    }

    /// Merge in a layer-configuration YAML file.
    fn apply_layer_file(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            warn!(path = %path.display(), "Layer config file does not exist, using defaults");
            return Ok(());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read layer config: {}", path.display()))?;

        let file: LayerFileConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse layer config: {}", path.display()))?;

        if !file.layers.is_empty() {
            self.layers = file
                .layers
                .into_iter()
                .map(|l| LayerDescriptor::new(l.id, l.title, l.visible))
                .collect();
        }
        if !file.geometry_fields.is_empty() {
            self.geometry_fields = file.geometry_fields;
        }

        info!(
            path = %path.display(),
            layers = self.layers.len(),
            "Loaded layer configuration"
        );
        Ok(())
    }

    /// Build the GeoServer client configuration from this gateway config.
    pub fn client_config(&self) -> GeoServerConfig {
        GeoServerConfig {
            base_url: self.geoserver_url.clone(),
            workspace: self.workspace.clone(),
            request_timeout: self.request_timeout,
            connect_timeout: Duration::from_secs(10),
            geometry_fields: self.geometry_fields.clone(),
            default_layers: self.layers.clone(),
        }
    }

    /// Human-readable title for a layer ID, falling back to the ID itself.
    pub fn layer_title(&self, layer_id: &str) -> String {
        self.layers
            .iter()
            .find(|l| l.id.0 == layer_id)
            .map(|l| l.title.clone())
            .unwrap_or_else(|| layer_id.to_string())
    }
}

fn default_layers() -> Vec<LayerDescriptor> {
    vec![
        LayerDescriptor::new("Picarro:Boundary", "Boundary", true),
        LayerDescriptor::new("Picarro:OtherLayer", "Other Layer", false),
    ]
}

fn default_geometry_fields() -> Vec<String> {
    vec![
        "geom".to_string(),
        "the_geom".to_string(),
        "geometry".to_string(),
    ]
}

/// Layer configuration file format.
#[derive(Debug, Deserialize)]
struct LayerFileConfig {
    #[serde(default)]
    layers: Vec<LayerFileEntry>,
    #[serde(default)]
    geometry_fields: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LayerFileEntry {
    id: String,
    title: String,
    #[serde(default = "default_visible")]
    visible: bool,
}

fn default_visible() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_file_parsing() {
        let yaml = r#"
layers:
  - id: "Picarro:Boundary"
    title: "Boundary"
  - id: "Picarro:Sites"
    title: "Monitoring Sites"
    visible: false
geometry_fields:
  - the_geom
  - geom
"#;
        let file: LayerFileConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.layers.len(), 2);
        assert!(file.layers[0].visible);
        assert!(!file.layers[1].visible);
        assert_eq!(file.geometry_fields, vec!["the_geom", "geom"]);
    }

    #[test]
    fn test_layer_title_lookup() {
        let config = GatewayConfig {
            geoserver_url: "http://localhost:8181/geoserver".into(),
            workspace: "Picarro".into(),
            request_timeout: Duration::from_secs(30),
            layers: default_layers(),
            geometry_fields: default_geometry_fields(),
        };

        assert_eq!(config.layer_title("Picarro:Boundary"), "Boundary");
        assert_eq!(config.layer_title("Picarro:Unknown"), "Picarro:Unknown");
    }
}
