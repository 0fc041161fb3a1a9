//! Layer identifiers and descriptors.

use serde::{Deserialize, Serialize};

/// Unique identifier for a layer, usually workspace-qualified
/// ("Picarro:Boundary").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Split a workspace-qualified layer ID like "Picarro:Boundary".
    pub fn parse(s: &str) -> (Option<&str>, &str) {
        match s.split_once(':') {
            Some((workspace, name)) => (Some(workspace), name),
            None => (None, s),
        }
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A layer as exposed to the frontend via `/api/layers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Workspace-qualified layer identifier
    pub id: LayerId,

    /// Human-readable title
    #[serde(rename = "name")]
    pub title: String,

    /// Whether the layer starts visible on the map
    pub visible: bool,
}

impl LayerDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>, visible: bool) -> Self {
        Self {
            id: LayerId::new(id),
            title: title.into(),
            visible,
        }
    }
}

/// A layer as scraped from a WMS GetCapabilities document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    /// Layer name from the capabilities `<Name>` element
    pub name: String,

    /// Layer title, falling back to the name when absent
    pub title: String,
}

impl LayerSummary {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_id_parse_qualified() {
        let (workspace, name) = LayerId::parse("Picarro:Boundary");
        assert_eq!(workspace, Some("Picarro"));
        assert_eq!(name, "Boundary");
    }

    #[test]
    fn test_layer_id_parse_bare() {
        let (workspace, name) = LayerId::parse("Boundary");
        assert_eq!(workspace, None);
        assert_eq!(name, "Boundary");
    }

    #[test]
    fn test_descriptor_serializes_title_as_name() {
        let layer = LayerDescriptor::new("Picarro:Boundary", "Boundary", true);
        let json = serde_json::to_string(&layer).unwrap();
        assert!(json.contains("\"id\":\"Picarro:Boundary\""));
        assert!(json.contains("\"name\":\"Boundary\""));
        assert!(json.contains("\"visible\":true"));
    }
}
