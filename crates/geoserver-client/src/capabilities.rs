//! WMS GetCapabilities fetching and layer scraping.

use ogc_common::{GatewayError, GatewayResult, LayerSummary};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::GeoServerClient;

impl GeoServerClient {
    /// Fetch the raw WMS 1.1.1 GetCapabilities document.
    pub async fn capabilities_xml(&self) -> GatewayResult<String> {
        let response = self
            .http()
            .get(self.wms_url())
            .query(&[
                ("service", "WMS"),
                ("version", "1.1.1"),
                ("request", "GetCapabilities"),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::UpstreamStatus {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        Ok(body)
    }

    /// List layers advertised by the WMS service.
    ///
    /// Falls back to the configured default layer list on any failure:
    /// upstream non-200, network error, an HTML error page instead of XML,
    /// an unparseable document, or a document with no layers. Never errors.
    pub async fn list_layers(&self) -> Vec<LayerSummary> {
        let xml = match self.capabilities_xml().await {
            Ok(xml) => xml,
            Err(e) => {
                warn!(error = %e, "GetCapabilities failed, using default layers");
                return self.fallback_layers();
            }
        };

        if looks_like_html(&xml) {
            warn!("GetCapabilities returned an HTML error page, using default layers");
            return self.fallback_layers();
        }

        match parse_capabilities_layers(&xml) {
            Ok(layers) if !layers.is_empty() => {
                debug!(count = layers.len(), "Scraped layers from capabilities");
                layers
            }
            Ok(_) => {
                warn!("No layers found in capabilities document, using default layers");
                self.fallback_layers()
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse capabilities XML, using default layers");
                self.fallback_layers()
            }
        }
    }

    fn fallback_layers(&self) -> Vec<LayerSummary> {
        self.config()
            .default_layers
            .iter()
            .map(|l| LayerSummary::new(l.id.0.clone(), l.title.clone()))
            .collect()
    }
}

/// Truncate an upstream body for embedding in an error message.
pub(crate) fn snippet(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

/// Detect an HTML error page masquerading as a capabilities document.
fn looks_like_html(body: &str) -> bool {
    let trimmed = body.trim_start();
    trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html") || trimmed.starts_with("<HTML")
}

/// Scrape `<Layer><Name>/<Title>` pairs out of a capabilities document.
///
/// Matches on local element names so both plain WMS 1.1.1 and namespaced
/// WMS 1.3.0 documents parse. Only names inside a `<Layer>` element count;
/// the `<Service>` section also carries a `<Name>`.
pub(crate) fn parse_capabilities_layers(xml: &str) -> GatewayResult<Vec<LayerSummary>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut layers = Vec::new();
    let mut layer_depth: usize = 0;
    let mut current_name: Option<String> = None;
    let mut current_title: Option<String> = None;
    // Which element inside a Layer we are reading text for.
    let mut reading: Option<&'static str> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"Layer" => {
                    layer_depth += 1;
                    current_name = None;
                    current_title = None;
                }
                b"Name" if layer_depth > 0 => reading = Some("name"),
                b"Title" if layer_depth > 0 => reading = Some("title"),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| GatewayError::UpstreamXml(e.to_string()))?;
                match reading {
                    Some("name") => current_name = Some(text.into_owned()),
                    Some("title") => current_title = Some(text.into_owned()),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"Layer" => {
                    layer_depth = layer_depth.saturating_sub(1);
                    if let Some(name) = current_name.take() {
                        let title = current_title.take().unwrap_or_else(|| name.clone());
                        layers.push(LayerSummary::new(name, title));
                    }
                }
                b"Name" | b"Title" => reading = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(GatewayError::UpstreamXml(format!(
                    "XML parsing error at position {}: {:?}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMT_MS_Capabilities version="1.1.1">
  <Service>
    <Name>OGC:WMS</Name>
    <Title>GeoServer Web Map Service</Title>
  </Service>
  <Capability>
    <Layer>
      <Title>GeoServer Layers</Title>
      <Layer queryable="1">
        <Name>Picarro:Boundary</Name>
        <Title>Boundary</Title>
      </Layer>
      <Layer queryable="1">
        <Name>Picarro:Sites</Name>
      </Layer>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;

    #[test]
    fn test_parse_capabilities_layers() {
        let layers = parse_capabilities_layers(CAPABILITIES).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0], LayerSummary::new("Picarro:Boundary", "Boundary"));
        // Title falls back to the name when absent
        assert_eq!(layers[1], LayerSummary::new("Picarro:Sites", "Picarro:Sites"));
    }

    #[test]
    fn test_service_name_is_not_a_layer() {
        let layers = parse_capabilities_layers(CAPABILITIES).unwrap();
        assert!(layers.iter().all(|l| l.name != "OGC:WMS"));
    }

    #[test]
    fn test_parse_namespaced_capabilities() {
        let xml = r#"<wms:WMS_Capabilities xmlns:wms="http://www.opengis.net/wms" version="1.3.0">
  <wms:Capability>
    <wms:Layer>
      <wms:Layer>
        <wms:Name>Picarro:Boundary</wms:Name>
        <wms:Title>Boundary</wms:Title>
      </wms:Layer>
    </wms:Layer>
  </wms:Capability>
</wms:WMS_Capabilities>"#;
        let layers = parse_capabilities_layers(xml).unwrap();
        assert_eq!(layers, vec![LayerSummary::new("Picarro:Boundary", "Boundary")]);
    }

    #[test]
    fn test_parse_malformed_xml_errors() {
        // Mismatched closing tag
        assert!(parse_capabilities_layers("<Layer><Name>broken</Wrong></Layer>").is_err());
    }

    #[test]
    fn test_html_detection() {
        assert!(looks_like_html("<!DOCTYPE html><html><body>502</body></html>"));
        assert!(looks_like_html("  <html><head></head></html>"));
        assert!(!looks_like_html("<?xml version=\"1.0\"?><WMT_MS_Capabilities/>"));
    }

    #[test]
    fn test_snippet_truncates() {
        let long = "x".repeat(2000);
        let s = snippet(&long);
        assert!(s.len() <= 503);
        assert!(s.ends_with("..."));
        assert_eq!(snippet("short"), "short");
    }
}
