//! Feature counts via WFS `resultType=hits`.

use tracing::{debug, warn};

use crate::{intersects_filter, GeoServerClient};

/// Count attributes emitted by different WFS versions, in priority order:
/// numberOfFeatures (WFS 1.1.0), numberMatched (WFS 2.0.0), numberReturned.
const COUNT_ATTRS: [&str; 3] = ["numberOfFeatures", "numberMatched", "numberReturned"];

impl GeoServerClient {
    /// Count features in a layer, optionally restricted to those
    /// intersecting `geometry_wkt`.
    ///
    /// Issues a `resultType=hits` request (WFS 1.1.0) and scrapes the count
    /// attribute out of the XML. Returns 0 if the request fails or no count
    /// attribute is present; never errors.
    pub async fn feature_count(&self, layer: &str, geometry_wkt: Option<&str>) -> u64 {
        match geometry_wkt {
            None => self.hits_request(layer, None).await.unwrap_or(0),
            Some(wkt) => {
                // A spatial filter needs a geometry column; probe candidates
                // until one yields a usable response.
                for field in self.candidate_geometry_fields(layer).await {
                    let filter = intersects_filter(&field, wkt);
                    if let Some(count) = self.hits_request(layer, Some(&filter)).await {
                        self.remember_geometry_field(layer, &field).await;
                        return count;
                    }
                    debug!(layer = %layer, field = %field, "Count probe failed");
                }
                warn!(layer = %layer, "All geometry field candidates failed for count, using 0");
                0
            }
        }
    }

    /// Issue a single hits request. `None` means the request failed at the
    /// HTTP level; `Some(0)` means it succeeded but carried no count.
    async fn hits_request(&self, layer: &str, cql_filter: Option<&str>) -> Option<u64> {
        let mut params = vec![
            ("service", "WFS".to_string()),
            ("version", "1.1.0".to_string()),
            ("request", "GetFeature".to_string()),
            ("typeName", layer.to_string()),
            ("resultType", "hits".to_string()),
        ];
        if let Some(filter) = cql_filter {
            params.push(("CQL_FILTER", filter.to_string()));
        }

        let response = match self.http().get(self.wfs_url()).query(&params).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(layer = %layer, error = %e, "Count request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(layer = %layer, status = %response.status(), "Count request returned non-200");
            return None;
        }

        let body = response.text().await.ok()?;
        // GeoServer reports CQL errors as a 200 ExceptionReport; treat those
        // as a failed probe so the next candidate field gets tried.
        if body.contains("ExceptionReport") || body.contains("ServiceException") {
            debug!(layer = %layer, "Count response is an exception report");
            return None;
        }

        Some(extract_feature_count(&body).unwrap_or(0))
    }
}

/// Extract a feature count from a WFS hits document.
///
/// Checks the known attribute names in priority order, accepting both
/// quoted (`numberOfFeatures="42"`) and unquoted (`numberOfFeatures=42`)
/// forms. Different GeoServer configurations emit different attributes.
pub(crate) fn extract_feature_count(xml: &str) -> Option<u64> {
    COUNT_ATTRS.iter().find_map(|attr| scan_count_attr(xml, attr))
}

/// Scan for `name=<digits>` or `name="<digits>"` in raw XML text.
fn scan_count_attr(xml: &str, name: &str) -> Option<u64> {
    let bytes = xml.as_bytes();
    let mut search_from = 0;

    while let Some(found) = xml[search_from..].find(name) {
        let start = search_from + found;
        search_from = start + name.len();

        // Reject matches inside longer identifiers.
        if start > 0 {
            let prev = bytes[start - 1];
            if prev.is_ascii_alphanumeric() || prev == b'_' || prev == b':' {
                continue;
            }
        }

        let rest = xml[start + name.len()..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        let rest = rest
            .strip_prefix('"')
            .or_else(|| rest.strip_prefix('\''))
            .unwrap_or(rest);

        let digits: &str = {
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            &rest[..end]
        };
        if digits.is_empty() {
            continue;
        }
        if let Ok(value) = digits.parse() {
            return Some(value);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_number_of_features() {
        let xml = r#"<wfs:FeatureCollection numberOfFeatures="42" timeStamp="2024-01-01T00:00:00Z"/>"#;
        assert_eq!(extract_feature_count(xml), Some(42));
    }

    #[test]
    fn test_extract_number_matched() {
        let xml = r#"<wfs:FeatureCollection numberMatched="17" numberReturned="0"/>"#;
        assert_eq!(extract_feature_count(xml), Some(17));
    }

    #[test]
    fn test_extract_number_returned_last_resort() {
        let xml = r#"<wfs:FeatureCollection numberReturned="5"/>"#;
        assert_eq!(extract_feature_count(xml), Some(5));
    }

    #[test]
    fn test_priority_order() {
        // numberOfFeatures wins even when the others are present
        let xml = r#"<fc numberReturned="1" numberMatched="2" numberOfFeatures="3"/>"#;
        assert_eq!(extract_feature_count(xml), Some(3));
    }

    #[test]
    fn test_unquoted_attribute() {
        let xml = "<FeatureCollection numberOfFeatures=250>";
        assert_eq!(extract_feature_count(xml), Some(250));
    }

    #[test]
    fn test_single_quoted_attribute() {
        let xml = "<FeatureCollection numberMatched='9'/>";
        assert_eq!(extract_feature_count(xml), Some(9));
    }

    #[test]
    fn test_no_count_present() {
        let xml = r#"<wfs:FeatureCollection timeStamp="2024-01-01T00:00:00Z"/>"#;
        assert_eq!(extract_feature_count(xml), None);
    }

    #[test]
    fn test_longer_identifier_does_not_match() {
        let xml = r#"<fc totalnumberMatched="7"/>"#;
        assert_eq!(extract_feature_count(xml), None);
    }

    #[test]
    fn test_non_numeric_value_skipped() {
        let xml = r#"<fc numberMatched="unknown" numberReturned="4"/>"#;
        assert_eq!(extract_feature_count(xml), Some(4));
    }
}
