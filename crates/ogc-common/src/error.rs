//! Error types for geoserver-gateway services.

use thiserror::Error;

/// Result type alias using GatewayError.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Primary error type for gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    // === Client Input Errors ===
    #[error("Invalid bbox format")]
    InvalidBbox(String),

    // === Upstream Errors ===
    #[error("WFS request failed: {status}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Invalid JSON response from GeoServer")]
    UpstreamJson(String),

    #[error("GeoServer returned malformed XML: {0}")]
    UpstreamXml(String),

    #[error("WMS returned non-image content: {0}")]
    UnexpectedContentType(String),

    #[error("No working geometry field found")]
    GeometryFieldNotFound { layer: String },

    // === Network Errors ===
    #[error("Network error: {0}")]
    Network(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl GatewayError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            GatewayError::InvalidBbox(_) => 400,

            GatewayError::UpstreamStatus { .. }
            | GatewayError::UpstreamJson(_)
            | GatewayError::UpstreamXml(_)
            | GatewayError::UnexpectedContentType(_)
            | GatewayError::GeometryFieldNotFound { .. }
            | GatewayError::Network(_)
            | GatewayError::InternalError(_) => 500,
        }
    }
}

// Conversion from common error types
impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::UpstreamJson(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_400() {
        assert_eq!(
            GatewayError::InvalidBbox("1,2,3".into()).http_status_code(),
            400
        );
    }

    #[test]
    fn test_upstream_errors_are_500() {
        let err = GatewayError::UpstreamStatus {
            status: 404,
            body: "not found".into(),
        };
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.to_string(), "WFS request failed: 404");
        assert_eq!(
            GatewayError::Network("connection refused".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_geometry_field_message() {
        let err = GatewayError::GeometryFieldNotFound {
            layer: "Picarro:Boundary".into(),
        };
        assert_eq!(err.to_string(), "No working geometry field found");
    }
}
