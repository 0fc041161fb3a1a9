//! Bounding box parsing and WKT conversion.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in EPSG:4326 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a WMS BBOX parameter string: "minx,miny,maxx,maxy"
    pub fn from_wms_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        Ok(Self {
            min_x: parts[0]
                .trim()
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(parts[0].to_string()))?,
            min_y: parts[1]
                .trim()
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(parts[1].to_string()))?,
            max_x: parts[2]
                .trim()
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(parts[2].to_string()))?,
            max_y: parts[3]
                .trim()
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(parts[3].to_string()))?,
        })
    }

    /// Render as a WMS BBOX parameter string.
    pub fn to_wms_string(&self) -> String {
        format!("{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }

    /// Convert to a closed-ring POLYGON WKT, suitable for a CQL INTERSECTS
    /// predicate.
    pub fn to_polygon_wkt(&self) -> String {
        format!(
            "POLYGON(({minx} {miny}, {maxx} {miny}, {maxx} {maxy}, {minx} {maxy}, {minx} {miny}))",
            minx = self.min_x,
            miny = self.min_y,
            maxx = self.max_x,
            maxy = self.max_y,
        )
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bbox format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("Invalid number in bbox: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wms_bbox() {
        let bbox = BoundingBox::from_wms_string("-100,30,-90,40").unwrap();
        assert_eq!(bbox.min_x, -100.0);
        assert_eq!(bbox.min_y, 30.0);
        assert_eq!(bbox.max_x, -90.0);
        assert_eq!(bbox.max_y, 40.0);
    }

    #[test]
    fn test_parse_rejects_wrong_arity() {
        assert!(BoundingBox::from_wms_string("-100,30,-90").is_err());
        assert!(BoundingBox::from_wms_string("-100,30,-90,40,50").is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(BoundingBox::from_wms_string("a,30,-90,40").is_err());
    }

    #[test]
    fn test_polygon_wkt_is_closed() {
        let bbox = BoundingBox::new(-100.0, 30.0, -90.0, 40.0);
        assert_eq!(
            bbox.to_polygon_wkt(),
            "POLYGON((-100 30, -90 30, -90 40, -100 40, -100 30))"
        );
    }

    #[test]
    fn test_wms_string_round_trip() {
        let bbox = BoundingBox::from_wms_string("-125.5,24.75,-66.25,50.125").unwrap();
        assert_eq!(bbox.to_wms_string(), "-125.5,24.75,-66.25,50.125");
    }
}
