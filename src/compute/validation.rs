//! Validation for geographic coordinates and map frames.

use crate::error::{CartographyError, Result};
use cartography_types::{BoundingBox, GeoPoint, Viewport};

/// Validates a latitude/longitude pair and returns the checked point.
///
/// Failures are reported as [`CartographyError::InvalidCoordinate`].
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use cartography::compute::validation::validate_geographic_point;
///
/// // Valid point
/// assert!(validate_geographic_point(46.27, -1.01).is_ok());
///
/// // Invalid latitude
/// assert!(validate_geographic_point(95.0, -1.01).is_err());
/// ```
pub fn validate_geographic_point(latitude: f64, longitude: f64) -> Result<GeoPoint> {
    Ok(GeoPoint::new(latitude, longitude)?)
}

/// Checks that a bounding box can be queried.
///
/// Edges must be finite and south must not exceed north. West may exceed east:
/// that describes a frame crossing the antimeridian.
pub fn validate_bounding_box(bbox: &BoundingBox) -> Result<()> {
    if !bbox.is_finite() {
        return Err(CartographyError::InvalidConfig(format!(
            "Bounding box edges must be finite, got: {:?}",
            bbox.to_array()
        )));
    }

    if bbox.south > bbox.north {
        return Err(CartographyError::InvalidConfig(format!(
            "Bounding box south edge {} is above north edge {}",
            bbox.south, bbox.north
        )));
    }

    Ok(())
}

/// Returns true when the viewport can be culled against.
///
/// Invalid viewports are not errors for callers: they simply show nothing.
pub fn is_queryable(viewport: &Viewport) -> bool {
    match validate_bounding_box(&viewport.bounding_box) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Rejecting viewport query: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_geographic_point() {
        assert!(validate_geographic_point(46.27, -1.01).is_ok());
        assert!(validate_geographic_point(43.305645, 5.380007).is_ok());
        assert!(validate_geographic_point(4.9224, -52.3135).is_ok());

        // Edge cases
        assert!(validate_geographic_point(0.0, 180.0).is_ok());
        assert!(validate_geographic_point(0.0, -180.0).is_ok());
        assert!(validate_geographic_point(90.0, 0.0).is_ok());
        assert!(validate_geographic_point(-90.0, 0.0).is_ok());
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(matches!(
            validate_geographic_point(95.0, 2.0),
            Err(CartographyError::InvalidCoordinate(_))
        ));
        assert!(validate_geographic_point(-90.1, 2.0).is_err());
        assert!(validate_geographic_point(45.0, 180.1).is_err());
        assert!(validate_geographic_point(f64::NAN, 2.0).is_err());
        assert!(validate_geographic_point(45.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_bounding_box_validation() {
        assert!(validate_bounding_box(&BoundingBox::new(-3.9, 39.3, 13.6, 51.6)).is_ok());
        assert!(validate_bounding_box(&BoundingBox::new(0.0, 0.0, 0.0, 0.0)).is_ok());
        assert!(validate_bounding_box(&BoundingBox::new(170.0, -10.0, -170.0, 10.0)).is_ok());
        assert!(validate_bounding_box(&BoundingBox::new(0.0, 10.0, 1.0, 5.0)).is_err());
        assert!(validate_bounding_box(&BoundingBox::new(f64::NAN, 0.0, 1.0, 5.0)).is_err());
    }

    #[test]
    fn test_is_queryable() {
        let ok = Viewport::new(BoundingBox::new(-3.9, 39.3, 13.6, 51.6), 6);
        let bad = Viewport::new(BoundingBox::new(0.0, f64::INFINITY, 1.0, 5.0), 6);
        assert!(is_queryable(&ok));
        assert!(!is_queryable(&bad));
    }
}
