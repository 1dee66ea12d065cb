use geo::Point;
use serde::{Deserialize, Serialize};

/// Latitude/longitude pair rejected by [`GeoPoint::new`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("coordinates out of range: latitude {latitude}, longitude {longitude}")]
pub struct CoordinateError {
    pub latitude: f64,
    pub longitude: f64,
}

/// A validated geographic position.
///
/// Latitude is always within `[-90, 90]` and longitude within `[-180, 180]`,
/// both bounds inclusive. The underlying `geo::Point` follows the usual
/// x = longitude, y = latitude convention.
///
/// # Examples
///
/// ```
/// use cartography_types::point::GeoPoint;
///
/// let point = GeoPoint::new(46.27, -1.01).unwrap();
/// assert_eq!(point.latitude(), 46.27);
/// assert_eq!(point.longitude(), -1.01);
///
/// assert!(GeoPoint::new(95.0, 2.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates", into = "RawCoordinates")]
pub struct GeoPoint {
    point: Point<f64>,
}

impl GeoPoint {
    /// Create a point, failing when either angle is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if Self::is_valid_latitude(latitude) && Self::is_valid_longitude(longitude) {
            Ok(Self {
                point: Point::new(longitude, latitude),
            })
        } else {
            Err(CoordinateError {
                latitude,
                longitude,
            })
        }
    }

    /// Create a point from GeoJSON ordering (`[longitude, latitude]`).
    pub fn from_lon_lat(longitude: f64, latitude: f64) -> Result<Self, CoordinateError> {
        Self::new(latitude, longitude)
    }

    pub fn is_valid_latitude(latitude: f64) -> bool {
        latitude.is_finite() && (-90.0..=90.0).contains(&latitude)
    }

    pub fn is_valid_longitude(longitude: f64) -> bool {
        longitude.is_finite() && (-180.0..=180.0).contains(&longitude)
    }

    pub fn latitude(&self) -> f64 {
        self.point.y()
    }

    pub fn longitude(&self) -> f64 {
        self.point.x()
    }

    /// Get a reference to the underlying `geo` point.
    pub fn as_point(&self) -> &Point<f64> {
        &self.point
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(value: GeoPoint) -> Self {
        value.point
    }
}

impl TryFrom<Point<f64>> for GeoPoint {
    type Error = CoordinateError;

    fn try_from(point: Point<f64>) -> Result<Self, Self::Error> {
        Self::new(point.y(), point.x())
    }
}

#[derive(Serialize, Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinates> for GeoPoint {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl From<GeoPoint> for RawCoordinates {
    fn from(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude(),
            longitude: point.longitude(),
        }
    }
}
