use crate::point::GeoPoint;
use geo::Rect;
use serde::{Deserialize, Serialize};

/// A map frame given as `[west, south, east, north]` in degrees.
///
/// Unlike `geo::Rect` the corners are kept as supplied: a box whose west edge
/// is greater than its east edge crosses the antimeridian.
///
/// # Examples
///
/// ```
/// use cartography_types::bbox::BoundingBox;
/// use cartography_types::point::GeoPoint;
///
/// let bbox = BoundingBox::new(-3.89, 39.3, 13.56, 51.56);
/// let marseille = GeoPoint::new(43.305645, 5.380007).unwrap();
/// assert!(bbox.contains(&marseille));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Box covering every valid coordinate.
    pub fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Returns true when every edge is a finite number.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// Returns true when the box wraps around the 180th meridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east && self.east - self.west < 360.0
    }

    /// Bring the box into coordinate range.
    ///
    /// Latitudes are clamped to `[-90, 90]`. Longitudes outside `[-180, 180]`
    /// (map UIs report them when panning across world copies) are wrapped; a
    /// box at least 360° wide becomes the full longitude range. In-range edges
    /// are kept bit-for-bit so edge-inclusive tests stay exact.
    pub fn normalized(&self) -> Self {
        let south = self.south.clamp(-90.0, 90.0);
        let north = self.north.clamp(-90.0, 90.0);
        if self.east - self.west >= 360.0 {
            return Self::new(-180.0, south, 180.0, north);
        }
        Self::new(wrap_longitude(self.west), south, wrap_longitude(self.east), north)
    }

    /// Inclusive containment test; a point lying on an edge is inside.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        let bbox = self.normalized();
        let (lon, lat) = (point.longitude(), point.latitude());
        if lat < bbox.south || lat > bbox.north {
            return false;
        }
        if bbox.crosses_antimeridian() {
            lon >= bbox.west || lon <= bbox.east
        } else {
            lon >= bbox.west && lon <= bbox.east
        }
    }

    /// Convert to a `geo::Rect`. Returns `None` for antimeridian-crossing boxes,
    /// which have no single-rectangle representation.
    pub fn to_rect(&self) -> Option<Rect> {
        if self.crosses_antimeridian() {
            return None;
        }
        Some(Rect::new(
            geo::coord! { x: self.west, y: self.south },
            geo::coord! { x: self.east, y: self.north },
        ))
    }
}

fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        lng
    } else {
        ((lng + 180.0) % 360.0 + 360.0) % 360.0 - 180.0
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(value: [f64; 4]) -> Self {
        Self::new(value[0], value[1], value[2], value[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(value: BoundingBox) -> Self {
        value.to_array()
    }
}

/// The visible map rectangle plus the zoom level it is displayed at.
///
/// Produced by the map UI on every pan/zoom settle event; there is no history,
/// the latest value is the only one that matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub bounding_box: BoundingBox,
    pub zoom_level: i32,
}

impl Viewport {
    pub fn new(bounding_box: BoundingBox, zoom_level: i32) -> Self {
        Self {
            bounding_box,
            zoom_level,
        }
    }
}

/// Where the map should be centred, and at which zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterView {
    pub position: GeoPoint,
    pub zoom_level: i32,
}
