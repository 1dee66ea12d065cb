//! Domain payloads carried by map features.
//!
//! Every feature is a [`PointOfInterest`]: a validated position plus a
//! payload. The engine's payload is [`MarkerProperties`], a tagged union whose
//! discriminant is fixed when the data crosses the repository boundary.

use cartography_types::{CenterView, GeoPoint};
use serde::{Deserialize, Serialize};

/// Level of spatial aggregation shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayGranularity {
    Region,
    Department,
    Site,
}

impl DisplayGranularity {
    pub const ALL: [DisplayGranularity; 3] = [Self::Region, Self::Department, Self::Site];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Department => "department",
            Self::Site => "site",
        }
    }
}

impl std::fmt::Display for DisplayGranularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Precomputed count of advisors in one administrative region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionAggregate {
    pub region: String,
    pub count: u32,
    /// Zoom level the map jumps to when this aggregate is activated
    pub bounding_zoom: i32,
}

/// Precomputed count of advisors in one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentAggregate {
    pub department: String,
    pub code: String,
    pub count: u32,
    pub bounding_zoom: i32,
}

/// An advisor working at a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// An individual site hosting advisors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    /// Kind of structure hosting the site, e.g. a library or a town hall
    #[serde(rename = "type", default)]
    pub structure_type: String,
    /// Whether the site carries the public-service label
    pub is_labeled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

/// How a highlighted site marker should be emphasised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Highlight {
    /// Selected by the user
    Focus,
    /// Hovered in the companion list
    Hint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedStructure {
    pub id: String,
    pub kind: Highlight,
}

/// Marker payload, discriminated by granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "markerType", rename_all = "camelCase")]
pub enum MarkerProperties {
    Region(RegionAggregate),
    Department(DepartmentAggregate),
    Site {
        #[serde(flatten)]
        site: SiteRecord,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        highlight: Option<Highlight>,
    },
}

impl MarkerProperties {
    pub fn granularity(&self) -> DisplayGranularity {
        match self {
            Self::Region(_) => DisplayGranularity::Region,
            Self::Department(_) => DisplayGranularity::Department,
            Self::Site { .. } => DisplayGranularity::Site,
        }
    }

    pub fn as_site(&self) -> Option<&SiteRecord> {
        match self {
            Self::Site { site, .. } => Some(site),
            Self::Region(_) | Self::Department(_) => None,
        }
    }

    /// Zoom level to drill down to, for aggregates.
    pub fn bounding_zoom(&self) -> Option<i32> {
        match self {
            Self::Region(region) => Some(region.bounding_zoom),
            Self::Department(department) => Some(department.bounding_zoom),
            Self::Site { .. } => None,
        }
    }
}

impl From<RegionAggregate> for MarkerProperties {
    fn from(value: RegionAggregate) -> Self {
        Self::Region(value)
    }
}

impl From<DepartmentAggregate> for MarkerProperties {
    fn from(value: DepartmentAggregate) -> Self {
        Self::Department(value)
    }
}

impl From<SiteRecord> for MarkerProperties {
    fn from(site: SiteRecord) -> Self {
        Self::Site {
            site,
            highlight: None,
        }
    }
}

/// A validated position with an immutable payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest<P> {
    position: GeoPoint,
    properties: P,
}

impl<P> PointOfInterest<P> {
    pub fn new(position: GeoPoint, properties: P) -> Self {
        Self {
            position,
            properties,
        }
    }

    pub fn position(&self) -> &GeoPoint {
        &self.position
    }

    pub fn properties(&self) -> &P {
        &self.properties
    }

    pub fn into_parts(self) -> (GeoPoint, P) {
        (self.position, self.properties)
    }

    /// Build a new point at the same position with a transformed payload.
    pub fn map_properties<Q>(self, f: impl FnOnce(P) -> Q) -> PointOfInterest<Q> {
        PointOfInterest {
            position: self.position,
            properties: f(self.properties),
        }
    }
}

/// A map feature as produced by the engine.
pub type Feature = PointOfInterest<MarkerProperties>;

impl PointOfInterest<MarkerProperties> {
    pub fn granularity(&self) -> DisplayGranularity {
        self.properties.granularity()
    }

    /// Where the map should fly when this aggregate is activated.
    ///
    /// Sites are the finest granularity and have nowhere to drill into.
    pub fn drill_down(&self) -> Option<CenterView> {
        self.properties.bounding_zoom().map(|zoom_level| CenterView {
            position: self.position,
            zoom_level,
        })
    }
}

/// An ordered set of features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection<P> {
    pub features: Vec<PointOfInterest<P>>,
}

impl<P> FeatureCollection<P> {
    pub fn new(features: Vec<PointOfInterest<P>>) -> Self {
        Self { features }
    }

    pub fn empty() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointOfInterest<P>> {
        self.features.iter()
    }
}

impl<P> Default for FeatureCollection<P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<P> FromIterator<PointOfInterest<P>> for FeatureCollection<P> {
    fn from_iter<I: IntoIterator<Item = PointOfInterest<P>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<P> IntoIterator for FeatureCollection<P> {
    type Item = PointOfInterest<P>;
    type IntoIter = std::vec::IntoIter<PointOfInterest<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl<'a, P> IntoIterator for &'a FeatureCollection<P> {
    type Item = &'a PointOfInterest<P>;
    type IntoIter = std::slice::Iter<'a, PointOfInterest<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// Flat list row describing a visible site, for the companion list UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructurePresentation {
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(rename = "type")]
    pub structure_type: String,
    pub is_labeled: bool,
    pub phone: Option<String>,
    pub contact_count: usize,
}

impl From<&SiteRecord> for StructurePresentation {
    fn from(site: &SiteRecord) -> Self {
        Self {
            id: site.id.clone(),
            name: site.name.clone(),
            address: site.address.clone(),
            structure_type: site.structure_type.clone(),
            is_labeled: site.is_labeled,
            phone: site.phone.clone(),
            contact_count: site.contacts.len(),
        }
    }
}
