//! Directory data sources and ingestion.
//!
//! A [`DirectoryRepository`] hands out raw rows whose coordinates have not been
//! checked. [`ingest`] turns them into features, dropping any row with an
//! out-of-range coordinate and tagging the payload with its granularity.

use crate::compute::validation::validate_geographic_point;
use crate::error::Result;
use crate::model::{DepartmentAggregate, Feature, MarkerProperties, RegionAggregate, SiteRecord};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A row as delivered by a repository, before coordinate validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry<P> {
    pub latitude: f64,
    pub longitude: f64,
    pub properties: P,
}

impl<P> DirectoryEntry<P> {
    pub fn new(latitude: f64, longitude: f64, properties: P) -> Self {
        Self {
            latitude,
            longitude,
            properties,
        }
    }
}

/// Source of the three pre-aggregated datasets.
///
/// Each read is expected to be expensive (a network round-trip in practice);
/// callers wrap it in a [`ResultCache`](crate::cache::ResultCache).
pub trait DirectoryRepository: Send + Sync + 'static {
    /// Advisor counts per region.
    fn list_by_region(
        &self,
    ) -> impl Future<Output = Result<Vec<DirectoryEntry<RegionAggregate>>>> + Send;

    /// Advisor counts per department.
    fn list_by_department(
        &self,
    ) -> impl Future<Output = Result<Vec<DirectoryEntry<DepartmentAggregate>>>> + Send;

    /// Every individual site.
    fn list_sites(&self) -> impl Future<Output = Result<Vec<DirectoryEntry<SiteRecord>>>> + Send;
}

/// Validate raw rows and convert them to features.
///
/// Rows with an invalid coordinate are dropped, never an error. `source` only
/// labels the log lines.
pub fn ingest<P>(source: &str, entries: Vec<DirectoryEntry<P>>) -> Vec<Feature>
where
    P: Into<MarkerProperties>,
{
    let total = entries.len();
    let features: Vec<Feature> = entries
        .into_iter()
        .filter_map(|entry| {
            match validate_geographic_point(entry.latitude, entry.longitude) {
                Ok(position) => Some(Feature::new(position, entry.properties.into())),
                Err(e) => {
                    log::debug!("Dropping {} entry: {}", source, e);
                    None
                }
            }
        })
        .collect();

    let dropped = total - features.len();
    if dropped > 0 {
        log::warn!(
            "Dropped {} of {} {} entries with invalid coordinates",
            dropped,
            total,
            source
        );
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DisplayGranularity;

    fn region(name: &str) -> RegionAggregate {
        RegionAggregate {
            region: name.to_string(),
            count: 3,
            bounding_zoom: 8,
        }
    }

    #[test]
    fn test_ingest_drops_invalid_coordinates() {
        let _ = env_logger::builder().is_test(true).try_init();

        let entries = vec![
            DirectoryEntry::new(95.0, -1.01, region("north-of-the-pole")),
            DirectoryEntry::new(46.27, -1.01, region("Nouvelle-Aquitaine")),
            DirectoryEntry::new(f64::NAN, 2.0, region("nan")),
            DirectoryEntry::new(45.0, 181.0, region("east")),
        ];

        let features = ingest("region", entries);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].position().latitude(), 46.27);
        assert_eq!(features[0].position().longitude(), -1.01);
        assert_eq!(features[0].granularity(), DisplayGranularity::Region);
    }

    #[test]
    fn test_ingest_keeps_order_and_edges() {
        let entries = vec![
            DirectoryEntry::new(90.0, 180.0, region("a")),
            DirectoryEntry::new(-90.0, -180.0, region("b")),
            DirectoryEntry::new(0.0, 0.0, region("c")),
        ];
        let names: Vec<String> = ingest("region", entries)
            .into_iter()
            .map(|f| match f.properties() {
                MarkerProperties::Region(r) => r.region.clone(),
                other => panic!("unexpected payload {:?}", other),
            })
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry: DirectoryEntry<RegionAggregate> = serde_json::from_str(
            r#"{"latitude": 48.7, "longitude": 2.5, "properties": {"region": "Île-de-France", "count": 9, "boundingZoom": 9}}"#,
        )
        .unwrap();
        assert_eq!(entry.properties.count, 9);
    }

    #[test]
    fn test_entry_on_frame_edge_parses_exactly() {
        let json = r#"{"latitude": 39.30029918615029, "longitude": -3.8891601562500004,
            "properties": {"region": "edge", "count": 1, "boundingZoom": 6}}"#;
        let entry: DirectoryEntry<RegionAggregate> = serde_json::from_str(json).unwrap();
        assert_eq!(entry.longitude, -3.8891601562500004);
        assert_eq!(entry.latitude, 39.30029918615029);

        let frame = cartography_types::BoundingBox::new(
            -3.8891601562500004,
            39.30029918615029,
            13.557128906250002,
            51.56341232867588,
        );
        let features = ingest("region", vec![entry]);
        assert!(frame.contains(features[0].position()));
    }
}
