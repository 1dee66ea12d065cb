//! Viewport culling backed by one cluster index per layer.
//!
//! Layers are keyed by name, the way spatial indexes are keyed by prefix
//! elsewhere. A layer's index is built from the features passed to its first
//! [`ViewportCullingService::cull`] call and is never rebuilt afterwards.

use crate::compute::validation::is_queryable;
use crate::config::ClusterOptions;
use crate::error::Result;
use crate::model::{FeatureCollection, PointOfInterest};
use crate::spatial_index::{IndexEntry, SpatialIndex};
use cartography_types::Viewport;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Culls feature sets to the visible map frame.
pub struct ViewportCullingService<P> {
    options: ClusterOptions,
    /// Cluster indexes organized by layer name
    indexes: RwLock<FxHashMap<String, Arc<SpatialIndex<P>>>>,
}

impl<P> ViewportCullingService<P> {
    /// Fails when `options` does not pass [`ClusterOptions::validate`].
    pub fn new(options: ClusterOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            indexes: RwLock::new(FxHashMap::default()),
        })
    }

    /// Whether the layer's index has been built. Once true, stays true.
    pub fn is_ready(&self, layer: &str) -> bool {
        self.indexes
            .read()
            .get(layer)
            .is_some_and(|index| index.is_built())
    }

    /// The index backing `layer`, created unbuilt on first access.
    pub fn index(&self, layer: &str) -> Arc<SpatialIndex<P>> {
        if let Some(index) = self.indexes.read().get(layer) {
            return Arc::clone(index);
        }

        let mut indexes = self.indexes.write();
        Arc::clone(
            indexes
                .entry(layer.to_string())
                .or_insert_with(|| Arc::new(SpatialIndex::with_validated(self.options))),
        )
    }
}

impl<P: Clone> ViewportCullingService<P> {
    /// Features of `layer` that lie inside the viewport, edges included.
    ///
    /// The first call for a layer indexes `all_features`; later calls reuse
    /// that index and ignore the argument. A frame that excludes every feature,
    /// or one that is malformed, yields an empty collection.
    pub fn cull(
        &self,
        layer: &str,
        all_features: &[PointOfInterest<P>],
        viewport: &Viewport,
    ) -> FeatureCollection<P> {
        let index = self.index(layer);
        if index.build_with(|| all_features.to_vec()) {
            log::debug!("Indexed {} features for layer '{}'", index.len(), layer);
        }

        if !is_queryable(viewport) {
            return FeatureCollection::empty();
        }

        let bbox = &viewport.bounding_box;
        let mut visible = Vec::new();
        for entry in index.query(bbox, viewport.zoom_level) {
            match entry {
                IndexEntry::Point(poi) => {
                    if bbox.contains(poi.position()) {
                        visible.push(poi);
                    }
                }
                IndexEntry::Cluster(cluster) => match index.expand_cluster(cluster.id) {
                    Ok(leaves) => visible.extend(
                        leaves
                            .into_iter()
                            .filter(|leaf| bbox.contains(leaf.position())),
                    ),
                    Err(e) => log::warn!("Skipping cluster in layer '{}': {}", layer, e),
                },
            }
        }

        FeatureCollection::new(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartography_types::{BoundingBox, GeoPoint};

    const FRANCE: [f64; 4] = [
        -3.8891601562500004,
        39.30029918615029,
        13.557128906250002,
        51.56341232867588,
    ];

    fn poi(lat: f64, lon: f64, name: &'static str) -> PointOfInterest<&'static str> {
        PointOfInterest::new(GeoPoint::new(lat, lon).unwrap(), name)
    }

    fn features() -> Vec<PointOfInterest<&'static str>> {
        vec![
            poi(46.28146057911664, 4.468874066180609, "in-france"),
            poi(4.468874066180609, 46.28146057911664, "in-africa"),
        ]
    }

    fn names(collection: &FeatureCollection<&'static str>) -> Vec<&'static str> {
        collection.iter().map(|f| *f.properties()).collect()
    }

    #[test]
    fn test_cull_keeps_features_in_frame() {
        let service = ViewportCullingService::new(ClusterOptions::default()).unwrap();
        let viewport = Viewport::new(FRANCE.into(), 6);

        let culled = service.cull("sites", &features(), &viewport);
        assert_eq!(names(&culled), vec!["in-france"]);
    }

    #[test]
    fn test_cull_outside_frame_is_empty() {
        let service = ViewportCullingService::new(ClusterOptions::default()).unwrap();
        for zoom in [0, 6, 12, 20, 30] {
            let viewport = Viewport::new(BoundingBox::new(0.0, 0.0, 0.0, 0.0), zoom);
            assert!(service.cull("sites", &features(), &viewport).is_empty());
        }
    }

    #[test]
    fn test_index_is_built_once() {
        let service = ViewportCullingService::new(ClusterOptions::default()).unwrap();
        assert!(!service.is_ready("sites"));

        let world = Viewport::new(BoundingBox::world(), 3);
        assert_eq!(service.cull("sites", &features(), &world).len(), 2);
        assert!(service.is_ready("sites"));

        // later datasets are ignored for an already built layer
        let culled = service.cull("sites", &[poi(10.0, 10.0, "late")], &world);
        assert_eq!(culled.len(), 2);
        assert!(service.is_ready("sites"));
    }

    #[test]
    fn test_layers_are_independent() {
        let service = ViewportCullingService::new(ClusterOptions::default()).unwrap();
        let world = Viewport::new(BoundingBox::world(), 3);
        service.cull("a", &features(), &world);

        assert!(service.is_ready("a"));
        assert!(!service.is_ready("b"));
        let culled = service.cull("b", &[poi(10.0, 10.0, "b-only")], &world);
        assert_eq!(names(&culled), vec!["b-only"]);
    }

    #[test]
    fn test_clusters_are_expanded_and_trimmed_to_frame() {
        let service =
            ViewportCullingService::new(ClusterOptions::default().with_radius(80.0)).unwrap();
        let dense = vec![
            poi(45.0, 4.0, "west"),
            poi(45.0, 4.02, "middle"),
            poi(45.0, 4.04, "east"),
        ];
        // low zoom merges all three; the frame only covers two of them
        let viewport = Viewport::new(BoundingBox::new(4.01, 44.0, 5.0, 46.0), 2);
        let culled = service.cull("dense", &dense, &viewport);
        assert_eq!(names(&culled), vec!["middle", "east"]);
    }

    #[test]
    fn test_inverted_zoom_range_is_rejected() {
        let options = ClusterOptions::default().with_zoom_range(10, 4);
        assert!(ViewportCullingService::<&str>::new(options).is_err());
    }

    #[test]
    fn test_invalid_viewport_is_empty() {
        let service = ViewportCullingService::new(ClusterOptions::default()).unwrap();
        let viewport = Viewport::new(BoundingBox::new(0.0, 50.0, 10.0, 40.0), 6);
        assert!(service.cull("sites", &features(), &viewport).is_empty());
        // the index is still built
        assert!(service.is_ready("sites"));
    }
}
