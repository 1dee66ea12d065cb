//! Map viewport culling and spatial aggregation for directory markers.
//!
//! ```rust
//! use cartography::{BoundingBox, ClusterOptions, GeoPoint, PointOfInterest, Viewport};
//! use cartography::ViewportCullingService;
//!
//! let sites = vec![
//!     PointOfInterest::new(GeoPoint::new(45.734377, 4.816864)?, "lyon"),
//!     PointOfInterest::new(GeoPoint::new(4.468874, 46.281460)?, "outside-france"),
//! ];
//!
//! let service = ViewportCullingService::new(ClusterOptions::default())?;
//! let france = Viewport::new(BoundingBox::new(-3.89, 39.30, 13.56, 51.56), 6);
//! let visible = service.cull("sites", &sites, &france);
//! assert_eq!(visible.len(), 1);
//! # Ok::<(), cartography::CartographyError>(())
//! ```

pub mod cache;
pub mod compute;
pub mod config;
pub mod culling;
pub mod error;
pub mod lod;
pub mod model;
pub mod presenter;
pub mod repository;
pub mod spatial_index;

pub use cache::ResultCache;
pub use config::{ClusterOptions, Config, ZoomThresholds};
pub use culling::ViewportCullingService;
pub use error::{CartographyError, Result};
pub use lod::LevelOfDetailSelector;
pub use presenter::{AggregationPresenter, VisibleFeatures};
pub use repository::{DirectoryEntry, DirectoryRepository};
pub use spatial_index::{ClusterId, ClusterNode, IndexEntry, SpatialIndex};

pub use model::{
    Contact, DepartmentAggregate, DisplayGranularity, Feature, FeatureCollection, Highlight,
    HighlightedStructure, MarkerProperties, PointOfInterest, RegionAggregate, SiteRecord,
    StructurePresentation,
};

pub use cartography_types::{BoundingBox, CenterView, CoordinateError, GeoPoint, Viewport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{AggregationPresenter, CartographyError, Config, Result};

    pub use crate::{DirectoryEntry, DirectoryRepository};

    pub use crate::{
        DisplayGranularity, Feature, FeatureCollection, MarkerProperties, VisibleFeatures,
    };

    pub use crate::{BoundingBox, GeoPoint, Viewport};

    pub use futures::StreamExt;
}
