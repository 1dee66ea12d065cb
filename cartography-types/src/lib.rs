//! # cartography-types
//!
//! Geographic value types shared by the cartography viewport engine.
//!
//! - **Point types**: `GeoPoint` (range-checked latitude/longitude)
//! - **Frame types**: `BoundingBox`, `Viewport`, `CenterView`
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use cartography_types::bbox::{BoundingBox, Viewport};
//! use cartography_types::point::GeoPoint;
//!
//! let lyon = GeoPoint::new(45.734377, 4.816864).unwrap();
//! let france = Viewport::new(BoundingBox::new(-3.89, 39.3, 13.56, 51.56), 6);
//! assert!(france.bounding_box.contains(&lyon));
//! ```

pub mod bbox;
pub mod point;

pub use bbox::{BoundingBox, CenterView, Viewport};
pub use point::{CoordinateError, GeoPoint};
