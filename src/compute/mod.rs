//! Coordinate validation, map projection, and GeoJSON export.
//!
//! Everything here is pure computation with no engine state.

#[cfg(feature = "geojson")]
pub mod geojson;
pub mod projection;
pub mod validation;
