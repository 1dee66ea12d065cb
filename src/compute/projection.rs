//! Web-Mercator projection onto the unit square.
//!
//! The cluster index works in projected space where `x` runs from 0 (180°W)
//! to 1 (180°E) and `y` from 0 (north) to 1 (south). At zoom `z` the world is
//! `extent * 2^z` pixels wide, so a pixel radius converts to projected units
//! with [`pixel_radius`].

use std::f64::consts::PI;

/// Longitude to projected x.
#[inline]
pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Latitude to projected y, clamped to the unit interval at the poles.
#[inline]
pub fn lat_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

/// Projected x back to longitude.
#[inline]
pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// Projected y back to latitude.
#[inline]
pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Converts a radius in screen pixels at `zoom` into projected units.
#[inline]
pub fn pixel_radius(radius: f64, extent: f64, zoom: u8) -> f64 {
    radius / (extent * f64::powi(2.0, i32::from(zoom)))
}
