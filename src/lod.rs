//! Zoom-driven choice of display granularity.

use crate::config::ZoomThresholds;
use crate::error::Result;
use crate::model::DisplayGranularity;

/// Maps a zoom level, plus the finest-detail override, to a granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelOfDetailSelector {
    thresholds: ZoomThresholds,
}

impl LevelOfDetailSelector {
    /// Fails with `InvalidConfig` unless `region < department`.
    pub fn new(thresholds: ZoomThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> ZoomThresholds {
        self.thresholds
    }

    /// Zoom levels up to `region` show regions, up to `department` show
    /// departments, anything above shows sites. `force_finest_detail` always
    /// shows sites.
    pub fn select(&self, zoom_level: i32, force_finest_detail: bool) -> DisplayGranularity {
        if force_finest_detail || zoom_level > self.thresholds.department {
            DisplayGranularity::Site
        } else if zoom_level > self.thresholds.region {
            DisplayGranularity::Department
        } else {
            DisplayGranularity::Region
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CartographyError;

    #[test]
    fn test_default_thresholds() {
        let selector = LevelOfDetailSelector::default();
        assert_eq!(selector.select(6, false), DisplayGranularity::Region);
        assert_eq!(selector.select(7, false), DisplayGranularity::Region);
        assert_eq!(selector.select(8, false), DisplayGranularity::Department);
        assert_eq!(selector.select(9, false), DisplayGranularity::Department);
        assert_eq!(selector.select(10, false), DisplayGranularity::Site);
    }

    #[test]
    fn test_monotonic_over_zoom() {
        let selector = LevelOfDetailSelector::new(ZoomThresholds::new(3, 11).unwrap()).unwrap();
        let mut previous = DisplayGranularity::Region;
        for zoom in -5..=30 {
            let granularity = selector.select(zoom, false);
            assert!(granularity >= previous, "granularity went back at zoom {}", zoom);
            let expected = if zoom <= 3 {
                DisplayGranularity::Region
            } else if zoom <= 11 {
                DisplayGranularity::Department
            } else {
                DisplayGranularity::Site
            };
            assert_eq!(granularity, expected);
            previous = granularity;
        }
    }

    #[test]
    fn test_override_wins() {
        let selector = LevelOfDetailSelector::default();
        for zoom in [i32::MIN, -1, 0, 7, 9, 10, i32::MAX] {
            assert_eq!(selector.select(zoom, true), DisplayGranularity::Site);
        }
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let thresholds = ZoomThresholds {
            region: 9,
            department: 9,
        };
        assert!(matches!(
            LevelOfDetailSelector::new(thresholds),
            Err(CartographyError::InvalidConfig(_))
        ));
    }
}
