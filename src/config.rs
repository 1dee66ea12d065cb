//! Configuration for the cartography engine
//!
//! All settings are serializable so a deployment can ship them as JSON or, with
//! the `toml` feature, as a TOML file.
use crate::error::{CartographyError, Result};
use cartography_types::{BoundingBox, Viewport};
use serde::{Deserialize, Serialize};

/// Zoom levels at which the displayed granularity switches.
///
/// Zoom levels up to and including `region` show region aggregates, levels up
/// to and including `department` show department aggregates, anything above
/// shows individual sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoomThresholds {
    #[serde(default = "ZoomThresholds::default_region")]
    pub region: i32,
    #[serde(default = "ZoomThresholds::default_department")]
    pub department: i32,
}

impl ZoomThresholds {
    const fn default_region() -> i32 {
        7
    }

    const fn default_department() -> i32 {
        9
    }

    pub fn new(region: i32, department: i32) -> Result<Self> {
        let thresholds = Self { region, department };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.region >= self.department {
            return Err(CartographyError::InvalidConfig(format!(
                "region threshold ({}) must be lower than department threshold ({})",
                self.region, self.department
            )));
        }
        Ok(())
    }
}

impl Default for ZoomThresholds {
    fn default() -> Self {
        Self {
            region: Self::default_region(),
            department: Self::default_department(),
        }
    }
}

/// Tuning of the site clustering index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterOptions {
    /// Cluster radius in screen pixels
    #[serde(default = "ClusterOptions::default_radius")]
    pub radius: f64,

    /// Tile extent in pixels the radius is relative to
    #[serde(default = "ClusterOptions::default_extent")]
    pub extent: f64,

    #[serde(default)]
    pub min_zoom: u8,

    /// Highest zoom level at which points are still clustered
    #[serde(default = "ClusterOptions::default_max_zoom")]
    pub max_zoom: u8,

    /// Minimum number of points needed to form a cluster
    #[serde(default = "ClusterOptions::default_min_points")]
    pub min_points: usize,
}

impl ClusterOptions {
    const fn default_radius() -> f64 {
        1.0
    }

    const fn default_extent() -> f64 {
        512.0
    }

    const fn default_max_zoom() -> u8 {
        19
    }

    const fn default_min_points() -> usize {
        2
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(CartographyError::InvalidConfig(format!(
                "cluster radius must be finite and non-negative, got {}",
                self.radius
            )));
        }
        if !self.extent.is_finite() || self.extent <= 0.0 {
            return Err(CartographyError::InvalidConfig(format!(
                "tile extent must be positive, got {}",
                self.extent
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(CartographyError::InvalidConfig(format!(
                "min_zoom ({}) is above max_zoom ({})",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.max_zoom > 30 {
            return Err(CartographyError::InvalidConfig(
                "max_zoom must be at most 30".to_string(),
            ));
        }
        if self.min_points < 2 {
            return Err(CartographyError::InvalidConfig(
                "a cluster needs at least 2 points".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            extent: Self::default_extent(),
            min_zoom: 0,
            max_zoom: Self::default_max_zoom(),
            min_points: Self::default_min_points(),
        }
    }
}

/// Engine configuration
///
/// # Example
///
/// ```rust
/// use cartography::Config;
///
/// let config = Config::default();
/// assert_eq!(config.zoom.region, 7);
///
/// let json = r#"{
///     "zoom": { "region": 5, "department": 8 },
///     "clustering": { "radius": 40.0 }
/// }"#;
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.zoom.department, 8);
/// assert_eq!(config.clustering.max_zoom, 19);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub zoom: ZoomThresholds,

    #[serde(default)]
    pub clustering: ClusterOptions,

    /// Viewport used before the map reports its first settle event
    #[serde(default = "Config::default_viewport")]
    pub default_viewport: Viewport,
}

impl Config {
    /// Metropolitan France at zoom 6.
    fn default_viewport() -> Viewport {
        Viewport::new(
            BoundingBox::new(
                -3.8891601562500004,
                39.30029918615029,
                13.557128906250002,
                51.56341232867588,
            ),
            6,
        )
    }

    pub fn with_zoom_thresholds(mut self, thresholds: ZoomThresholds) -> Self {
        self.zoom = thresholds;
        self
    }

    pub fn with_clustering(mut self, options: ClusterOptions) -> Self {
        self.clustering = options;
        self
    }

    pub fn with_default_viewport(mut self, viewport: Viewport) -> Self {
        self.default_viewport = viewport;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.zoom.validate()?;
        self.clustering.validate()?;
        if !self.default_viewport.bounding_box.is_finite() {
            return Err(CartographyError::InvalidConfig(
                "default viewport must have finite edges".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file; `.toml` files need the `toml` feature,
    /// anything else is parsed as JSON.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CartographyError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            #[cfg(feature = "toml")]
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zoom: ZoomThresholds::default(),
            clustering: ClusterOptions::default(),
            default_viewport: Self::default_viewport(),
        }
    }
}
