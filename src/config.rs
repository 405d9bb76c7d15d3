//! Globe configuration
//!
//! Every field has a default matching the landing-page globe, so an empty
//! JSON object is a valid configuration. Files are read with
//! [`GlobeConfig::from_json_file`] and checked with [`GlobeConfig::validate`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clock::DEFAULT_STEP;
use crate::geo::MarkerPoint;
use crate::loader::{DEFAULT_DATASET_URL, DEFAULT_OBJECT};
use crate::projection::Rotation;
use crate::scene::Style;
use crate::{GlobeError, Result};

/// Stroke/fill palette entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    #[serde(default = "none")]
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub opacity: f64,
}

fn none() -> String {
    "none".to_string()
}

impl StyleConfig {
    fn new(fill: &str, stroke: &str, stroke_width: f64, opacity: f64) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: stroke.to_string(),
            stroke_width,
            opacity,
        }
    }

    pub fn to_style(&self) -> Style {
        Style::filled(self.fill.clone(), self.stroke.clone(), self.stroke_width, self.opacity)
    }

    fn validate(&self, what: &str) -> Result<()> {
        for color in [&self.fill, &self.stroke] {
            if color != "none" {
                csscolorparser::parse(color).map_err(|e| {
                    GlobeError::ConfigError(format!("Invalid {} color '{}': {}", what, color, e))
                })?;
            }
        }
        if !(self.stroke_width >= 0.0) {
            return Err(GlobeError::ConfigError(format!(
                "{} stroke width must be non-negative",
                what
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(GlobeError::ConfigError(format!(
                "{} opacity must be between 0 and 1",
                what
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub graticule: StyleConfig,
    pub country: StyleConfig,
    pub sphere: StyleConfig,
    pub marker: StyleConfig,
    pub marker_radius: f64,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            graticule: StyleConfig::new("none", "#404040", 0.5, 0.15),
            country: StyleConfig::new("#0a0a0a", "#525252", 0.8, 0.8),
            sphere: StyleConfig::new("none", "#525252", 1.5, 0.6),
            marker: StyleConfig::new("#dc2626", "#991b1b", 0.5, 0.9),
            marker_radius: 2.5,
        }
    }
}

/// Dataset location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// URL, or a local path when it does not start with `http`
    pub url: String,
    /// TopoJSON object holding the features
    pub object: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATASET_URL.to_string(),
            object: DEFAULT_OBJECT.to_string(),
        }
    }
}

impl DatasetConfig {
    pub fn is_remote(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }
}

/// Complete configuration of a globe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub width: f64,
    pub height: f64,
    /// Globe radius in pixels
    pub scale: f64,
    /// Resampling tolerance in pixels
    pub precision: f64,
    pub rotation: Rotation,
    /// Degrees of longitude per frame
    pub step: f64,
    /// Duration of one pulse leg in milliseconds
    pub pulse_ms: f64,
    pub markers: Vec<MarkerPoint>,
    pub palette: Palette,
    pub dataset: DatasetConfig,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            scale: 200.0,
            precision: 0.1,
            rotation: Rotation::new(0.0, -30.0),
            step: DEFAULT_STEP,
            pulse_ms: crate::animation::PULSE_LEG_MS,
            markers: vec![
                MarkerPoint::new("San Francisco", -122.4194, 37.7749),
                MarkerPoint::new("Toronto", -79.3832, 43.6532),
            ],
            palette: Palette::default(),
            dataset: DatasetConfig::default(),
        }
    }
}

impl GlobeConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GlobeError::ConfigError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
            .map_err(|e| GlobeError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Globe center: half the canvas size
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("scale", self.scale),
            ("pulse_ms", self.pulse_ms),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GlobeError::ConfigError(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if !(self.precision.is_finite() && self.precision >= 0.0) {
            return Err(GlobeError::ConfigError(
                "precision must be a non-negative number".to_string(),
            ));
        }
        if !(self.rotation.longitude.is_finite()
            && self.rotation.latitude.is_finite()
            && self.step.is_finite())
        {
            return Err(GlobeError::ConfigError(
                "rotation and step must be finite".to_string(),
            ));
        }
        for marker in &self.markers {
            if !marker.position.is_finite() {
                return Err(GlobeError::ConfigError(format!(
                    "Marker '{}' has non-finite coordinates",
                    marker.name
                )));
            }
        }

        self.palette.graticule.validate("graticule")?;
        self.palette.country.validate("country")?;
        self.palette.sphere.validate("sphere")?;
        self.palette.marker.validate("marker")?;
        if !(self.palette.marker_radius.is_finite() && self.palette.marker_radius > 0.0) {
            return Err(GlobeError::ConfigError(
                "marker_radius must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = GlobeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.center(), (400.0, 250.0));
        assert_eq!(config.markers.len(), 2);
    }

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = GlobeConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GlobeConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = GlobeConfig::from_json_str(
            r#"{"rotation": [90, 10], "markers": [{"name": "Null Island", "coords": [0, 0]}]}"#,
        )
        .unwrap();
        assert_eq!(config.rotation, Rotation::new(90.0, 10.0));
        assert_eq!(config.markers[0].name, "Null Island");
        assert_eq!(config.width, 800.0);
    }

    #[test]
    fn test_invalid_color_rejected() {
        let result = GlobeConfig::from_json_str(
            r##"{"palette": {"marker": {"fill": "not-a-color", "stroke": "#000", "stroke_width": 1, "opacity": 1}}}"##,
        );
        match result {
            Err(GlobeError::ConfigError(msg)) => assert!(msg.contains("not-a-color")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_scale_rejected() {
        assert!(GlobeConfig::from_json_str(r#"{"scale": 0}"#).is_err());
        assert!(GlobeConfig::from_json_str(r#"{"width": -5}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"scale": 150, "dataset": {{"url": "world.json"}}}}"#).unwrap();
        let config = GlobeConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.scale, 150.0);
        assert!(!config.dataset.is_remote());
        assert_eq!(config.dataset.object, "countries");
    }
}
