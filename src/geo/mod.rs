//! Geographic model for globeview
//!
//! Features, geometries and the world dataset, plus the decoders that turn a
//! fetched payload (TopoJSON or GeoJSON) into features and the graticule
//! generator.
//!
//! All coordinates are longitude/latitude in degrees.

pub mod geojson;
pub mod graticule;
pub mod topojson;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{GlobeError, Result};

pub use graticule::Graticule;

/// A longitude/latitude pair in degrees
///
/// Serialized as a `[lon, lat]` array, matching GeoJSON positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Point diametrically opposite on the sphere
    pub fn antipode(&self) -> Self {
        let lon = if self.lon > 0.0 {
            self.lon - 180.0
        } else {
            self.lon + 180.0
        };
        Self::new(lon, -self.lat)
    }
}

impl From<[f64; 2]> for LonLat {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

impl From<LonLat> for [f64; 2] {
    fn from(p: LonLat) -> Self {
        [p.lon, p.lat]
    }
}

/// Great-circle distance between two points, in radians
pub fn geo_distance(a: LonLat, b: LonLat) -> f64 {
    let (lambda0, phi0) = (a.lon.to_radians(), a.lat.to_radians());
    let (lambda1, phi1) = (b.lon.to_radians(), b.lat.to_radians());
    let delta = (lambda1 - lambda0).abs();
    let (sin_delta, cos_delta) = delta.sin_cos();
    let (sin_phi0, cos_phi0) = phi0.sin_cos();
    let (sin_phi1, cos_phi1) = phi1.sin_cos();

    let x = cos_phi1 * sin_delta;
    let y = cos_phi0 * sin_phi1 - sin_phi0 * cos_phi1 * cos_delta;
    let z = sin_phi0 * sin_phi1 + cos_phi0 * cos_phi1 * cos_delta;
    (x * x + y * y).sqrt().atan2(z)
}

/// Geometry of a feature
///
/// Rings are closed (first position repeated at the end) as in GeoJSON.
/// `Sphere` stands for the whole globe and projects to its silhouette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(LonLat),
    MultiPoint(Vec<LonLat>),
    LineString(Vec<LonLat>),
    MultiLineString(Vec<Vec<LonLat>>),
    Polygon(Vec<Vec<LonLat>>),
    MultiPolygon(Vec<Vec<Vec<LonLat>>>),
    Sphere,
}

impl Geometry {
    /// Name of the geometry type as used in GeoJSON
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::Sphere => "Sphere",
        }
    }

    /// Whether every ring of a polygon spans the full longitude and latitude domain.
    ///
    /// Such polygons stand for the whole map extent and are drawn as the sphere.
    pub fn spans_full_extent(&self) -> bool {
        match self {
            Geometry::Polygon(rings) => rings.first().is_some_and(|ring| ring_spans_domain(ring)),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .any(|rings| rings.first().is_some_and(|ring| ring_spans_domain(ring))),
            Geometry::Sphere => true,
            _ => false,
        }
    }
}

fn ring_spans_domain(ring: &[LonLat]) -> bool {
    let mut lon = (f64::INFINITY, f64::NEG_INFINITY);
    let mut lat = (f64::INFINITY, f64::NEG_INFINITY);
    for p in ring {
        lon = (lon.0.min(p.lon), lon.1.max(p.lon));
        lat = (lat.0.min(p.lat), lat.1.max(p.lat));
    }
    lon.0 <= -180.0 && lon.1 >= 180.0 && lat.0 <= -90.0 && lat.1 >= 90.0
}

/// One geographic region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoFeature {
    /// Optional identifier carried over from the source dataset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// `None` for null geometries
    pub geometry: Option<Geometry>,
    /// Opaque property bag
    pub properties: Map<String, Value>,
}

impl GeoFeature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: None,
            geometry: Some(geometry),
            properties: Map::new(),
        }
    }

    /// Look up a string property (e.g. `name`)
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}

/// Ordered, immutable sequence of features
///
/// Never empty: construction from an empty feature list fails, and the
/// fallback dataset holds exactly one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldDataset {
    features: Vec<GeoFeature>,
}

impl WorldDataset {
    /// Build a dataset from decoded features
    pub fn from_features(features: Vec<GeoFeature>) -> Result<Self> {
        if features.is_empty() {
            return Err(GlobeError::ParseError(
                "Dataset contains no features".to_string(),
            ));
        }
        Ok(Self { features })
    }

    /// Single rectangle covering the whole longitude/latitude domain
    pub fn fallback() -> Self {
        let ring = vec![
            LonLat::new(-180.0, -90.0),
            LonLat::new(180.0, -90.0),
            LonLat::new(180.0, 90.0),
            LonLat::new(-180.0, 90.0),
            LonLat::new(-180.0, -90.0),
        ];
        Self {
            features: vec![GeoFeature::new(Geometry::Polygon(vec![ring]))],
        }
    }

    /// Decode a fetched payload
    ///
    /// TopoJSON topologies use `object` to select the feature collection;
    /// GeoJSON payloads ignore it.
    pub fn decode(payload: &str, object: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| GlobeError::ParseError(format!("Invalid JSON payload: {}", e)))?;

        let features = match value.get("type").and_then(Value::as_str) {
            Some("Topology") => topojson::Topology::from_value(value)?.features(object)?,
            Some(_) => geojson::features_from_value(&value)?,
            None => {
                return Err(GlobeError::ParseError(
                    "Payload has no 'type' member".to_string(),
                ))
            }
        };

        Self::from_features(features)
    }

    pub fn features(&self) -> &[GeoFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeoFeature> {
        self.features.iter()
    }

    /// Whether this is the single-rectangle fallback
    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}

impl<'a> IntoIterator for &'a WorldDataset {
    type Item = &'a GeoFeature;
    type IntoIter = std::slice::Iter<'a, GeoFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// A named point drawn as a pulsing marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPoint {
    pub name: String,
    #[serde(rename = "coords")]
    pub position: LonLat,
}

impl MarkerPoint {
    pub fn new(name: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            name: name.into(),
            position: LonLat::new(lon, lat),
        }
    }

    /// Visible when less than 90° of arc away from the facing point
    pub fn is_visible_from(&self, facing: LonLat) -> bool {
        geo_distance(self.position, facing) < std::f64::consts::FRAC_PI_2
    }
}
