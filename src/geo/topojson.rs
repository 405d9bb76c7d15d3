//! TopoJSON decoding
//!
//! A topology stores every shared boundary once as an arc; geometries list
//! the arcs they are made of by index, with `!i` (bitwise not) meaning arc
//! `i` traversed backwards. Quantized topologies carry a `transform` and
//! delta-encode arc positions.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::{GeoFeature, Geometry, LonLat};
use crate::{GlobeError, Result};

/// Quantization transform: `position = quantized * scale + translate`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl Transform {
    fn apply(&self, x: f64, y: f64) -> LonLat {
        LonLat::new(
            x * self.scale[0] + self.translate[0],
            y * self.scale[1] + self.translate[1],
        )
    }
}

/// A geometry object inside `objects`
#[derive(Debug, Clone, Deserialize)]
pub struct GeometryObject {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub arcs: Option<Value>,
    #[serde(default)]
    pub coordinates: Option<Value>,
    #[serde(default)]
    pub geometries: Option<Vec<GeometryObject>>,
}

/// A parsed topology with its arcs already decoded to absolute positions
#[derive(Debug, Clone)]
pub struct Topology {
    transform: Option<Transform>,
    arcs: Vec<Vec<LonLat>>,
    objects: HashMap<String, GeometryObject>,
}

#[derive(Deserialize)]
struct RawTopology {
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    objects: HashMap<String, GeometryObject>,
}

impl Topology {
    /// Parse a topology from JSON text
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| GlobeError::ParseError(format!("Invalid TopoJSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Parse a topology from an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawTopology = serde_json::from_value(value)
            .map_err(|e| GlobeError::ParseError(format!("Invalid TopoJSON: {}", e)))?;

        let arcs = raw
            .arcs
            .iter()
            .map(|arc| decode_arc(arc, raw.transform.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            transform: raw.transform,
            arcs,
            objects: raw.objects,
        })
    }

    /// Names of the objects in this topology
    pub fn object_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.objects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Convert a named object to features
    ///
    /// A GeometryCollection yields one feature per member; any other object
    /// yields a single feature.
    pub fn features(&self, object: &str) -> Result<Vec<GeoFeature>> {
        let obj = self.objects.get(object).ok_or_else(|| {
            GlobeError::ParseError(format!(
                "Topology has no object '{}' (available: {})",
                object,
                self.object_names().join(", ")
            ))
        })?;

        if obj.kind.as_deref() == Some("GeometryCollection") {
            obj.geometries
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|g| self.feature(g))
                .collect()
        } else {
            Ok(vec![self.feature(obj)?])
        }
    }

    fn feature(&self, obj: &GeometryObject) -> Result<GeoFeature> {
        Ok(GeoFeature {
            id: obj.id.clone(),
            geometry: self.geometry(obj)?,
            properties: obj.properties.clone().unwrap_or_default(),
        })
    }

    fn geometry(&self, obj: &GeometryObject) -> Result<Option<Geometry>> {
        let kind = match obj.kind.as_deref() {
            None => return Ok(None),
            Some(kind) => kind,
        };
        let arcs = obj.arcs.as_ref().unwrap_or(&Value::Null);

        let geometry = match kind {
            "Point" => Geometry::Point(self.point(obj.coordinates.as_ref())?),
            "MultiPoint" => Geometry::MultiPoint(
                as_array(obj.coordinates.as_ref().unwrap_or(&Value::Null))?
                    .iter()
                    .map(|p| self.point(Some(p)))
                    .collect::<Result<_>>()?,
            ),
            "LineString" => Geometry::LineString(self.line(arcs)?),
            "MultiLineString" => Geometry::MultiLineString(
                as_array(arcs)?.iter().map(|a| self.line(a)).collect::<Result<_>>()?,
            ),
            "Polygon" => Geometry::Polygon(self.polygon(arcs)?),
            "MultiPolygon" => Geometry::MultiPolygon(
                as_array(arcs)?
                    .iter()
                    .map(|p| self.polygon(p))
                    .collect::<Result<_>>()?,
            ),
            "GeometryCollection" => {
                return Err(GlobeError::ParseError(
                    "Nested GeometryCollection is not supported".to_string(),
                ))
            }
            other => {
                return Err(GlobeError::ParseError(format!(
                    "Unsupported TopoJSON geometry type '{}'",
                    other
                )))
            }
        };
        Ok(Some(geometry))
    }

    fn point(&self, coords: Option<&Value>) -> Result<LonLat> {
        let pair = coords
            .and_then(Value::as_array)
            .and_then(|a| Some((a.first()?.as_f64()?, a.get(1)?.as_f64()?)))
            .ok_or_else(|| GlobeError::ParseError("Invalid point coordinates".to_string()))?;
        Ok(match &self.transform {
            Some(t) => t.apply(pair.0, pair.1),
            None => LonLat::new(pair.0, pair.1),
        })
    }

    /// Stitch arcs end to end, dropping the duplicated join positions
    fn line(&self, arcs: &Value) -> Result<Vec<LonLat>> {
        let mut points: Vec<LonLat> = Vec::new();
        for index in as_array(arcs)? {
            let i = index
                .as_i64()
                .ok_or_else(|| GlobeError::ParseError(format!("Invalid arc index: {}", index)))?;
            let (arc_idx, reversed) = if i < 0 { (!i as usize, true) } else { (i as usize, false) };
            let arc = self.arcs.get(arc_idx).ok_or_else(|| {
                GlobeError::ParseError(format!("Arc index {} out of range", arc_idx))
            })?;

            points.pop();
            if reversed {
                points.extend(arc.iter().rev());
            } else {
                points.extend(arc.iter());
            }
        }
        if points.len() == 1 {
            points.push(points[0]);
        }
        Ok(points)
    }

    fn ring(&self, arcs: &Value) -> Result<Vec<LonLat>> {
        let mut points = self.line(arcs)?;
        if let Some(&first) = points.first() {
            while points.len() < 4 {
                points.push(first);
            }
        }
        Ok(points)
    }

    fn polygon(&self, arcs: &Value) -> Result<Vec<Vec<LonLat>>> {
        as_array(arcs)?.iter().map(|r| self.ring(r)).collect()
    }
}

fn as_array(value: &Value) -> Result<&Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| GlobeError::ParseError(format!("Expected array, found: {}", value)))
}

fn decode_arc(arc: &[Vec<f64>], transform: Option<&Transform>) -> Result<Vec<LonLat>> {
    let mut x = 0.0;
    let mut y = 0.0;
    arc.iter()
        .map(|p| {
            if p.len() < 2 {
                return Err(GlobeError::ParseError("Arc position needs two values".to_string()));
            }
            Ok(match transform {
                Some(t) => {
                    x += p[0];
                    y += p[1];
                    t.apply(x, y)
                }
                None => LonLat::new(p[0], p[1]),
            })
        })
        .collect()
}
