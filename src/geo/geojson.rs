//! GeoJSON decoding
//!
//! Accepts a FeatureCollection, a single Feature or a bare geometry object.

use serde_json::{Map, Value};

use super::{GeoFeature, Geometry, LonLat};
use crate::{GlobeError, Result};

/// Decode features from an already-parsed GeoJSON value
pub fn features_from_value(value: &Value) -> Result<Vec<GeoFeature>> {
    match value.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    GlobeError::ParseError("FeatureCollection has no 'features' array".to_string())
                })?;
            features.iter().map(feature_from_value).collect()
        }
        Some("Feature") => Ok(vec![feature_from_value(value)?]),
        Some(_) => Ok(vec![GeoFeature {
            id: None,
            geometry: Some(geometry_from_value(value)?),
            properties: Map::new(),
        }]),
        None => Err(GlobeError::ParseError(
            "GeoJSON object has no 'type' member".to_string(),
        )),
    }
}

fn feature_from_value(value: &Value) -> Result<GeoFeature> {
    let geometry = match value.get("geometry") {
        None | Some(Value::Null) => None,
        Some(g) => Some(geometry_from_value(g)?),
    };
    let properties = value
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    Ok(GeoFeature {
        id: value.get("id").cloned(),
        geometry,
        properties,
    })
}

/// Decode a single GeoJSON geometry object
pub fn geometry_from_value(value: &Value) -> Result<Geometry> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GlobeError::ParseError("Geometry has no 'type' member".to_string()))?;
    let coords = value.get("coordinates").unwrap_or(&Value::Null);

    let geometry = match kind {
        "Point" => Geometry::Point(position(coords)?),
        "MultiPoint" => Geometry::MultiPoint(positions(coords)?),
        "LineString" => Geometry::LineString(positions(coords)?),
        "MultiLineString" => Geometry::MultiLineString(nested(coords, positions)?),
        "Polygon" => Geometry::Polygon(nested(coords, positions)?),
        "MultiPolygon" => {
            Geometry::MultiPolygon(nested(coords, |rings| nested(rings, positions))?)
        }
        "Sphere" => Geometry::Sphere,
        other => {
            return Err(GlobeError::ParseError(format!(
                "Unsupported geometry type '{}'",
                other
            )))
        }
    };
    Ok(geometry)
}

fn position(value: &Value) -> Result<LonLat> {
    let arr = value
        .as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| GlobeError::ParseError(format!("Invalid position: {}", value)))?;
    let lon = arr[0].as_f64();
    let lat = arr[1].as_f64();
    match (lon, lat) {
        (Some(lon), Some(lat)) => Ok(LonLat::new(lon, lat)),
        _ => Err(GlobeError::ParseError(format!(
            "Position must hold numbers: {}",
            value
        ))),
    }
}

fn positions(value: &Value) -> Result<Vec<LonLat>> {
    nested(value, position)
}

fn nested<T>(value: &Value, f: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    value
        .as_array()
        .ok_or_else(|| GlobeError::ParseError(format!("Expected array, found: {}", value)))?
        .iter()
        .map(f)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feature_collection() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": "CAN",
                    "properties": {"name": "Canada"},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-100, 50], [-90, 50], [-90, 60], [-100, 50]]]
                    }
                },
                {"type": "Feature", "properties": {}, "geometry": null}
            ]
        });

        let features = features_from_value(&value).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].property_str("name"), Some("Canada"));
        assert_eq!(features[0].id, Some(json!("CAN")));
        assert!(features[1].geometry.is_none());
    }

    #[test]
    fn test_bare_geometry() {
        let value = json!({
            "type": "MultiLineString",
            "coordinates": [[[0, 0], [1, 1]], [[2, 2], [3, 3]]]
        });
        let features = features_from_value(&value).unwrap();
        match features[0].geometry.as_ref().unwrap() {
            Geometry::MultiLineString(lines) => assert_eq!(lines.len(), 2),
            other => panic!("Unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_invalid_position() {
        let value = json!({"type": "Point", "coordinates": ["a", 1]});
        let err = geometry_from_value(&value).unwrap_err();
        assert!(err.to_string().contains("Position"));
    }

    #[test]
    fn test_unknown_geometry_type() {
        let value = json!({"type": "Circle", "coordinates": [0, 0]});
        assert!(geometry_from_value(&value).is_err());
    }
}
