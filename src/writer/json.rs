//! JSON scene writer

use crate::scene::Scene;
use crate::writer::Writer;
use crate::{GlobeError, Result};

/// Writes the scene graph as JSON
#[derive(Debug, Clone, Default)]
pub struct JsonWriter {
    pretty: bool,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl Writer for JsonWriter {
    type Output = String;

    fn write(&self, scene: &Scene) -> Result<String> {
        let result = if self.pretty {
            serde_json::to_string_pretty(scene)
        } else {
            serde_json::to_string(scene)
        };
        result.map_err(|e| GlobeError::WriterError(format!("Failed to serialize scene: {}", e)))
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{PathClass, SceneNode, Style};
    use serde_json::Value;

    #[test]
    fn test_scene_as_json() {
        let mut scene = Scene::new(800.0, 500.0);
        scene.push(SceneNode::Path {
            class: PathClass::Sphere,
            d: "M0,0Z".to_string(),
            style: Style::stroke("#525252", 1.5, 0.6),
            visible: true,
        });

        let json: Value = serde_json::from_str(&JsonWriter::new().write(&scene).unwrap()).unwrap();
        assert_eq!(json["width"], 800.0);
        assert_eq!(json["nodes"][0]["kind"], "path");
        assert_eq!(json["nodes"][0]["class"], "sphere");
        assert_eq!(json["nodes"][0]["style"]["stroke_width"], 1.5);
    }

    #[test]
    fn test_pretty_output_is_multiline() {
        let scene = Scene::new(10.0, 10.0);
        let out = JsonWriter::new().pretty().write(&scene).unwrap();
        assert!(out.contains('\n'));
    }
}
