//! Vector scene graph
//!
//! The scene is rebuilt from scratch on every render pass: [`Scene::clear`]
//! drops every node of the previous frame before the next frame adds its own.

use serde::Serialize;

/// Presentation attributes of a scene node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Style {
    /// Stroke-only style with no fill
    pub fn stroke(color: impl Into<String>, width: f64, opacity: f64) -> Self {
        Self {
            fill: "none".to_string(),
            stroke: color.into(),
            stroke_width: width,
            opacity,
        }
    }

    pub fn filled(
        fill: impl Into<String>,
        stroke: impl Into<String>,
        width: f64,
        opacity: f64,
    ) -> Self {
        Self {
            fill: fill.into(),
            stroke: stroke.into(),
            stroke_width: width,
            opacity,
        }
    }
}

/// Layer a path belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathClass {
    Graticule,
    Country,
    Sphere,
}

impl PathClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathClass::Graticule => "graticule",
            PathClass::Country => "country",
            PathClass::Sphere => "sphere",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SceneNode {
    Path {
        class: PathClass,
        d: String,
        style: Style,
        /// Hidden paths stay in the scene with `visibility="hidden"`
        visible: bool,
    },
    Circle {
        marker: String,
        cx: f64,
        cy: f64,
        r: f64,
        style: Style,
    },
}

/// Canvas of fixed size holding the current frame's nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    width: f64,
    height: f64,
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            nodes: Vec::new(),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Release every node of the previous frame
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn push(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Paths of one layer, in drawing order
    pub fn paths(&self, class: PathClass) -> impl Iterator<Item = &SceneNode> {
        self.nodes
            .iter()
            .filter(move |n| matches!(n, SceneNode::Path { class: c, .. } if *c == class))
    }

    /// Marker circle drawn for `name`, if any
    pub fn marker(&self, name: &str) -> Option<&SceneNode> {
        self.nodes
            .iter()
            .find(|n| matches!(n, SceneNode::Circle { marker, .. } if marker == name))
    }

    /// Set the opacity of a marker's circle; returns false if it is not drawn
    pub fn set_marker_opacity(&mut self, name: &str, value: f64) -> bool {
        for node in &mut self.nodes {
            if let SceneNode::Circle { marker, style, .. } = node {
                if marker == name {
                    style.opacity = value;
                    return true;
                }
            }
        }
        false
    }
}
