//! SVG scene writer
//!
//! Emits one `<path>` per path node and one `<circle>` per marker, in scene
//! order, inside an `<svg>` root whose `viewBox` is the canvas.

use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::scene::{Scene, SceneNode, Style};
use crate::writer::{format_number, Writer};
use crate::{GlobeError, Result};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Clone)]
pub struct SvgWriter {
    indent: Option<usize>,
}

impl SvgWriter {
    pub fn new() -> Self {
        Self { indent: Some(2) }
    }

    /// Write everything on a single line
    pub fn compact(mut self) -> Self {
        self.indent = None;
        self
    }

    fn root(&self, scene: &Scene) -> BytesStart<'static> {
        let mut root = BytesStart::new("svg");
        root.push_attribute(("xmlns", SVG_NS));
        root.push_attribute((
            "viewBox",
            format!(
                "0 0 {} {}",
                format_number(scene.width()),
                format_number(scene.height())
            )
            .as_str(),
        ));
        root.push_attribute(("width", format_number(scene.width()).as_str()));
        root.push_attribute(("height", format_number(scene.height()).as_str()));
        root.push_attribute(("preserveAspectRatio", "xMidYMid meet"));
        root
    }
}

impl Default for SvgWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn push_style(element: &mut BytesStart<'_>, style: &Style) {
    element.push_attribute(("fill", style.fill.as_str()));
    element.push_attribute(("stroke", style.stroke.as_str()));
    element.push_attribute(("stroke-width", format_number(style.stroke_width).as_str()));
    element.push_attribute(("opacity", format_number(style.opacity).as_str()));
}

fn xml_error(e: impl std::fmt::Display) -> GlobeError {
    GlobeError::WriterError(format!("Failed to write SVG: {}", e))
}

fn node_element(node: &SceneNode) -> BytesStart<'static> {
    match node {
        SceneNode::Path {
            class,
            d,
            style,
            visible,
        } => {
            let mut path = BytesStart::new("path");
            path.push_attribute(("class", class.as_str()));
            path.push_attribute(("d", d.as_str()));
            push_style(&mut path, style);
            if !visible {
                path.push_attribute(("style", "visibility: hidden"));
            }
            path
        }
        SceneNode::Circle {
            marker,
            cx,
            cy,
            r,
            style,
        } => {
            let mut circle = BytesStart::new("circle");
            circle.push_attribute(("class", "marker"));
            circle.push_attribute(("data-name", marker.as_str()));
            circle.push_attribute(("cx", format_number(*cx).as_str()));
            circle.push_attribute(("cy", format_number(*cy).as_str()));
            circle.push_attribute(("r", format_number(*r).as_str()));
            push_style(&mut circle, style);
            circle
        }
    }
}

impl Writer for SvgWriter {
    type Output = String;

    fn write(&self, scene: &Scene) -> Result<String> {
        let mut xml = match self.indent {
            Some(n) => quick_xml::Writer::new_with_indent(Vec::new(), b' ', n),
            None => quick_xml::Writer::new(Vec::new()),
        };
        xml.write_event(Event::Start(self.root(scene))).map_err(xml_error)?;
        for node in scene.nodes() {
            xml.write_event(Event::Empty(node_element(node))).map_err(xml_error)?;
        }
        xml.write_event(Event::End(BytesEnd::new("svg"))).map_err(xml_error)?;

        String::from_utf8(xml.into_inner())
            .map_err(|e| GlobeError::WriterError(format!("SVG output is not UTF-8: {}", e)))
    }

    fn extension(&self) -> &'static str {
        "svg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::PathClass;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new(800.0, 500.0);
        scene.push(SceneNode::Path {
            class: PathClass::Country,
            d: String::new(),
            style: Style::filled("#0a0a0a", "#525252", 0.8, 0.8),
            visible: false,
        });
        scene.push(SceneNode::Circle {
            marker: "San Francisco".to_string(),
            cx: 123.45678,
            cy: 200.0,
            r: 2.5,
            style: Style::filled("#dc2626", "#991b1b", 0.5, 0.9),
        });
        scene
    }

    #[test]
    fn test_root_attributes() {
        let svg = SvgWriter::new().write(&Scene::new(800.0, 500.0)).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 800 500""#));
        assert!(svg.contains(r#"preserveAspectRatio="xMidYMid meet""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_nodes_written_in_order() {
        let svg = SvgWriter::new().compact().write(&sample_scene()).unwrap();
        let path_at = svg.find("<path").unwrap();
        let circle_at = svg.find("<circle").unwrap();
        assert!(path_at < circle_at);
        assert!(svg.contains(r#"style="visibility: hidden""#));
        assert!(svg.contains(r#"cx="123.457""#));
        assert!(svg.contains(r#"data-name="San Francisco""#));
        assert!(svg.contains(r##"fill="#dc2626""##));
    }
}
