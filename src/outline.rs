//! Outline graphic loader
//!
//! Loads a line-art SVG, recolors it to a single foreground color and crops
//! its `viewBox` to the drawn content.
//!
//! # Processing
//!
//! 1. parse the text and locate the first `<svg>` element; everything outside
//!    it is dropped
//! 2. move the element's children into a `<g>` group
//! 3. inside the group, set every `stroke` attribute to the foreground color,
//!    and every `fill` attribute other than `none`
//! 4. measure the group's bounding box from its shapes and, when it has a
//!    positive width and height, set `viewBox` to the box grown by the padding
//!    on every side
//! 5. set `preserveAspectRatio="xMidYMid meet"`
//!
//! Any failure along the way (fetch, parse, no `<svg>`) turns into
//! [`Outline::Error`], which displays as `Error: <message>` in place of the
//! graphic.
//!
//! Bounding boxes ignore `transform` attributes and skip shapes inside
//! `<defs>`, `<clipPath>`, `<mask>`, `<marker>`, `<pattern>` and `<symbol>`.

use std::fmt;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use tracing::{debug, warn};

use crate::loader::DatasetSource;
use crate::{GlobeError, Result};

pub const DEFAULT_COLOR: &str = "white";
pub const DEFAULT_PADDING: f64 = 10.0;

const NON_RENDERED: &[&[u8]] = &[b"defs", b"clipPath", b"mask", b"marker", b"pattern", b"symbol"];

/// Result of loading an outline
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    /// The processed SVG document
    Graphic(String),
    /// Message shown instead of the graphic
    Error(String),
}

impl Outline {
    pub fn is_error(&self) -> bool {
        matches!(self, Outline::Error(_))
    }
}

impl fmt::Display for Outline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outline::Graphic(svg) => f.write_str(svg),
            Outline::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Axis-aligned box accumulated from points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    fn add(&mut self, x: f64, y: f64) {
        if x.is_finite() && y.is_finite() {
            self.min_x = self.min_x.min(x);
            self.min_y = self.min_y.min(y);
            self.max_x = self.max_x.max(x);
            self.max_y = self.max_y.max(y);
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }
}

/// Recolor-and-fit processor for outline SVGs
#[derive(Debug, Clone)]
pub struct OutlineLoader {
    color: String,
    padding: f64,
    number: Regex,
    command: Regex,
}

impl OutlineLoader {
    pub fn new() -> Result<Self> {
        let number = Regex::new(r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?")
            .map_err(|e| GlobeError::AssetError(e.to_string()))?;
        let command =
            Regex::new(r"([MmLlHhVvCcSsQqTtAaZz])|([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)")
                .map_err(|e| GlobeError::AssetError(e.to_string()))?;
        Ok(Self {
            color: DEFAULT_COLOR.to_string(),
            padding: DEFAULT_PADDING,
            number,
            command,
        })
    }

    /// Foreground color; any CSS color
    pub fn with_color(mut self, color: impl Into<String>) -> Result<Self> {
        let color = color.into();
        csscolorparser::parse(&color).map_err(|e| {
            GlobeError::ConfigError(format!("Invalid outline color '{}': {}", color, e))
        })?;
        self.color = color;
        Ok(self)
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Fetch and process, turning any failure into [`Outline::Error`]
    pub fn load(&self, source: &dyn DatasetSource) -> Outline {
        let result = source.fetch().and_then(|text| self.process(&text));
        match result {
            Ok(svg) => {
                debug!(source = %source.describe(), "Outline loaded");
                Outline::Graphic(svg)
            }
            Err(e) => {
                warn!(source = %source.describe(), error = %e, "Outline load failed");
                Outline::Error(error_message(&e))
            }
        }
    }

    /// Recolor and re-frame an SVG document
    pub fn process(&self, text: &str) -> Result<String> {
        let events = svg_subtree(text)?;
        let bbox = self.content_bounds(&events[1..])?;

        let mut xml = quick_xml::Writer::new(Vec::new());
        let root = match &events[0] {
            Event::Start(e) | Event::Empty(e) => self.reframe_root(e, bbox)?,
            _ => return Err(GlobeError::AssetError("No SVG element found in file".to_string())),
        };

        let root_name = element_name(&root)?;
        xml.write_event(Event::Start(root)).map_err(write_error)?;
        xml.write_event(Event::Start(BytesStart::new("g"))).map_err(write_error)?;
        // The closing </svg> (absent for an empty root) is written below
        let children = match events.last() {
            Some(Event::End(_)) if events.len() > 1 => &events[1..events.len() - 1],
            _ => &events[1..],
        };
        for event in children {
            let event = match event {
                Event::Start(e) => Event::Start(self.recolor(e)?),
                Event::Empty(e) => Event::Empty(self.recolor(e)?),
                other => other.clone(),
            };
            xml.write_event(event).map_err(write_error)?;
        }
        xml.write_event(Event::End(BytesEnd::new("g"))).map_err(write_error)?;
        xml.write_event(Event::End(BytesEnd::new(root_name))).map_err(write_error)?;

        String::from_utf8(xml.into_inner())
            .map_err(|e| GlobeError::AssetError(format!("SVG output is not UTF-8: {}", e)))
    }

    fn reframe_root(&self, root: &BytesStart<'_>, bbox: BBox) -> Result<BytesStart<'static>> {
        let name = element_name(root)?;
        let mut out = BytesStart::new(name);
        for (key, value) in attributes(root)? {
            if key == "preserveAspectRatio" || (key == "viewBox" && bbox.has_area()) {
                continue;
            }
            out.push_attribute((key.as_str(), value.as_str()));
        }
        if bbox.has_area() {
            let p = self.padding;
            let view_box = format!(
                "{} {} {} {}",
                bbox.min_x - p,
                bbox.min_y - p,
                bbox.width() + 2.0 * p,
                bbox.height() + 2.0 * p
            );
            out.push_attribute(("viewBox", view_box.as_str()));
        } else {
            debug!("Outline has no measurable content, keeping viewBox");
        }
        out.push_attribute(("preserveAspectRatio", "xMidYMid meet"));
        Ok(out)
    }

    fn recolor(&self, element: &BytesStart<'_>) -> Result<BytesStart<'static>> {
        let mut out = BytesStart::new(element_name(element)?);
        for (key, value) in attributes(element)? {
            let value = match key.as_str() {
                "stroke" => self.color.clone(),
                "fill" if value != "none" => self.color.clone(),
                _ => value,
            };
            out.push_attribute((key.as_str(), value.as_str()));
        }
        Ok(out)
    }

    /// Bounding box of the shapes among `events`
    pub fn content_bounds(&self, events: &[Event<'_>]) -> Result<BBox> {
        let mut bbox = BBox::empty();
        let mut hidden_depth = 0usize;

        for event in events {
            match event {
                Event::Start(e) => {
                    if hidden_depth > 0 || NON_RENDERED.contains(&e.local_name().as_ref()) {
                        hidden_depth += 1;
                    } else {
                        self.add_shape(e, &mut bbox)?;
                    }
                }
                Event::Empty(e) => {
                    if hidden_depth == 0 && !NON_RENDERED.contains(&e.local_name().as_ref()) {
                        self.add_shape(e, &mut bbox)?;
                    }
                }
                Event::End(_) => hidden_depth = hidden_depth.saturating_sub(1),
                _ => {}
            }
        }
        Ok(bbox)
    }

    fn add_shape(&self, element: &BytesStart<'_>, bbox: &mut BBox) -> Result<()> {
        let attrs = attributes(element)?;
        let get = |key: &str| -> Option<f64> {
            attrs
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| self.length(v))
        };

        match element.local_name().as_ref() {
            b"path" => {
                if let Some((_, d)) = attrs.iter().find(|(k, _)| k == "d") {
                    self.path_bounds(d, bbox);
                }
            }
            b"rect" => {
                if let (Some(w), Some(h)) = (get("width"), get("height")) {
                    let x = get("x").unwrap_or(0.0);
                    let y = get("y").unwrap_or(0.0);
                    bbox.add(x, y);
                    bbox.add(x + w, y + h);
                }
            }
            b"circle" => {
                if let Some(r) = get("r") {
                    let cx = get("cx").unwrap_or(0.0);
                    let cy = get("cy").unwrap_or(0.0);
                    bbox.add(cx - r, cy - r);
                    bbox.add(cx + r, cy + r);
                }
            }
            b"ellipse" => {
                if let (Some(rx), Some(ry)) = (get("rx"), get("ry")) {
                    let cx = get("cx").unwrap_or(0.0);
                    let cy = get("cy").unwrap_or(0.0);
                    bbox.add(cx - rx, cy - ry);
                    bbox.add(cx + rx, cy + ry);
                }
            }
            b"line" => {
                bbox.add(get("x1").unwrap_or(0.0), get("y1").unwrap_or(0.0));
                bbox.add(get("x2").unwrap_or(0.0), get("y2").unwrap_or(0.0));
            }
            b"polyline" | b"polygon" => {
                if let Some((_, points)) = attrs.iter().find(|(k, _)| k == "points") {
                    let values = self.numbers(points);
                    for pair in values.chunks_exact(2) {
                        bbox.add(pair[0], pair[1]);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Absolute length; percentages are not resolved
    fn length(&self, value: &str) -> Option<f64> {
        if value.trim_end().ends_with('%') {
            return None;
        }
        self.number
            .find(value)
            .and_then(|m| m.as_str().parse::<f64>().ok())
    }

    fn numbers(&self, text: &str) -> Vec<f64> {
        self.number
            .find_iter(text)
            .filter_map(|m| m.as_str().parse::<f64>().ok())
            .collect()
    }

    /// Extend `bbox` with the exact extent of path data
    pub fn path_bounds(&self, d: &str, bbox: &mut BBox) {
        let mut tracer = PathTracer::new(bbox);
        let mut command: Option<char> = None;
        let mut args: Vec<f64> = Vec::new();

        for caps in self.command.captures_iter(d) {
            if let Some(c) = caps.get(1) {
                if let Some(cmd) = command {
                    tracer.run(cmd, &args);
                }
                command = c.as_str().chars().next();
                args.clear();
                if matches!(command, Some('Z' | 'z')) {
                    tracer.run('Z', &[]);
                    command = None;
                }
            } else if let Some(n) = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok()) {
                args.push(n);
            }
        }
        if let Some(cmd) = command {
            tracer.run(cmd, &args);
        }
    }
}

/// Walks path commands and accumulates the exact curve extent
struct PathTracer<'a> {
    bbox: &'a mut BBox,
    current: (f64, f64),
    start: (f64, f64),
    /// Last control point, for the smooth curve commands
    control: Option<(char, (f64, f64))>,
}

impl<'a> PathTracer<'a> {
    fn new(bbox: &'a mut BBox) -> Self {
        Self {
            bbox,
            current: (0.0, 0.0),
            start: (0.0, 0.0),
            control: None,
        }
    }

    fn point(&mut self, p: (f64, f64)) {
        self.bbox.add(p.0, p.1);
        self.current = p;
    }

    /// Apply one command letter to its (possibly repeated) arguments
    fn run(&mut self, cmd: char, args: &[f64]) {
        let relative = cmd.is_ascii_lowercase();
        let offset = |tracer: &Self, x: f64, y: f64| {
            if relative {
                (tracer.current.0 + x, tracer.current.1 + y)
            } else {
                (x, y)
            }
        };

        match cmd.to_ascii_uppercase() {
            'M' => {
                for (i, pair) in args.chunks_exact(2).enumerate() {
                    let p = offset(self, pair[0], pair[1]);
                    self.point(p);
                    if i == 0 {
                        self.start = p;
                    }
                }
                self.control = None;
            }
            'L' => {
                for pair in args.chunks_exact(2) {
                    let p = offset(self, pair[0], pair[1]);
                    self.point(p);
                }
                self.control = None;
            }
            'H' => {
                for &x in args {
                    let x = if relative { self.current.0 + x } else { x };
                    self.point((x, self.current.1));
                }
                self.control = None;
            }
            'V' => {
                for &y in args {
                    let y = if relative { self.current.1 + y } else { y };
                    self.point((self.current.0, y));
                }
                self.control = None;
            }
            'C' => {
                for c in args.chunks_exact(6) {
                    let p0 = self.current;
                    let p1 = offset(self, c[0], c[1]);
                    let p2 = offset(self, c[2], c[3]);
                    let p3 = offset(self, c[4], c[5]);
                    self.cubic(p0, p1, p2, p3);
                }
            }
            'S' => {
                for c in args.chunks_exact(4) {
                    let p0 = self.current;
                    let p1 = match self.control {
                        Some(('C', ctrl)) => (2.0 * p0.0 - ctrl.0, 2.0 * p0.1 - ctrl.1),
                        _ => p0,
                    };
                    let p2 = offset(self, c[0], c[1]);
                    let p3 = offset(self, c[2], c[3]);
                    self.cubic(p0, p1, p2, p3);
                }
            }
            'Q' => {
                for c in args.chunks_exact(4) {
                    let p0 = self.current;
                    let p1 = offset(self, c[0], c[1]);
                    let p2 = offset(self, c[2], c[3]);
                    self.quadratic(p0, p1, p2);
                }
            }
            'T' => {
                for c in args.chunks_exact(2) {
                    let p0 = self.current;
                    let p1 = match self.control {
                        Some(('Q', ctrl)) => (2.0 * p0.0 - ctrl.0, 2.0 * p0.1 - ctrl.1),
                        _ => p0,
                    };
                    let p2 = offset(self, c[0], c[1]);
                    self.quadratic(p0, p1, p2);
                }
            }
            'A' => {
                for a in args.chunks_exact(7) {
                    let p0 = self.current;
                    let p1 = offset(self, a[5], a[6]);
                    self.arc(p0, (a[0], a[1]), a[2], a[3] != 0.0, a[4] != 0.0, p1);
                }
                self.control = None;
            }
            'Z' => {
                self.current = self.start;
                self.control = None;
            }
            _ => {}
        }
    }

    fn cubic(&mut self, p0: (f64, f64), p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)) {
        let at = |t: f64, a: f64, b: f64, c: f64, d: f64| {
            let mt = 1.0 - t;
            mt * mt * mt * a + 3.0 * mt * mt * t * b + 3.0 * mt * t * t * c + t * t * t * d
        };
        for axis in 0..2 {
            let [a, b, c, d] = if axis == 0 {
                [p0.0, p1.0, p2.0, p3.0]
            } else {
                [p0.1, p1.1, p2.1, p3.1]
            };
            for t in cubic_extrema(a, b, c, d) {
                self.bbox.add(
                    at(t, p0.0, p1.0, p2.0, p3.0),
                    at(t, p0.1, p1.1, p2.1, p3.1),
                );
            }
        }
        self.point(p3);
        self.control = Some(('C', p2));
    }

    fn quadratic(&mut self, p0: (f64, f64), p1: (f64, f64), p2: (f64, f64)) {
        let at = |t: f64, a: f64, b: f64, c: f64| {
            let mt = 1.0 - t;
            mt * mt * a + 2.0 * mt * t * b + t * t * c
        };
        for axis in 0..2 {
            let [a, b, c] = if axis == 0 {
                [p0.0, p1.0, p2.0]
            } else {
                [p0.1, p1.1, p2.1]
            };
            let denom = a - 2.0 * b + c;
            if denom != 0.0 {
                let t = (a - b) / denom;
                if t > 0.0 && t < 1.0 {
                    self.bbox.add(at(t, p0.0, p1.0, p2.0), at(t, p0.1, p1.1, p2.1));
                }
            }
        }
        self.point(p2);
        self.control = Some(('Q', p1));
    }

    /// Elliptical arc, sampled after conversion to center form
    fn arc(
        &mut self,
        p0: (f64, f64),
        radii: (f64, f64),
        rotation_deg: f64,
        large_arc: bool,
        sweep: bool,
        p1: (f64, f64),
    ) {
        let (mut rx, mut ry) = (radii.0.abs(), radii.1.abs());
        if rx == 0.0 || ry == 0.0 || p0 == p1 {
            self.point(p1);
            return;
        }

        let (sin_phi, cos_phi) = rotation_deg.to_radians().sin_cos();
        let dx = (p0.0 - p1.0) / 2.0;
        let dy = (p0.1 - p1.1) / 2.0;
        let x1 = cos_phi * dx + sin_phi * dy;
        let y1 = -sin_phi * dx + cos_phi * dy;

        let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
        if lambda > 1.0 {
            rx *= lambda.sqrt();
            ry *= lambda.sqrt();
        }

        let num = rx * rx * ry * ry - rx * rx * y1 * y1 - ry * ry * x1 * x1;
        let den = rx * rx * y1 * y1 + ry * ry * x1 * x1;
        let mut coef = (num / den).max(0.0).sqrt();
        if large_arc == sweep {
            coef = -coef;
        }
        let cx1 = coef * rx * y1 / ry;
        let cy1 = -coef * ry * x1 / rx;
        let cx = cos_phi * cx1 - sin_phi * cy1 + (p0.0 + p1.0) / 2.0;
        let cy = sin_phi * cx1 + cos_phi * cy1 + (p0.1 + p1.1) / 2.0;

        let angle = |ux: f64, uy: f64| uy.atan2(ux);
        let theta1 = angle((x1 - cx1) / rx, (y1 - cy1) / ry);
        let mut delta = angle((-x1 - cx1) / rx, (-y1 - cy1) / ry) - theta1;
        if sweep && delta < 0.0 {
            delta += std::f64::consts::TAU;
        } else if !sweep && delta > 0.0 {
            delta -= std::f64::consts::TAU;
        }

        const SAMPLES: usize = 32;
        for i in 1..SAMPLES {
            let theta = theta1 + delta * i as f64 / SAMPLES as f64;
            let (s, c) = theta.sin_cos();
            let x = cx + rx * c * cos_phi - ry * s * sin_phi;
            let y = cy + rx * c * sin_phi + ry * s * cos_phi;
            self.bbox.add(x, y);
        }
        self.point(p1);
    }
}

/// Parameters in (0, 1) where a cubic Bézier coordinate has zero derivative
fn cubic_extrema(p0: f64, p1: f64, p2: f64, p3: f64) -> Vec<f64> {
    let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
    let b = 2.0 * (p0 - 2.0 * p1 + p2);
    let c = p1 - p0;

    let mut roots = Vec::new();
    if a.abs() < 1e-12 {
        if b.abs() > 1e-12 {
            roots.push(-c / b);
        }
    } else {
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let sq = disc.sqrt();
            roots.push((-b + sq) / (2.0 * a));
            roots.push((-b - sq) / (2.0 * a));
        }
    }
    roots.retain(|t| *t > 0.0 && *t < 1.0);
    roots
}

fn write_error(e: impl fmt::Display) -> GlobeError {
    GlobeError::AssetError(format!("Failed to write SVG: {}", e))
}

fn element_name(element: &BytesStart<'_>) -> Result<String> {
    std::str::from_utf8(element.name().as_ref())
        .map(str::to_string)
        .map_err(|e| GlobeError::AssetError(format!("Invalid element name: {}", e)))
}

fn attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    element
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(|e| GlobeError::AssetError(format!("Invalid SVG: {}", e)))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| GlobeError::AssetError(format!("Invalid SVG: {}", e)))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| GlobeError::AssetError(format!("Invalid SVG: {}", e)))?
                .into_owned();
            Ok((key, value))
        })
        .collect()
}

/// Events of the first `<svg>` element, from its start tag to its end tag
fn svg_subtree(text: &str) -> Result<Vec<Event<'_>>> {
    let mut reader = Reader::from_str(text);
    let mut events = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| GlobeError::AssetError(format!("Invalid SVG: {}", e)))?;
        match event {
            Event::Eof => break,
            Event::Start(ref e) if events.is_empty() => {
                if e.local_name().as_ref() == b"svg" {
                    depth = 1;
                    events.push(event);
                }
            }
            Event::Empty(ref e) if events.is_empty() => {
                if e.local_name().as_ref() == b"svg" {
                    events.push(event);
                    return Ok(events);
                }
            }
            _ if events.is_empty() => {}
            Event::Start(_) => {
                depth += 1;
                events.push(event);
            }
            Event::End(_) => {
                depth -= 1;
                events.push(event);
                if depth == 0 {
                    return Ok(events);
                }
            }
            _ => events.push(event),
        }
    }

    if events.is_empty() {
        Err(GlobeError::AssetError("No SVG element found in file".to_string()))
    } else {
        Err(GlobeError::AssetError("Invalid SVG: unclosed <svg> element".to_string()))
    }
}

/// Error text without the variant prefix
fn error_message(error: &GlobeError) -> String {
    match error {
        GlobeError::FetchError(m)
        | GlobeError::AssetError(m)
        | GlobeError::ParseError(m)
        | GlobeError::ConfigError(m) => m.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{FileSource, StaticSource};
    use std::io::Write;

    const DRONE: &str = r##"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 500 500" width="500">
  <defs><rect x="-1000" y="-1000" width="10" height="10" fill="red"/></defs>
  <rect x="100" y="120" width="50" height="30" stroke="#000" fill="#123456"/>
  <circle cx="300" cy="200" r="20" fill="none" stroke="black"/>
</svg>"##;

    fn loader() -> OutlineLoader {
        OutlineLoader::new().unwrap()
    }

    #[test]
    fn test_recolor_and_reframe() {
        let svg = loader().process(DRONE).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="90 110 240 120""#));
        assert!(svg.contains(r#"preserveAspectRatio="xMidYMid meet""#));
        assert!(svg.contains(r#"width="500""#));
        assert!(!svg.contains("#123456"));
        assert!(!svg.contains("#000"));
        assert!(svg.contains(r#"fill="none""#));
        assert!(svg.contains(r#"stroke="white""#));
        assert!(!svg.contains("<?xml"));
    }

    #[test]
    fn test_children_wrapped_in_group() {
        let svg = loader().process(DRONE).unwrap();
        let g = svg.find("<g>").unwrap();
        assert!(g < svg.find("<defs>").unwrap());
        assert!(svg.trim_end().ends_with("</g></svg>"));
    }

    #[test]
    fn test_empty_content_keeps_view_box() {
        let svg = loader()
            .process(r#"<svg viewBox="0 0 10 10"><line x1="0" y1="5" x2="10" y2="5"/></svg>"#)
            .unwrap();
        assert!(svg.contains(r#"viewBox="0 0 10 10""#));

        let svg = loader().process(r#"<svg/>"#).unwrap();
        assert_eq!(svg, r#"<svg preserveAspectRatio="xMidYMid meet"><g></g></svg>"#);
    }

    #[test]
    fn test_svg_nested_in_other_markup() {
        let svg = loader()
            .process(r#"<html><body><svg><path d="M0 0 L10 10"/></svg></body></html>"#)
            .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("body"));
    }

    #[test]
    fn test_path_bounds_cubic() {
        let mut bbox = BBox::empty();
        loader().path_bounds("M0,0 C0,10 10,10 10,0", &mut bbox);
        assert_eq!(bbox.min_x, 0.0);
        assert_eq!(bbox.max_x, 10.0);
        assert!((bbox.max_y - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_path_bounds_relative_and_implicit() {
        let mut bbox = BBox::empty();
        loader().path_bounds("m10 10 5 0 0 5h-20v-30z", &mut bbox);
        assert_eq!((bbox.min_x, bbox.min_y), (-5.0, -15.0));
        assert_eq!((bbox.max_x, bbox.max_y), (15.0, 15.0));
    }

    #[test]
    fn test_path_bounds_arc() {
        let mut bbox = BBox::empty();
        // Half circle of radius 10 bulging upwards
        loader().path_bounds("M0,10 A10,10 0 0 1 20,10", &mut bbox);
        assert!((bbox.min_y - 0.0).abs() < 0.1);
        assert_eq!(bbox.max_y, 10.0);
    }

    #[test]
    fn test_missing_svg_is_error() {
        let outline = loader().load(&StaticSource::new("<html><p>nope</p></html>"));
        assert_eq!(outline.to_string(), "Error: No SVG element found in file");
    }

    #[test]
    fn test_fetch_failure_is_error() {
        let outline = loader().load(&StaticSource::failing("Failed to fetch: 404"));
        assert!(outline.is_error());
        assert_eq!(outline.to_string(), "Error: Failed to fetch: 404");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DRONE.as_bytes()).unwrap();
        match loader().load(&FileSource::new(file.path())) {
            Outline::Graphic(svg) => assert!(svg.contains(r#"viewBox="90 110 240 120""#)),
            Outline::Error(e) => panic!("Expected graphic, got error: {}", e),
        }
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let outline = loader().load(&StaticSource::new("<svg><g></svg>"));
        assert!(outline.is_error());
    }

    #[test]
    fn test_custom_color() {
        let svg = loader()
            .with_color("#ff0000")
            .unwrap()
            .process(r#"<svg><path d="M0 0L1 1" stroke="blue"/></svg>"#)
            .unwrap();
        assert!(svg.contains("stroke=\"#ff0000\""));
        assert!(loader().with_color("definitely not a color").is_err());
    }
}
