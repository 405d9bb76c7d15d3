//! Path generation
//!
//! Turns geometries into SVG path data under an [`Orthographic`] projection.
//! The projection streams screen-space drawing commands into a [`PathSink`];
//! [`PathString`] serializes them and [`PathBounds`] measures them.
//!
//! # Example
//!
//! ```rust,ignore
//! use globeview::path::PathGenerator;
//! use globeview::projection::{Orthographic, Rotation};
//!
//! let projection = Orthographic::new()
//!     .with_scale(200.0)
//!     .with_translate(400.0, 250.0)
//!     .with_rotation(Rotation::new(0.0, -30.0));
//! let d = PathGenerator::new(projection).path(&Geometry::Sphere);
//! assert!(is_drawable(&d));
//! ```

use std::fmt::Write as _;

use crate::geo::Geometry;
use crate::projection::Orthographic;

/// Receiver of screen-space drawing commands
pub trait PathSink {
    fn move_to(&mut self, x: f64, y: f64);

    fn line_to(&mut self, x: f64, y: f64);

    fn close_path(&mut self);

    /// A point geometry, drawn as a circle of `radius` pixels
    fn point(&mut self, x: f64, y: f64, radius: f64);
}

/// Decimal places kept in path data
const DIGITS: i32 = 3;

fn round(value: f64) -> f64 {
    let factor = 10f64.powi(DIGITS);
    let rounded = (value * factor).round() / factor;
    // Avoid "-0" in the output
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// SVG path data builder, in the compact `M1,2L3,4Z` form
#[derive(Debug, Default, Clone)]
pub struct PathString {
    buffer: String,
}

impl PathString {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(&mut self, op: char, x: f64, y: f64) {
        let _ = write!(self.buffer, "{}{},{}", op, round(x), round(y));
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

impl PathSink for PathString {
    fn move_to(&mut self, x: f64, y: f64) {
        self.command('M', x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.command('L', x, y);
    }

    fn close_path(&mut self) {
        self.buffer.push('Z');
    }

    fn point(&mut self, x: f64, y: f64, radius: f64) {
        self.command('M', x, y);
        let r = round(radius);
        let _ = write!(
            self.buffer,
            "m0,{r}a{r},{r} 0 1,1 0,{}a{r},{r} 0 1,1 0,{}z",
            round(-2.0 * radius),
            round(2.0 * radius),
        );
    }
}

/// Screen-space bounding box of everything streamed into it
#[derive(Debug, Clone)]
pub struct PathBounds {
    min: (f64, f64),
    max: (f64, f64),
}

impl Default for PathBounds {
    fn default() -> Self {
        Self {
            min: (f64::INFINITY, f64::INFINITY),
            max: (f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }
}

impl PathBounds {
    pub fn new() -> Self {
        Self::default()
    }

    fn extend(&mut self, x: f64, y: f64) {
        self.min = (self.min.0.min(x), self.min.1.min(y));
        self.max = (self.max.0.max(x), self.max.1.max(y));
    }

    /// `[[x0, y0], [x1, y1]]`, or `None` if nothing was drawn
    pub fn finish(self) -> Option<[[f64; 2]; 2]> {
        if self.min.0 > self.max.0 || self.min.1 > self.max.1 {
            return None;
        }
        Some([[self.min.0, self.min.1], [self.max.0, self.max.1]])
    }
}

impl PathSink for PathBounds {
    fn move_to(&mut self, x: f64, y: f64) {
        self.extend(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.extend(x, y);
    }

    fn close_path(&mut self) {}

    fn point(&mut self, x: f64, y: f64, radius: f64) {
        self.extend(x - radius, y - radius);
        self.extend(x + radius, y + radius);
    }
}

/// Geometry to path-data conversion under a fixed projection
#[derive(Debug, Clone)]
pub struct PathGenerator {
    projection: Orthographic,
}

impl PathGenerator {
    pub fn new(projection: Orthographic) -> Self {
        Self { projection }
    }

    pub fn projection(&self) -> &Orthographic {
        &self.projection
    }

    /// Path data for a geometry; empty when nothing is visible
    pub fn path(&self, geometry: &Geometry) -> String {
        let mut sink = PathString::new();
        self.projection.stream(geometry, &mut sink);
        sink.finish()
    }

    pub fn bounds(&self, geometry: &Geometry) -> Option<[[f64; 2]; 2]> {
        let mut sink = PathBounds::new();
        self.projection.stream(geometry, &mut sink);
        sink.finish()
    }
}

/// Whether path data is non-empty and free of non-finite numbers
pub fn is_drawable(d: &str) -> bool {
    !d.is_empty() && !d.contains("NaN") && !d.contains("inf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LonLat;
    use crate::projection::Rotation;

    fn generator(rotation: Rotation) -> PathGenerator {
        PathGenerator::new(
            Orthographic::new()
                .with_scale(200.0)
                .with_translate(400.0, 250.0)
                .with_rotation(rotation),
        )
    }

    #[test]
    fn test_path_string_format() {
        let mut sink = PathString::new();
        sink.move_to(1.0, 2.5);
        sink.line_to(3.14159, -0.0001);
        sink.close_path();
        assert_eq!(sink.finish(), "M1,2.5L3.142,0Z");
    }

    #[test]
    fn test_point_is_circle() {
        let mut sink = PathString::new();
        sink.point(10.0, 20.0, 4.5);
        assert_eq!(
            sink.finish(),
            "M10,20m0,4.5a4.5,4.5 0 1,1 0,-9a4.5,4.5 0 1,1 0,9z"
        );
    }

    #[test]
    fn test_sphere_bounds_match_disk() {
        let bounds = generator(Rotation::new(0.0, -30.0))
            .bounds(&Geometry::Sphere)
            .unwrap();
        assert!((bounds[0][0] - 200.0).abs() < 1e-6);
        assert!((bounds[0][1] - 50.0).abs() < 1e-6);
        assert!((bounds[1][0] - 600.0).abs() < 1e-6);
        assert!((bounds[1][1] - 450.0).abs() < 1e-6);
    }

    #[test]
    fn test_hidden_point_has_empty_path() {
        let g = generator(Rotation::new(0.0, 0.0));
        assert_eq!(g.path(&Geometry::Point(LonLat::new(180.0, 0.0))), "");
        assert!(g.path(&Geometry::Point(LonLat::new(0.0, 0.0))).starts_with("M400,250"));
    }

    #[test]
    fn test_non_finite_coordinates_are_not_drawable() {
        let g = generator(Rotation::new(0.0, 0.0));
        let line = Geometry::LineString(vec![LonLat::new(0.0, 0.0), LonLat::new(f64::NAN, 10.0)]);
        assert!(!is_drawable(&g.path(&line)));
        assert!(!is_drawable(""));
        assert!(!is_drawable("M1,2LNaN,3"));
        assert!(!is_drawable("Minf,2"));
        assert!(is_drawable("M1,2L3,4"));
    }

    #[test]
    fn test_polygon_path_is_closed() {
        let ring = vec![
            LonLat::new(5.0, 5.0),
            LonLat::new(5.0, 15.0),
            LonLat::new(15.0, 15.0),
            LonLat::new(15.0, 5.0),
            LonLat::new(5.0, 5.0),
        ];
        let d = generator(Rotation::new(0.0, 0.0)).path(&Geometry::Polygon(vec![ring]));
        assert!(d.starts_with('M'));
        assert!(d.ends_with('Z'));
        assert_eq!(d.matches('M').count(), 1);
    }
}
