//! Orthographic globe projection
//!
//! The projection works in three spaces:
//!
//! - geographic: longitude/latitude degrees ([`LonLat`])
//! - view: unit vectors after rotation, `x` pointing at the viewer, `y` to the
//!   right and `z` up; the visible hemisphere is `x > 0`
//! - screen: canvas pixels, `y` growing downwards
//!
//! Geometry is rotated into view space, clipped against the visible
//! hemisphere ([`clip`]), resampled along great circles ([`resample`]) and
//! finally emitted to a [`PathSink`](crate::path::PathSink).

mod clip;
mod resample;

use serde::{Deserialize, Serialize};

use crate::geo::{Geometry, LonLat};
use crate::path::PathSink;

/// Radius of the circle drawn for point geometries
pub const POINT_RADIUS: f64 = 4.5;

pub(crate) type Vec3 = [f64; 3];

pub(crate) fn cartesian(lambda: f64, phi: f64) -> Vec3 {
    let cos_phi = phi.cos();
    [cos_phi * lambda.cos(), cos_phi * lambda.sin(), phi.sin()]
}

pub(crate) fn normalize(v: Vec3) -> Vec3 {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / len, v[1] / len, v[2] / len]
}

/// Wrap a longitude in degrees to [-180, 180]
fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// Rotation of the globe, in degrees
///
/// Follows the d3 convention: longitude is added to every point before the
/// latitude tilt, so the point facing the viewer is `(-longitude, -latitude)`.
/// Serialized as a `[longitude, latitude]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Rotation {
    pub longitude: f64,
    pub latitude: f64,
}

impl Rotation {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Advance the longitude by `step` degrees, wrapping into [0, 360)
    pub fn advanced(self, step: f64) -> Self {
        let mut longitude = (self.longitude + step).rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if longitude >= 360.0 {
            longitude = 0.0;
        }
        Self {
            longitude,
            latitude: self.latitude,
        }
    }

    /// The geographic point at the center of the visible hemisphere
    pub fn facing(&self) -> LonLat {
        LonLat::new(wrap_longitude(-self.longitude), -self.latitude)
    }
}

impl From<[f64; 2]> for Rotation {
    fn from(r: [f64; 2]) -> Self {
        Self::new(r[0], r[1])
    }
}

impl From<Rotation> for [f64; 2] {
    fn from(r: Rotation) -> Self {
        [r.longitude, r.latitude]
    }
}

/// Orthographic projection with hemisphere clipping
#[derive(Debug, Clone)]
pub struct Orthographic {
    scale: f64,
    translate: (f64, f64),
    rotation: Rotation,
    precision: f64,
    delta_lambda: f64,
    cos_phi: f64,
    sin_phi: f64,
}

impl Default for Orthographic {
    fn default() -> Self {
        Self::new()
    }
}

impl Orthographic {
    /// Unit sphere at the origin with no rotation
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            translate: (0.0, 0.0),
            rotation: Rotation::new(0.0, 0.0),
            precision: 0.1,
            delta_lambda: 0.0,
            cos_phi: 1.0,
            sin_phi: 0.0,
        }
    }

    /// Globe radius in pixels
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Screen position of the globe center
    pub fn with_translate(mut self, x: f64, y: f64) -> Self {
        self.translate = (x, y);
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self.delta_lambda = rotation.longitude.to_radians();
        let (sin_phi, cos_phi) = rotation.latitude.to_radians().sin_cos();
        self.sin_phi = sin_phi;
        self.cos_phi = cos_phi;
        self
    }

    /// Maximum distance in pixels between a projected great-circle arc and
    /// the straight segments drawn for it. Zero disables resampling.
    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> (f64, f64) {
        self.translate
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// Rotate a geographic point into view space
    pub(crate) fn to_view(&self, p: LonLat) -> Vec3 {
        let v = cartesian(p.lon.to_radians() + self.delta_lambda, p.lat.to_radians());
        [
            v[0] * self.cos_phi - v[2] * self.sin_phi,
            v[1],
            v[2] * self.cos_phi + v[0] * self.sin_phi,
        ]
    }

    /// Undo [`to_view`](Self::to_view)
    pub(crate) fn from_view(&self, v: Vec3) -> LonLat {
        let x = v[0] * self.cos_phi + v[2] * self.sin_phi;
        let z = v[2] * self.cos_phi - v[0] * self.sin_phi;
        let lambda = v[1].atan2(x) - self.delta_lambda;
        let phi = z.clamp(-1.0, 1.0).asin();
        LonLat::new(
            wrap_longitude(lambda.to_degrees().rem_euclid(360.0)),
            phi.to_degrees(),
        )
    }

    pub(crate) fn view_to_screen(&self, v: Vec3) -> (f64, f64) {
        (
            self.translate.0 + self.scale * v[1],
            self.translate.1 - self.scale * v[2],
        )
    }

    /// Project a point to screen coordinates
    ///
    /// Points on the far hemisphere project too (onto the disk, mirrored
    /// through the front); use [`is_visible`](Self::is_visible) to tell them
    /// apart.
    pub fn project(&self, p: LonLat) -> (f64, f64) {
        self.view_to_screen(self.to_view(p))
    }

    /// Whether a point lies on the hemisphere facing the viewer
    pub fn is_visible(&self, p: LonLat) -> bool {
        self.to_view(p)[0] > 0.0
    }

    /// Geographic point under a screen position, `None` outside the globe disk
    pub fn invert(&self, x: f64, y: f64) -> Option<LonLat> {
        let vy = (x - self.translate.0) / self.scale;
        let vz = (self.translate.1 - y) / self.scale;
        let r2 = vy * vy + vz * vz;
        if !r2.is_finite() || r2 > 1.0 {
            return None;
        }
        let vx = (1.0 - r2).sqrt();
        Some(self.from_view([vx, vy, vz]))
    }

    /// The point under the globe center
    pub fn facing(&self) -> Option<LonLat> {
        self.invert(self.translate.0, self.translate.1)
    }

    /// Clip, resample and emit a geometry
    pub fn stream(&self, geometry: &Geometry, sink: &mut dyn PathSink) {
        if geometry.spans_full_extent() {
            self.stream_sphere(sink);
            return;
        }

        match geometry {
            Geometry::Point(p) => self.stream_point(*p, sink),
            Geometry::MultiPoint(points) => {
                for p in points {
                    self.stream_point(*p, sink);
                }
            }
            Geometry::LineString(line) => self.stream_line(line, sink),
            Geometry::MultiLineString(lines) => {
                for line in lines {
                    self.stream_line(line, sink);
                }
            }
            Geometry::Polygon(rings) => self.stream_polygon(rings, sink),
            Geometry::MultiPolygon(polygons) => {
                for rings in polygons {
                    self.stream_polygon(rings, sink);
                }
            }
            Geometry::Sphere => self.stream_sphere(sink),
        }
    }

    fn stream_point(&self, p: LonLat, sink: &mut dyn PathSink) {
        let v = self.to_view(p);
        if v[0] > 0.0 {
            let (x, y) = self.view_to_screen(v);
            sink.point(x, y, POINT_RADIUS);
        }
    }

    fn stream_line(&self, line: &[LonLat], sink: &mut dyn PathSink) {
        let view: Vec<Vec3> = line.iter().map(|p| self.to_view(*p)).collect();
        for run in clip::clip_line(&view) {
            resample::stream_open(&run, self, sink);
        }
    }

    fn stream_polygon(&self, rings: &[Vec<LonLat>], sink: &mut dyn PathSink) {
        let view: Vec<Vec<Vec3>> = rings
            .iter()
            .map(|ring| {
                let mut view: Vec<Vec3> = ring.iter().map(|p| self.to_view(*p)).collect();
                if view.len() > 1 && view.first() == view.last() {
                    view.pop();
                }
                view
            })
            .collect();
        for curve in clip::clip_polygon(&view) {
            resample::stream_closed(&curve, self, sink);
        }
    }

    fn stream_sphere(&self, sink: &mut dyn PathSink) {
        let circle = clip::horizon_circle(-1.0);
        resample::stream_closed(&circle, self, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn globe(rotation: Rotation) -> Orthographic {
        Orthographic::new()
            .with_scale(200.0)
            .with_translate(400.0, 250.0)
            .with_rotation(rotation)
    }

    #[test]
    fn test_facing_point_projects_to_center() {
        let rotation = Rotation::new(40.0, -30.0);
        let projection = globe(rotation);
        let (x, y) = projection.project(rotation.facing());
        assert!((x - 400.0).abs() < 1e-9);
        assert!((y - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_facing_matches_inverse_at_center() {
        let rotation = Rotation::new(123.4, -30.0);
        let facing = globe(rotation).facing().unwrap();
        let expected = rotation.facing();
        assert!((facing.lon - expected.lon).abs() < 1e-9);
        assert!((facing.lat - expected.lat).abs() < 1e-9);
    }

    #[test]
    fn test_north_pole_is_above_center() {
        let projection = globe(Rotation::new(0.0, 0.0));
        let (x, y) = projection.project(LonLat::new(0.0, 90.0));
        assert!((x - 400.0).abs() < 1e-9);
        assert!((y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_east_is_right() {
        let projection = globe(Rotation::new(0.0, 0.0));
        let (x, _) = projection.project(LonLat::new(30.0, 0.0));
        assert!(x > 400.0);
    }

    #[test]
    fn test_visibility() {
        let projection = globe(Rotation::new(0.0, -30.0));
        assert!(projection.is_visible(LonLat::new(0.0, 30.0)));
        assert!(!projection.is_visible(LonLat::new(180.0, -30.0)));
    }

    #[test]
    fn test_invert_outside_disk() {
        let projection = globe(Rotation::new(0.0, 0.0));
        assert!(projection.invert(0.0, 0.0).is_none());
        assert!(projection.invert(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_rotation_wraps() {
        let r = Rotation::new(359.9, -30.0).advanced(0.2);
        assert!((r.longitude - 0.1).abs() < 1e-9);
        assert_eq!(r.latitude, -30.0);

        let r = Rotation::new(-1e-20, 0.0).advanced(0.0);
        assert!(r.longitude < 360.0);
    }

    proptest! {
        #[test]
        fn prop_invert_roundtrips_visible_points(
            lon in -179.0f64..179.0,
            lat in -80.0f64..80.0,
            rot_lon in 0.0f64..360.0,
            rot_lat in -60.0f64..60.0,
        ) {
            let projection = globe(Rotation::new(rot_lon, rot_lat));
            let p = LonLat::new(lon, lat);
            prop_assume!(projection.to_view(p)[0] > 0.05);
            let (x, y) = projection.project(p);
            let back = projection.invert(x, y).unwrap();
            prop_assert!(crate::geo::geo_distance(p, back) < 1e-7);
        }

        #[test]
        fn prop_projection_stays_on_disk(lon in -180.0f64..180.0, lat in -90.0f64..90.0) {
            let projection = globe(Rotation::new(0.0, -30.0));
            let (x, y) = projection.project(LonLat::new(lon, lat));
            let r = ((x - 400.0).powi(2) + (y - 250.0).powi(2)).sqrt();
            prop_assert!(r <= 200.0 + 1e-9);
        }
    }
}
