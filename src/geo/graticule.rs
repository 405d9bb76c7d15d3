//! Graticule generator
//!
//! Produces the latitude/longitude reference grid as a set of line strings.
//! Defaults reproduce the usual d3 graticule: minor lines every 10° between
//! ±80° latitude, major meridians every 90° running pole to pole, and the
//! equator.

use super::{Geometry, LonLat};

const EPSILON: f64 = 1e-6;

/// Longitude/latitude extent as `[[lon0, lat0], [lon1, lat1]]`
pub type Extent = [[f64; 2]; 2];

#[derive(Debug, Clone, PartialEq)]
pub struct Graticule {
    major_extent: Extent,
    minor_extent: Extent,
    major_step: [f64; 2],
    minor_step: [f64; 2],
    precision: f64,
}

impl Default for Graticule {
    fn default() -> Self {
        Self {
            major_extent: [[-180.0, -90.0 + EPSILON], [180.0, 90.0 - EPSILON]],
            minor_extent: [[-180.0, -80.0 - EPSILON], [180.0, 80.0 + EPSILON]],
            major_step: [90.0, 360.0],
            minor_step: [10.0, 10.0],
            precision: 2.5,
        }
    }
}

impl Graticule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spacing of the minor grid lines in degrees
    pub fn with_step(mut self, lon: f64, lat: f64) -> Self {
        self.minor_step = [lon, lat];
        self
    }

    /// Sampling interval along each line, in degrees
    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    /// All grid lines, major lines first
    pub fn lines(&self) -> Vec<Vec<LonLat>> {
        let [[big_x0, big_y0], [big_x1, big_y1]] = self.major_extent;
        let [[x0, y0], [x1, y1]] = self.minor_extent;
        let [big_dx, big_dy] = self.major_step;
        let [dx, dy] = self.minor_step;

        let mut lines = Vec::new();

        for x in stepped((big_x0 / big_dx).ceil() * big_dx, big_x1, big_dx) {
            lines.push(self.meridian(x, big_y0, big_y1));
        }
        for y in stepped((big_y0 / big_dy).ceil() * big_dy, big_y1, big_dy) {
            lines.push(self.parallel(y, big_x0, big_x1));
        }
        for x in stepped((x0 / dx).ceil() * dx, x1, dx) {
            if (x % big_dx).abs() > EPSILON {
                lines.push(self.meridian(x, y0, y1));
            }
        }
        for y in stepped((y0 / dy).ceil() * dy, y1, dy) {
            if (y % big_dy).abs() > EPSILON {
                lines.push(self.parallel(y, x0, x1));
            }
        }

        lines
    }

    /// The grid as a single MultiLineString geometry
    pub fn geometry(&self) -> Geometry {
        Geometry::MultiLineString(self.lines())
    }

    fn meridian(&self, lon: f64, lat0: f64, lat1: f64) -> Vec<LonLat> {
        let mut points: Vec<LonLat> = stepped(lat0, lat1 - EPSILON, self.precision)
            .map(|lat| LonLat::new(lon, lat))
            .collect();
        points.push(LonLat::new(lon, lat1));
        points
    }

    fn parallel(&self, lat: f64, lon0: f64, lon1: f64) -> Vec<LonLat> {
        let mut points: Vec<LonLat> = stepped(lon0, lon1 - EPSILON, self.precision)
            .map(|lon| LonLat::new(lon, lat))
            .collect();
        points.push(LonLat::new(lon1, lat));
        points
    }
}

/// `start, start + step, ...` strictly below `stop`
fn stepped(start: f64, stop: f64, step: f64) -> impl Iterator<Item = f64> {
    let count = if step > 0.0 {
        ((stop - start) / step).ceil().max(0.0) as usize
    } else {
        0
    };
    (0..count).map(move |i| start + i as f64 * step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_line_count() {
        // 4 major meridians + equator + 32 minor meridians + 16 minor parallels
        let lines = Graticule::new().lines();
        assert_eq!(lines.len(), 4 + 1 + 32 + 16);
    }

    #[test]
    fn test_major_meridian_spans_poles() {
        let lines = Graticule::new().lines();
        let first = &lines[0];
        assert_eq!(first[0].lon, -180.0);
        assert!(first[0].lat < -89.9);
        assert!(first.last().unwrap().lat > 89.9);
    }

    #[test]
    fn test_minor_parallels_skip_equator() {
        let lines = Graticule::new().lines();
        let equators = lines
            .iter()
            .filter(|line| line.iter().all(|p| p.lat == 0.0))
            .count();
        assert_eq!(equators, 1);

        let has_80 = lines
            .iter()
            .any(|line| line.iter().all(|p| (p.lat - 80.0).abs() < 1e-9));
        assert!(has_80);
    }

    #[test]
    fn test_precision_controls_sampling() {
        let coarse = Graticule::new().with_precision(10.0).lines();
        let fine = Graticule::new().lines();
        assert!(coarse[0].len() < fine[0].len());
    }

    #[test]
    fn test_stepped_excludes_stop() {
        let values: Vec<f64> = stepped(-180.0, 180.0, 90.0).collect();
        assert_eq!(values, vec![-180.0, -90.0, 0.0, 90.0]);
    }
}
