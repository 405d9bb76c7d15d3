//! Clipping against the visible hemisphere
//!
//! The clip boundary is the horizon, the great circle `x = 0` in view space.
//! Lines are cut where they cross it. Polygon rings are cut the same way and
//! every hidden stretch between an exit and the next entry is replaced by a
//! horizon arc turning through the same angle around the view axis, which
//! keeps the winding of every visible point unchanged.
//!
//! A ring's winding around the view axis, as seen by the viewer, is +1 when
//! the hidden pole (the point opposite the viewer) is on its inside, -1 when
//! the view center is, and 0 otherwise; exterior rings wind clockwise and holes
//! counterclockwise. Summed over the rings of a polygon this gives +1 exactly
//! when the polygon holds the hidden pole, since no polygon other than the
//! full-extent one holds a pair of antipodal points. Such a polygon gets one
//! reversed horizon circle; with nonzero filling that turns "inside" into
//! "outside" on the visible disk. A fully hidden ring draws nothing but still
//! shifts the winding of every visible point by its own winding, which is
//! made up with horizon circles as well.

use std::f64::consts::{PI, TAU};

use super::{normalize, Vec3};

/// Angular spacing of generated horizon points, in radians
const HORIZON_STEP: f64 = 2.0 * PI / 180.0;

fn visible(v: &Vec3) -> bool {
    v[0] > 0.0
}

/// Angle of a view vector around the view axis, counterclockwise from the right
fn horizon_angle(v: &Vec3) -> f64 {
    v[2].atan2(v[1])
}

/// Signed turn from `a` to `b` around the view axis, in (-π, π]
fn turn(a: &Vec3, b: &Vec3) -> f64 {
    let mut d = horizon_angle(b) - horizon_angle(a);
    if d > PI {
        d -= TAU;
    } else if d <= -PI {
        d += TAU;
    }
    d
}

/// Where the great-circle arc from `a` to `b` meets the horizon
///
/// Only meaningful when exactly one of the two is visible.
fn intersect(a: &Vec3, b: &Vec3) -> Vec3 {
    let t = a[0] / (a[0] - b[0]);
    let p = [
        0.0,
        a[1] + t * (b[1] - a[1]),
        a[2] + t * (b[2] - a[2]),
    ];
    normalize(p)
}

fn horizon_point(angle: f64) -> Vec3 {
    [0.0, angle.cos(), angle.sin()]
}

/// Horizon points strictly between `start` and `start + sweep`
fn horizon_arc(start: f64, sweep: f64) -> Vec<Vec3> {
    let steps = (sweep.abs() / HORIZON_STEP - 1e-9).ceil().max(0.0) as usize;
    (1..steps)
        .map(|i| horizon_point(start + sweep * i as f64 / steps as f64))
        .collect()
}

/// The full horizon as a closed ring, turning in the sign of `direction`
pub(super) fn horizon_circle(direction: f64) -> Vec<Vec3> {
    let sweep = TAU.copysign(direction);
    let mut ring = vec![horizon_point(0.0)];
    ring.extend(horizon_arc(0.0, sweep));
    ring
}

/// Split a line into its visible runs
pub(super) fn clip_line(points: &[Vec3]) -> Vec<Vec<Vec3>> {
    let mut runs = Vec::new();
    let mut current: Vec<Vec3> = Vec::new();

    if let Some(first) = points.first() {
        if visible(first) {
            current.push(*first);
        }
    }

    for pair in points.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        match (visible(a), visible(b)) {
            (true, true) => current.push(*b),
            (true, false) => {
                current.push(intersect(a, b));
                runs.push(std::mem::take(&mut current));
            }
            (false, true) => {
                current = vec![intersect(a, b), *b];
            }
            (false, false) => {}
        }
    }

    if current.len() > 1 {
        runs.push(current);
    }
    runs.retain(|run| run.len() > 1);
    runs
}

/// A visible stretch of a ring and the hidden turn that precedes it
struct Stretch {
    points: Vec<Vec3>,
    turn_before: f64,
}

/// Clip the rings of one polygon (closing points removed) into closed curves
pub(super) fn clip_polygon(rings: &[Vec<Vec3>]) -> Vec<Vec<Vec3>> {
    let mut curves = Vec::new();
    let mut total_winding = 0;
    let mut hidden_winding = 0;

    for ring in rings.iter().filter(|r| r.len() >= 3) {
        let winding = winding_number(ring);
        total_winding += winding;
        let curve = match ring.iter().position(|p| !visible(p)) {
            None => Some(ring.clone()),
            Some(start) => rejoin(ring, start),
        };
        match curve {
            Some(curve) => curves.push(curve),
            None => hidden_winding += winding,
        }
    }

    let holds_hidden_pole = i32::from(total_winding > 0);
    let offset = hidden_winding - holds_hidden_pole;
    for _ in 0..offset.unsigned_abs() {
        curves.push(horizon_circle(f64::from(offset)));
    }
    curves
}

fn winding_number(ring: &[Vec3]) -> i32 {
    let n = ring.len();
    let total: f64 = (0..n).map(|i| turn(&ring[i], &ring[(i + 1) % n])).sum();
    (total / TAU).round() as i32
}

/// Walk the ring from a hidden point and stitch the visible stretches
/// together with horizon arcs. `None` when nothing is visible.
fn rejoin(ring: &[Vec3], start: usize) -> Option<Vec<Vec3>> {
    let n = ring.len();
    let mut stretches: Vec<Stretch> = Vec::new();
    let mut current: Vec<Vec3> = Vec::new();
    let mut hidden_turn = 0.0;
    let mut pending_turn = 0.0;

    for k in 0..n {
        let a = &ring[(start + k) % n];
        let b = &ring[(start + k + 1) % n];
        match (visible(a), visible(b)) {
            (false, false) => hidden_turn += turn(a, b),
            (false, true) => {
                let entry = intersect(a, b);
                pending_turn = hidden_turn + turn(a, &entry);
                hidden_turn = 0.0;
                current = vec![entry, *b];
            }
            (true, true) => current.push(*b),
            (true, false) => {
                let exit = intersect(a, b);
                current.push(exit);
                stretches.push(Stretch {
                    points: std::mem::take(&mut current),
                    turn_before: pending_turn,
                });
                hidden_turn = turn(&exit, b);
            }
        }
    }

    if stretches.is_empty() {
        return None;
    }

    // The walk started mid-way through the hidden stretch before the first
    // visible one; its two halves belong together.
    stretches[0].turn_before += hidden_turn;

    let mut curve = Vec::new();
    let m = stretches.len();
    for i in 0..m {
        let exit = stretches[(i + m - 1) % m].points.last().copied()?;
        curve.extend(horizon_arc(horizon_angle(&exit), stretches[i].turn_before));
        curve.extend_from_slice(&stretches[i].points);
    }
    Some(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::cartesian;

    fn view(lon: f64, lat: f64) -> Vec3 {
        cartesian(lon.to_radians(), lat.to_radians())
    }

    fn ring(points: &[(f64, f64)]) -> Vec<Vec3> {
        points.iter().map(|&(lon, lat)| view(lon, lat)).collect()
    }

    /// Axis-aligned box, clockwise as seen from outside
    fn square(lon: f64, lat: f64, half: f64) -> Vec<Vec3> {
        ring(&[
            (lon - half, lat - half),
            (lon - half, lat + half),
            (lon + half, lat + half),
            (lon + half, lat - half),
        ])
    }

    fn hole(lon: f64, lat: f64, half: f64) -> Vec<Vec3> {
        let mut r = square(lon, lat, half);
        r.reverse();
        r
    }

    fn clip_ring(r: &[Vec3]) -> Vec<Vec<Vec3>> {
        clip_polygon(&[r.to_vec()])
    }

    #[test]
    fn test_intersection_lies_on_horizon() {
        let a = view(60.0, 10.0);
        let b = view(120.0, 20.0);
        let p = intersect(&a, &b);
        assert_eq!(p[0], 0.0);
        let len = (p[1] * p[1] + p[2] * p[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_line_fully_visible() {
        let line = ring(&[(0.0, 0.0), (10.0, 0.0), (20.0, 5.0)]);
        let runs = clip_line(&line);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 3);
    }

    #[test]
    fn test_line_crossing_horizon_twice() {
        // Visible, hidden, visible again
        let line = ring(&[(80.0, 0.0), (100.0, 0.0), (170.0, 0.0), (-100.0, 0.0), (-80.0, 0.0)]);
        let runs = clip_line(&line);
        assert_eq!(runs.len(), 2);
        assert!(runs[0].last().unwrap()[0].abs() < 1e-12);
        assert!(runs[1][0][0].abs() < 1e-12);
    }

    #[test]
    fn test_line_fully_hidden() {
        let line = ring(&[(120.0, 0.0), (150.0, 10.0)]);
        assert!(clip_line(&line).is_empty());
    }

    #[test]
    fn test_small_ring_visible_kept() {
        // Clockwise as seen from outside: no hidden-pole circle
        let r = ring(&[(20.0, 0.0), (20.0, 10.0), (30.0, 10.0), (30.0, 0.0)]);
        let curves = clip_ring(&r);
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].len(), 4);
    }

    #[test]
    fn test_small_ring_hidden_dropped() {
        let r = ring(&[(150.0, 5.0), (150.0, 15.0), (160.0, 15.0), (160.0, 5.0)]);
        assert!(clip_ring(&r).is_empty());
    }

    #[test]
    fn test_ring_across_horizon_is_closed_on_horizon() {
        let r = ring(&[(80.0, -10.0), (80.0, 10.0), (100.0, 10.0), (100.0, -10.0)]);
        let curves = clip_ring(&r);
        assert_eq!(curves.len(), 1);
        let curve = &curves[0];
        assert!(curve.iter().all(|p| p[0] >= -1e-12));
        let on_horizon = curve.iter().filter(|p| p[0].abs() < 1e-12).count();
        assert!(on_horizon >= 2);
    }

    #[test]
    fn test_ring_around_hidden_pole_contributes_nothing_visible() {
        // Clockwise around the far pole as seen from outside there, which is
        // counterclockwise as seen by the viewer.
        let r = ring(&[(170.0, 0.0), (180.0, 10.0), (-170.0, 0.0), (180.0, -10.0)]);
        assert_eq!(winding_number(&r), 1);
        assert!(clip_ring(&r).is_empty());
    }

    #[test]
    fn test_reversed_ring_around_hidden_pole_covers_disk() {
        let r = ring(&[(180.0, -10.0), (-170.0, 0.0), (180.0, 10.0), (170.0, 0.0)]);
        assert_eq!(winding_number(&r), -1);
        let curves = clip_ring(&r);
        assert_eq!(curves.len(), 1);
        assert_eq!(winding_number(&curves[0]), -1);
    }

    #[test]
    fn test_counterclockwise_visible_ring_gets_reversed_circle() {
        let r = ring(&[(-10.0, -10.0), (10.0, -10.0), (10.0, 10.0), (-10.0, 10.0)]);
        assert_eq!(winding_number(&r), 1);
        let curves = clip_ring(&r);
        assert_eq!(curves.len(), 2);
        assert_eq!(winding_number(&curves[1]), -1);
    }

    #[test]
    fn test_horizon_circle_direction() {
        let ccw = horizon_circle(1.0);
        let cw = horizon_circle(-1.0);
        assert_eq!(winding_number(&ccw), 1);
        assert_eq!(winding_number(&cw), -1);
    }

    #[test]
    fn test_hole_around_hidden_pole_draws_nothing() {
        // Exterior and hole both behind the globe, centered on the hidden pole
        let exterior = square(180.0, 0.0, 30.0);
        let inner = hole(180.0, 0.0, 5.0);
        assert_eq!(winding_number(&exterior), 1);
        assert_eq!(winding_number(&inner), -1);
        assert!(clip_polygon(&[exterior.clone()]).is_empty());
        assert!(clip_polygon(&[exterior, inner]).is_empty());
    }

    #[test]
    fn test_hole_around_view_center_adds_no_circle() {
        let curves = clip_polygon(&[square(0.0, 0.0, 20.0), hole(0.0, 0.0, 5.0)]);
        assert_eq!(curves.len(), 2);
        assert_eq!(winding_number(&curves[0]), -1);
        assert_eq!(winding_number(&curves[1]), 1);
    }

    #[test]
    fn test_exterior_around_hidden_pole_with_hidden_hole() {
        // The exterior stays on the visible side but winds around the hidden
        // pole; the hole covers the pole, so the polygon does not hold it and
        // only the hidden hole's winding is made up for.
        let exterior = ring(&[(80.0, -60.0), (80.0, 60.0), (280.0, 60.0), (280.0, -60.0)]);
        let inner = hole(180.0, 0.0, 5.0);
        let curves = clip_polygon(&[exterior.clone(), inner]);
        assert_eq!(winding_number(&exterior), 1);
        assert_eq!(curves.len(), 2);
        assert_eq!(winding_number(&curves[1]), -1);
        assert!(curves[0].iter().all(|p| p[0] >= -1e-12));
    }
}
