//! Adaptive great-circle resampling
//!
//! An edge between two view-space points is a great-circle arc, which
//! projects to a curve. Edges are split at their spherical midpoint until
//! the straight segment is within `precision` pixels of the curve.

use super::{Orthographic, Vec3};
use crate::path::PathSink;

const MAX_DEPTH: u32 = 16;

/// cos(30°): arcs longer than this are always split
const COS_MIN_DISTANCE: f64 = 0.866_025_403_784_438_6;

type Screen = (f64, f64);

/// Emit an open polyline
pub(super) fn stream_open(points: &[Vec3], projection: &Orthographic, sink: &mut dyn PathSink) {
    let Some(first) = points.first() else {
        return;
    };
    let mut prev = (*first, projection.view_to_screen(*first));
    sink.move_to(prev.1 .0, prev.1 .1);

    for p in &points[1..] {
        let next = (*p, projection.view_to_screen(*p));
        line_to(prev, next, projection, sink);
        prev = next;
    }
}

/// Emit a closed ring; the closing edge back to the first point is resampled too
pub(super) fn stream_closed(points: &[Vec3], projection: &Orthographic, sink: &mut dyn PathSink) {
    let Some(first) = points.first() else {
        return;
    };
    let start = (*first, projection.view_to_screen(*first));
    sink.move_to(start.1 .0, start.1 .1);

    let mut prev = start;
    for p in &points[1..] {
        let next = (*p, projection.view_to_screen(*p));
        line_to(prev, next, projection, sink);
        prev = next;
    }

    let mut closing = Vec::new();
    subdivide(prev, start, projection, MAX_DEPTH, &mut closing);
    for (x, y) in closing {
        sink.line_to(x, y);
    }
    sink.close_path();
}

fn line_to(
    a: (Vec3, Screen),
    b: (Vec3, Screen),
    projection: &Orthographic,
    sink: &mut dyn PathSink,
) {
    let mut between = Vec::new();
    subdivide(a, b, projection, MAX_DEPTH, &mut between);
    for (x, y) in between {
        sink.line_to(x, y);
    }
    sink.line_to(b.1 .0, b.1 .1);
}

/// Push the intermediate screen points needed between `a` and `b`
fn subdivide(
    a: (Vec3, Screen),
    b: (Vec3, Screen),
    projection: &Orthographic,
    depth: u32,
    out: &mut Vec<Screen>,
) {
    let delta2 = projection.precision() * projection.precision();
    if delta2 <= 0.0 || depth == 0 {
        return;
    }

    let ((va, (x0, y0)), (vb, (x1, y1))) = (a, b);
    let dx = x1 - x0;
    let dy = y1 - y0;
    let d2 = dx * dx + dy * dy;
    if !(d2 > 4.0 * delta2) {
        return;
    }

    let sum = [va[0] + vb[0], va[1] + vb[1], va[2] + vb[2]];
    let m = (sum[0] * sum[0] + sum[1] * sum[1] + sum[2] * sum[2]).sqrt();
    if m == 0.0 {
        return;
    }
    let mid = [sum[0] / m, sum[1] / m, sum[2] / m];
    let (x2, y2) = projection.view_to_screen(mid);

    let dx2 = x2 - x0;
    let dy2 = y2 - y0;
    let dz = dy * dx2 - dx * dy2;
    let cos_arc = va[0] * vb[0] + va[1] * vb[1] + va[2] * vb[2];

    if dz * dz / d2 > delta2
        || ((dx * dx2 + dy * dy2) / d2 - 0.5).abs() > 0.3
        || cos_arc < COS_MIN_DISTANCE
    {
        let middle = (mid, (x2, y2));
        subdivide(a, middle, projection, depth - 1, out);
        out.push((x2, y2));
        subdivide(middle, b, projection, depth - 1, out);
    }
}
