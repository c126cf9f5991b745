//! Vertex-count equalisation for path keyframes.
//!
//! Splitting a cubic at its parameter midpoint leaves the outline unchanged,
//! so the shorter side can be padded with extra vertices until both sides
//! match and then blended normally.

use crate::path::{point, ShapeData};
use glam::Vec2;
use kurbo::{CubicBez, ParamCurveArclen};

/// Returns copies of `a` and `b` with the same vertex count, or `None` if
/// one side cannot be subdivided (fewer than two vertices).
pub fn equalize(a: &ShapeData, b: &ShapeData) -> Option<(ShapeData, ShapeData)> {
    let target = a.vertex_count().max(b.vertex_count());
    Some((with_vertex_count(a, target)?, with_vertex_count(b, target)?))
}

/// Splits the longest segment until the path has `target` vertices.
pub fn with_vertex_count(shape: &ShapeData, target: usize) -> Option<ShapeData> {
    if shape.vertex_count() >= target {
        return Some(shape.clone());
    }
    if shape.vertex_count() < 2 {
        return None;
    }
    let mut out = shape.clone();
    while out.vertex_count() < target {
        let seg = longest_segment(&out)?;
        split_segment(&mut out, seg);
    }
    Some(out)
}

fn segment_count(shape: &ShapeData) -> usize {
    let n = shape.vertex_count();
    if shape.closed {
        n
    } else {
        n.saturating_sub(1)
    }
}

fn segment_curve(shape: &ShapeData, from: usize) -> CubicBez {
    let to = (from + 1) % shape.vertex_count();
    let p0 = shape.vertices[from];
    let p3 = shape.vertices[to];
    CubicBez::new(
        point(p0),
        point(p0 + shape.out_tangents[from]),
        point(p3 + shape.in_tangents[to]),
        point(p3),
    )
}

fn longest_segment(shape: &ShapeData) -> Option<usize> {
    (0..segment_count(shape))
        .map(|i| (i, segment_curve(shape, i).arclen(1e-2)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

fn split_segment(shape: &mut ShapeData, from: usize) {
    let n = shape.vertex_count();
    let to = (from + 1) % n;
    let p0 = shape.vertices[from];
    let p1 = p0 + shape.out_tangents[from];
    let p3 = shape.vertices[to];
    let p2 = p3 + shape.in_tangents[to];

    // De Casteljau at t = 0.5.
    let q0 = (p0 + p1) * 0.5;
    let q1 = (p1 + p2) * 0.5;
    let q2 = (p2 + p3) * 0.5;
    let r0 = (q0 + q1) * 0.5;
    let r1 = (q1 + q2) * 0.5;
    let mid: Vec2 = (r0 + r1) * 0.5;

    shape.out_tangents[from] = q0 - p0;
    shape.in_tangents[to] = q2 - p3;

    let insert_at = from + 1;
    shape.vertices.insert(insert_at, mid);
    shape.in_tangents.insert(insert_at, r0 - mid);
    shape.out_tangents.insert(insert_at, r1 - mid);
}
