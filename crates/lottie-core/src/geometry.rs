//! Path generators and path modifiers used by the content builder.

use crate::path::{point, vec2, ShapeData};
use glam::Vec2;
use kurbo::{BezPath, ParamCurve, ParamCurveArclen, PathEl, PathSeg, Point};
use std::f32::consts::PI;

/// Handle length of a cubic quarter circle, relative to the radius.
const KAPPA: f32 = 0.552_284_8;
const ARCLEN_ACCURACY: f64 = 1e-3;

/// Rectangle centred on `center`, starting at the top-right corner and
/// running clockwise.
pub fn rect(center: Vec2, size: Vec2, radius: f32) -> ShapeData {
    let half = size.abs() / 2.0;
    let (x0, y0) = (center.x - half.x, center.y - half.y);
    let (x1, y1) = (center.x + half.x, center.y + half.y);
    let r = radius.max(0.0).min(half.x).min(half.y);
    if r <= 0.0 {
        return ShapeData::polygon(
            [
                Vec2::new(x1, y0),
                Vec2::new(x1, y1),
                Vec2::new(x0, y1),
                Vec2::new(x0, y0),
            ],
            true,
        );
    }
    let k = r * KAPPA;
    let zero = Vec2::ZERO;
    let corners = [
        (Vec2::new(x1, y0 + r), Vec2::new(0.0, -k), zero),
        (Vec2::new(x1, y1 - r), zero, Vec2::new(0.0, k)),
        (Vec2::new(x1 - r, y1), Vec2::new(k, 0.0), zero),
        (Vec2::new(x0 + r, y1), zero, Vec2::new(-k, 0.0)),
        (Vec2::new(x0, y1 - r), Vec2::new(0.0, k), zero),
        (Vec2::new(x0, y0 + r), zero, Vec2::new(0.0, -k)),
        (Vec2::new(x0 + r, y0), Vec2::new(-k, 0.0), zero),
        (Vec2::new(x1 - r, y0), zero, Vec2::new(k, 0.0)),
    ];
    from_vertices(corners, true)
}

/// Ellipse centred on `center`, starting at the top and running clockwise.
pub fn ellipse(center: Vec2, size: Vec2) -> ShapeData {
    let r = size.abs() / 2.0;
    let (kx, ky) = (r.x * KAPPA, r.y * KAPPA);
    from_vertices(
        [
            (center - Vec2::new(0.0, r.y), Vec2::new(-kx, 0.0), Vec2::new(kx, 0.0)),
            (center + Vec2::new(r.x, 0.0), Vec2::new(0.0, -ky), Vec2::new(0.0, ky)),
            (center + Vec2::new(0.0, r.y), Vec2::new(kx, 0.0), Vec2::new(-kx, 0.0)),
            (center - Vec2::new(r.x, 0.0), Vec2::new(0.0, ky), Vec2::new(0.0, -ky)),
        ],
        true,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarParams {
    pub center: Vec2,
    pub points: f32,
    /// Degrees; zero puts the first point straight up.
    pub rotation: f32,
    pub outer_radius: f32,
    pub outer_roundness: f32,
    /// `None` draws a regular polygon.
    pub inner: Option<(f32, f32)>,
}

/// Star or polygon outline. Roundness (percent) bends each vertex along the
/// circle tangent.
pub fn polystar(params: &StarParams) -> ShapeData {
    let points = params.points.round();
    if points < 2.0 || !points.is_finite() {
        return ShapeData::default();
    }
    let total = if params.inner.is_some() {
        points as usize * 2
    } else {
        points as usize
    };
    let step = 2.0 * PI / total as f32;
    let start = (params.rotation - 90.0).to_radians();

    let vertices = (0..total).map(|i| {
        let (radius, roundness) = match params.inner {
            Some(inner) if i % 2 == 1 => inner,
            _ => (params.outer_radius, params.outer_roundness),
        };
        let angle = start + step * i as f32;
        let dir = Vec2::from_angle(angle);
        let vertex = params.center + dir * radius;
        let tangent = dir.perp() * radius * step / 4.0 * roundness / 100.0;
        (vertex, -tangent, tangent)
    });
    from_vertices(vertices, true)
}

fn from_vertices(vertices: impl IntoIterator<Item = (Vec2, Vec2, Vec2)>, closed: bool) -> ShapeData {
    let mut shape = ShapeData {
        closed,
        ..ShapeData::default()
    };
    for (v, i, o) in vertices {
        shape.vertices.push(v);
        shape.in_tangents.push(i);
        shape.out_tangents.push(o);
    }
    shape
}

/// Splits a path into one [`ShapeData`] per subpath. Quadratic segments are
/// raised to cubics; a closing segment that returns to the start vertex is
/// folded into it.
pub fn subpaths(path: &BezPath) -> Vec<ShapeData> {
    let mut out = Vec::new();
    let mut current: Option<ShapeData> = None;
    let mut last = Point::ZERO;

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                if let Some(shape) = current.take() {
                    out.push(shape);
                }
                current = Some(start_at(p));
                last = p;
            }
            PathEl::LineTo(p) => {
                let shape = current.get_or_insert_with(|| start_at(last));
                push_vertex(shape, p, None);
                last = p;
            }
            PathEl::QuadTo(c, p) => {
                let shape = current.get_or_insert_with(|| start_at(last));
                let c1 = last + (c - last) * (2.0 / 3.0);
                let c2 = p + (c - p) * (2.0 / 3.0);
                set_last_out(shape, c1);
                push_vertex(shape, p, Some(c2));
                last = p;
            }
            PathEl::CurveTo(c1, c2, p) => {
                let shape = current.get_or_insert_with(|| start_at(last));
                set_last_out(shape, c1);
                push_vertex(shape, p, Some(c2));
                last = p;
            }
            PathEl::ClosePath => {
                if let Some(mut shape) = current.take() {
                    fold_closing_vertex(&mut shape);
                    shape.closed = true;
                    last = point(shape.vertices[0]);
                    out.push(shape);
                }
            }
        }
    }
    if let Some(shape) = current {
        out.push(shape);
    }
    out
}

fn push_vertex(shape: &mut ShapeData, p: Point, in_ctrl: Option<Point>) {
    shape.vertices.push(vec2(p));
    shape
        .in_tangents
        .push(in_ctrl.map_or(Vec2::ZERO, |c| vec2(c) - vec2(p)));
    shape.out_tangents.push(Vec2::ZERO);
}

fn start_at(p: Point) -> ShapeData {
    ShapeData::polygon([vec2(p)], false)
}

fn set_last_out(shape: &mut ShapeData, ctrl: Point) {
    if let (Some(v), Some(o)) = (shape.vertices.last(), shape.out_tangents.last_mut()) {
        *o = vec2(ctrl) - *v;
    }
}

fn fold_closing_vertex(shape: &mut ShapeData) {
    let n = shape.vertices.len();
    if n < 2 || shape.vertices[n - 1].distance(shape.vertices[0]) > 1e-4 {
        return;
    }
    shape.vertices.pop();
    shape.out_tangents.pop();
    if let Some(in_tangent) = shape.in_tangents.pop() {
        shape.in_tangents[0] = in_tangent;
    }
}

/// Same outline with every subpath traversed backwards.
pub fn reverse(path: &BezPath) -> BezPath {
    join(subpaths(path).iter().map(ShapeData::reversed))
}

fn join(shapes: impl IntoIterator<Item = ShapeData>) -> BezPath {
    let mut out = BezPath::new();
    for shape in shapes {
        out.extend(shape.to_bez_path().elements().iter().copied());
    }
    out
}

/// Rounds every sharp vertex (no tangents) with a circular-looking arc of
/// `radius`, limited to half of each adjoining segment.
pub fn round_corners(path: &BezPath, radius: f32) -> BezPath {
    if radius <= 0.0 {
        return path.clone();
    }
    join(subpaths(path).iter().map(|s| round_shape(s, radius)))
}

fn round_shape(shape: &ShapeData, radius: f32) -> ShapeData {
    let n = shape.vertex_count();
    if n < 3 {
        return shape.clone();
    }
    let mut out = ShapeData {
        closed: shape.closed,
        ..ShapeData::default()
    };
    for i in 0..n {
        let v = shape.vertices[i];
        let sharp = shape.in_tangents[i] == Vec2::ZERO && shape.out_tangents[i] == Vec2::ZERO;
        let endpoint = !shape.closed && (i == 0 || i == n - 1);
        if !sharp || endpoint {
            out.vertices.push(v);
            out.in_tangents.push(shape.in_tangents[i]);
            out.out_tangents.push(shape.out_tangents[i]);
            continue;
        }
        let prev = shape.vertices[(i + n - 1) % n];
        let next = shape.vertices[(i + 1) % n];
        let (to_prev, to_next) = (prev - v, next - v);
        let d_prev = radius.min(to_prev.length() / 2.0);
        let d_next = radius.min(to_next.length() / 2.0);
        let enter = v + to_prev.normalize_or_zero() * d_prev;
        let leave = v + to_next.normalize_or_zero() * d_next;

        out.vertices.push(enter);
        out.in_tangents.push(Vec2::ZERO);
        out.out_tangents.push((v - enter) * KAPPA);
        out.vertices.push(leave);
        out.in_tangents.push((v - leave) * KAPPA);
        out.out_tangents.push(Vec2::ZERO);
    }
    out
}

/// Segment lengths of a path, keeping track of where subpaths start.
#[derive(Debug, Clone)]
pub struct PathMeasure {
    segments: Vec<MeasuredSegment>,
    length: f64,
}

#[derive(Debug, Clone)]
struct MeasuredSegment {
    seg: PathSeg,
    length: f64,
    /// First segment of a subpath.
    starts_subpath: bool,
}

impl PathMeasure {
    pub fn new(path: &BezPath) -> Self {
        let mut segments = Vec::new();
        let mut length = 0.0;
        // A segment that does not continue from the previous one starts a
        // new subpath.
        let mut start_next = true;
        let mut cursor: Option<Point> = None;
        for seg in path.segments() {
            let from = seg.start();
            if cursor.map_or(true, |c| c.distance(from) > 1e-9) {
                start_next = true;
            }
            let seg_len = seg.arclen(ARCLEN_ACCURACY);
            segments.push(MeasuredSegment {
                seg,
                length: seg_len,
                starts_subpath: start_next,
            });
            length += seg_len;
            start_next = false;
            cursor = Some(seg.end());
        }
        Self { segments, length }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Portion of the path between two distances from its start.
    pub fn extract(&self, from: f64, to: f64, out: &mut BezPath) {
        if to <= from {
            return;
        }
        let mut offset = 0.0;
        let mut pen: Option<Point> = None;
        for m in &self.segments {
            let (seg_start, seg_end) = (offset, offset + m.length);
            offset = seg_end;
            if m.starts_subpath {
                pen = None;
            }
            if seg_end <= from || seg_start >= to || m.length <= 0.0 {
                continue;
            }
            let t0 = if from > seg_start {
                m.seg.inv_arclen(from - seg_start, ARCLEN_ACCURACY)
            } else {
                0.0
            };
            let t1 = if to < seg_end {
                m.seg.inv_arclen(to - seg_start, ARCLEN_ACCURACY)
            } else {
                1.0
            };
            let piece = m.seg.subsegment(t0..t1);
            if pen.map_or(true, |p| p.distance(piece.start()) > 1e-6) {
                out.move_to(piece.start());
            }
            match piece {
                PathSeg::Line(l) => out.line_to(l.p1),
                PathSeg::Quad(q) => out.quad_to(q.p1, q.p2),
                PathSeg::Cubic(c) => out.curve_to(c.p1, c.p2, c.p3),
            }
            pen = Some(piece.end());
        }
    }
}

/// Trims `paths` to the range `start..end` (fractions, `end - start` at
/// most 1, possibly shifted past 1 by an offset). With `together`, all
/// paths share one length axis in order; otherwise each is trimmed on its
/// own.
pub fn trim(paths: &mut [BezPath], start: f32, end: f32, together: bool) {
    let span = end - start;
    if span >= 1.0 - 1e-6 {
        return;
    }
    if span <= 1e-6 {
        for path in paths.iter_mut() {
            *path = BezPath::new();
        }
        return;
    }
    let start = start.rem_euclid(1.0) as f64;
    let end = start + span as f64;

    let measures: Vec<PathMeasure> = paths.iter().map(PathMeasure::new).collect();
    if together {
        let total: f64 = measures.iter().map(PathMeasure::length).sum();
        let ranges = wrapped_ranges(start * total, end * total, total);
        let mut offset = 0.0;
        for (path, measure) in paths.iter_mut().zip(&measures) {
            let len = measure.length();
            let mut out = BezPath::new();
            for &(a, b) in &ranges {
                measure.extract(a - offset, b - offset, &mut out);
            }
            offset += len;
            *path = out;
        }
    } else {
        for (path, measure) in paths.iter_mut().zip(&measures) {
            let len = measure.length();
            let mut out = BezPath::new();
            for (a, b) in wrapped_ranges(start * len, end * len, len) {
                measure.extract(a, b, &mut out);
            }
            *path = out;
        }
    }
}

/// Splits `from..to` on a length axis of `total` into in-range pieces,
/// wrapping the part past the end back to the start.
fn wrapped_ranges(from: f64, to: f64, total: f64) -> Vec<(f64, f64)> {
    if to <= total {
        vec![(from, to)]
    } else {
        vec![(from, total), (0.0, to - total)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Rect, Shape};

    fn line(len: f64) -> BezPath {
        let mut p = BezPath::new();
        p.move_to((0.0, 0.0));
        p.line_to((len, 0.0));
        p
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn rect_starts_top_right_clockwise() {
        let r = rect(Vec2::new(0.0, 0.0), Vec2::new(20.0, 10.0), 0.0);
        assert_eq!(r.vertices[0], Vec2::new(10.0, -5.0));
        assert_eq!(r.vertices[1], Vec2::new(10.0, 5.0));
        assert!(close(r.to_bez_path().area().abs(), 200.0));
    }

    #[test]
    fn rounded_rect_radius_is_clamped() {
        let r = rect(Vec2::ZERO, Vec2::new(10.0, 10.0), 50.0);
        let area = r.to_bez_path().area().abs();
        // Fully rounded square is a circle of radius 5.
        assert!((area - std::f64::consts::PI * 25.0).abs() < 0.5, "{area}");
    }

    #[test]
    fn ellipse_area() {
        let e = ellipse(Vec2::new(5.0, 5.0), Vec2::new(20.0, 10.0));
        let area = e.to_bez_path().area().abs();
        assert!((area - std::f64::consts::PI * 50.0).abs() < 0.5, "{area}");
    }

    #[test]
    fn polygon_and_star_vertex_counts() {
        let mut params = StarParams {
            center: Vec2::ZERO,
            points: 5.0,
            rotation: 0.0,
            outer_radius: 10.0,
            outer_roundness: 0.0,
            inner: None,
        };
        let polygon = polystar(&params);
        assert_eq!(polygon.vertex_count(), 5);
        assert!((polygon.vertices[0] - Vec2::new(0.0, -10.0)).length() < 1e-4);

        params.inner = Some((4.0, 0.0));
        assert_eq!(polystar(&params).vertex_count(), 10);
    }

    #[test]
    fn subpaths_fold_closing_vertex() {
        let square = Rect::new(0.0, 0.0, 4.0, 4.0).to_path(0.1);
        let shapes = subpaths(&square);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].vertex_count(), 4);
        assert!(shapes[0].closed);
    }

    #[test]
    fn reverse_flips_orientation() {
        let square = Rect::new(0.0, 0.0, 4.0, 4.0).to_path(0.1);
        assert!(close(square.area(), -reverse(&square).area()));
    }

    #[test]
    fn rounding_cuts_corners() {
        let square = Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1);
        let rounded = round_corners(&square, 2.0);
        let area = rounded.area().abs();
        assert!(area < 100.0 && area > 95.0, "{area}");
        assert_eq!(subpaths(&rounded)[0].vertex_count(), 8);
    }

    #[test]
    fn trim_takes_the_middle() {
        let mut paths = vec![line(100.0)];
        trim(&mut paths, 0.25, 0.75, true);
        let bounds = paths[0].bounding_box();
        assert!(close(bounds.x0, 25.0) && close(bounds.x1, 75.0));
    }

    #[test]
    fn trim_wraps_past_the_end() {
        let mut paths = vec![line(100.0)];
        trim(&mut paths, 0.8, 1.1, true);
        let measure = PathMeasure::new(&paths[0]);
        assert!(close(measure.length(), 30.0));
        let moves = paths[0]
            .elements()
            .iter()
            .filter(|e| matches!(e, PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 2);
    }

    #[test]
    fn empty_and_full_spans() {
        let mut paths = vec![line(10.0)];
        trim(&mut paths, 0.0, 1.0, true);
        assert!(close(PathMeasure::new(&paths[0]).length(), 10.0));
        trim(&mut paths, 0.5, 0.5, true);
        assert!(paths[0].elements().is_empty());
    }

    #[test]
    fn simultaneous_trim_spans_paths() {
        let mut together = vec![line(100.0), line(100.0)];
        trim(&mut together, 0.0, 0.5, true);
        assert!(close(PathMeasure::new(&together[0]).length(), 100.0));
        assert!(together[1].elements().is_empty());

        let mut apart = vec![line(100.0), line(100.0)];
        trim(&mut apart, 0.0, 0.5, false);
        assert!(close(PathMeasure::new(&apart[0]).length(), 50.0));
        assert!(close(PathMeasure::new(&apart[1]).length(), 50.0));
    }
}
