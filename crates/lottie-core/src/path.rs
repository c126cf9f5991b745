use glam::Vec2;
use kurbo::{BezPath, Point};
use lottie_data::model::BezierPath;

/// Cubic bezier outline as stored in keyframes: absolute vertices with
/// tangents relative to their vertex.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeData {
    pub vertices: Vec<Vec2>,
    pub in_tangents: Vec<Vec2>,
    pub out_tangents: Vec<Vec2>,
    pub closed: bool,
}

impl ShapeData {
    pub fn from_model(path: &BezierPath) -> Self {
        let vec = |p: &[f32; 2]| Vec2::new(p[0], p[1]);
        let vertices: Vec<Vec2> = path.v.iter().map(vec).collect();
        // Tangent arrays may be short in hand-edited files; pad with zero handles.
        let pad = |src: &[[f32; 2]]| -> Vec<Vec2> {
            (0..vertices.len())
                .map(|i| src.get(i).map(vec).unwrap_or(Vec2::ZERO))
                .collect()
        };
        Self {
            in_tangents: pad(&path.i),
            out_tangents: pad(&path.o),
            vertices,
            closed: path.c,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Polyline (all tangents zero) through `points`.
    pub fn polygon(points: impl IntoIterator<Item = Vec2>, closed: bool) -> Self {
        let vertices: Vec<Vec2> = points.into_iter().collect();
        Self {
            in_tangents: vec![Vec2::ZERO; vertices.len()],
            out_tangents: vec![Vec2::ZERO; vertices.len()],
            vertices,
            closed,
        }
    }

    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let n = self.vertices.len();
        if n == 0 {
            return path;
        }
        path.move_to(point(self.vertices[0]));
        let segments = if self.closed { n } else { n - 1 };
        for i in 0..segments {
            let next = (i + 1) % n;
            self.push_segment(&mut path, i, next);
        }
        if self.closed {
            path.close_path();
        }
        path
    }

    fn push_segment(&self, path: &mut BezPath, from: usize, to: usize) {
        let out = self.out_tangents[from];
        let inn = self.in_tangents[to];
        let end = self.vertices[to];
        if out == Vec2::ZERO && inn == Vec2::ZERO {
            path.line_to(point(end));
        } else {
            path.curve_to(
                point(self.vertices[from] + out),
                point(end + inn),
                point(end),
            );
        }
    }

    /// Vertex-wise linear blend. Callers check vertex counts first.
    pub(crate) fn lerp_unchecked(&self, other: &Self, t: f32) -> Self {
        let mix = |a: &[Vec2], b: &[Vec2]| -> Vec<Vec2> {
            a.iter().zip(b).map(|(a, b)| a.lerp(*b, t)).collect()
        };
        Self {
            vertices: mix(&self.vertices, &other.vertices),
            in_tangents: mix(&self.in_tangents, &other.in_tangents),
            out_tangents: mix(&self.out_tangents, &other.out_tangents),
            closed: self.closed || other.closed,
        }
    }

    /// Same outline traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        let n = self.vertices.len();
        if n < 2 {
            return self.clone();
        }
        // Keep the first vertex in place so closed shapes start where they did.
        let order: Vec<usize> = std::iter::once(0).chain((1..n).rev()).collect();
        Self {
            vertices: order.iter().map(|&i| self.vertices[i]).collect(),
            in_tangents: order.iter().map(|&i| self.out_tangents[i]).collect(),
            out_tangents: order.iter().map(|&i| self.in_tangents[i]).collect(),
            closed: self.closed,
        }
    }
}

pub(crate) fn point(v: Vec2) -> Point {
    Point::new(v.x as f64, v.y as f64)
}

pub(crate) fn vec2(p: Point) -> Vec2 {
    Vec2::new(p.x as f32, p.y as f32)
}
