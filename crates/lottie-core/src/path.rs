//! Path plumbing shared by the content graph: matrix conversion, appending
//! transformed paths and arc-length measurement across contours.

use glam::Mat3;
use kurbo::{
    Affine, BezPath, CubicBez, Line, ParamCurve, ParamCurveArclen, PathEl, PathSeg, Point, QuadBez,
    Rect, Shape,
};

pub fn to_affine(m: Mat3) -> Affine {
    let c = m.to_cols_array();
    Affine::new([
        c[0] as f64,
        c[1] as f64,
        c[3] as f64,
        c[4] as f64,
        c[6] as f64,
        c[7] as f64,
    ])
}

fn transform_el(affine: Affine, el: PathEl) -> PathEl {
    match el {
        PathEl::MoveTo(p) => PathEl::MoveTo(affine * p),
        PathEl::LineTo(p) => PathEl::LineTo(affine * p),
        PathEl::QuadTo(p1, p2) => PathEl::QuadTo(affine * p1, affine * p2),
        PathEl::CurveTo(p1, p2, p3) => PathEl::CurveTo(affine * p1, affine * p2, affine * p3),
        PathEl::ClosePath => PathEl::ClosePath,
    }
}

/// Appends `src` to `dst`, mapping every point through `m`.
pub fn append_transformed(dst: &mut BezPath, src: &BezPath, m: Mat3) {
    if m == Mat3::IDENTITY {
        for el in src.elements() {
            dst.push(*el);
        }
        return;
    }
    let affine = to_affine(m);
    for el in src.elements() {
        dst.push(transform_el(affine, *el));
    }
}

/// Bounding box of a path, or `None` when it has no drawing elements.
pub fn path_bounds(path: &BezPath) -> Option<Rect> {
    if path.elements().iter().all(|el| matches!(el, PathEl::MoveTo(_))) {
        return None;
    }
    Some(path.bounding_box())
}

pub fn union_bounds(acc: Option<Rect>, next: Option<Rect>) -> Option<Rect> {
    match (acc, next) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, b) => a.or(b),
    }
}

#[derive(Debug, Clone)]
struct MeasuredSegment {
    seg: PathSeg,
    start: f64,
    length: f64,
    contour: usize,
}

/// Cumulative arc lengths over every segment of a path, all contours
/// treated as one continuous run in path order.
#[derive(Debug, Clone, Default)]
pub struct PathMeasure {
    segments: Vec<MeasuredSegment>,
    contour_lengths: Vec<f64>,
    total: f64,
    accuracy: f64,
}

impl PathMeasure {
    pub fn new(path: &BezPath, accuracy: f64) -> Self {
        let mut measure = PathMeasure {
            accuracy,
            ..Default::default()
        };
        let mut contour_start = Point::ZERO;
        let mut last = Point::ZERO;
        let mut contour: Option<usize> = None;

        for el in path.elements() {
            let seg = match *el {
                PathEl::MoveTo(p) => {
                    contour_start = p;
                    last = p;
                    contour = None;
                    continue;
                }
                PathEl::LineTo(p) => PathSeg::Line(Line::new(last, p)),
                PathEl::QuadTo(p1, p2) => PathSeg::Quad(QuadBez::new(last, p1, p2)),
                PathEl::CurveTo(p1, p2, p3) => PathSeg::Cubic(CubicBez::new(last, p1, p2, p3)),
                PathEl::ClosePath => {
                    if last == contour_start {
                        continue;
                    }
                    PathSeg::Line(Line::new(last, contour_start))
                }
            };
            last = seg.end();
            let length = seg.arclen(accuracy);
            if length <= 0.0 {
                continue;
            }
            let index = *contour.get_or_insert_with(|| {
                measure.contour_lengths.push(0.0);
                measure.contour_lengths.len() - 1
            });
            measure.contour_lengths[index] += length;
            measure.segments.push(MeasuredSegment {
                seg,
                start: measure.total,
                length,
                contour: index,
            });
            measure.total += length;
        }
        measure
    }

    pub fn length(&self) -> f64 {
        self.total
    }

    /// Lengths of each contour that has non-zero length.
    pub fn contour_lengths(&self) -> &[f64] {
        &self.contour_lengths
    }

    /// Appends the stretch `[start, end]` of the measured path to `out`.
    /// A new subpath begins wherever the stretch crosses a contour boundary.
    pub fn segment(&self, start: f64, end: f64, out: &mut BezPath) {
        let start = start.max(0.0);
        let end = end.min(self.total);
        if start >= end {
            return;
        }
        let first = self
            .segments
            .partition_point(|s| s.start + s.length <= start);
        let mut current_contour = None;
        let mut pen: Option<Point> = None;

        for m in &self.segments[first..] {
            if m.start >= end {
                break;
            }
            let local_start = (start - m.start).max(0.0);
            let local_end = (end - m.start).min(m.length);
            if local_end <= local_start {
                continue;
            }
            let t0 = if local_start <= 0.0 {
                0.0
            } else {
                m.seg.inv_arclen(local_start, self.accuracy)
            };
            let t1 = if local_end >= m.length {
                1.0
            } else {
                m.seg.inv_arclen(local_end, self.accuracy)
            };
            let sub = m.seg.subsegment(t0..t1);

            let needs_move = current_contour != Some(m.contour) || pen != Some(sub.start());
            if needs_move {
                out.move_to(sub.start());
                current_contour = Some(m.contour);
            }
            match sub {
                PathSeg::Line(l) => out.line_to(l.p1),
                PathSeg::Quad(q) => out.quad_to(q.p1, q.p2),
                PathSeg::Cubic(c) => out.curve_to(c.p1, c.p2, c.p3),
            }
            pen = Some(sub.end());
        }
    }
}
