use crate::animatable::Interpolatable;
use glam::Vec2;
use kurbo::{CubicBez, ParamCurve, ParamCurveArclen, Point};
use lottie_data::model as data;

const ARCLEN_ACCURACY: f64 = 1e-3;

/// Cubic time remap between two keyframes. Endpoints are fixed at (0,0) and
/// (1,1); `out_tangent` is the first control point, `in_tangent` the second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Easing {
    pub out_tangent: Vec2,
    pub in_tangent: Vec2,
}

impl Easing {
    pub const LINEAR: Easing = Easing {
        out_tangent: Vec2::ZERO,
        in_tangent: Vec2::ONE,
    };

    pub fn new(out_tangent: Vec2, in_tangent: Vec2) -> Self {
        // x must stay inside [0, 1] for the curve to be a function of time.
        Self {
            out_tangent: Vec2::new(out_tangent.x.clamp(0.0, 1.0), out_tangent.y),
            in_tangent: Vec2::new(in_tangent.x.clamp(0.0, 1.0), in_tangent.y),
        }
    }

    pub fn is_linear(&self) -> bool {
        self.out_tangent.x == self.out_tangent.y && self.in_tangent.x == self.in_tangent.y
    }

    pub fn ease(&self, progress: f32) -> f32 {
        if self.is_linear() {
            return progress.clamp(0.0, 1.0);
        }
        solve_cubic_bezier(self.out_tangent, self.in_tangent, progress)
    }
}

fn bezier_coord(a: f32, b: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * a + 3.0 * mt * t * t * b + t * t * t
}

fn bezier_slope(a: f32, b: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * a + 6.0 * mt * t * (b - a) + 3.0 * t * t * (1.0 - b)
}

// Cubic Bezier Easing
pub fn solve_cubic_bezier(p1: Vec2, p2: Vec2, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Newton-Raphson, falling back to bisection on flat or diverging curves
    let mut t = x;
    let mut solved = false;
    for _ in 0..8 {
        let err = bezier_coord(p1.x, p2.x, t) - x;
        if err.abs() < 1e-5 {
            solved = true;
            break;
        }
        let slope = bezier_slope(p1.x, p2.x, t);
        if slope.abs() < 1e-6 {
            break;
        }
        t -= err / slope;
        if !(0.0..=1.0).contains(&t) {
            break;
        }
    }

    if !solved {
        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        t = x;
        for _ in 0..32 {
            let est = bezier_coord(p1.x, p2.x, t);
            if (est - x).abs() < 1e-5 {
                break;
            }
            if est < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) * 0.5;
        }
    }

    bezier_coord(p1.y, p2.y, t)
}

/// Motion path of a spatial keyframe, with an arc-length table so that eased
/// progress maps to distance travelled rather than curve parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialCurve {
    points: [Vec2; 4],
    lengths: Vec<f32>,
}

impl SpatialCurve {
    pub fn new(
        start: Vec2,
        end: Vec2,
        tangent_out: Vec2,
        tangent_in: Vec2,
        samples: usize,
    ) -> Option<Self> {
        if start == end || (tangent_out == Vec2::ZERO && tangent_in == Vec2::ZERO) {
            return None;
        }
        let samples = samples.max(2);
        let points = [start, start + tangent_out, end + tangent_in, end];
        let to_pt = |v: Vec2| Point::new(v.x as f64, v.y as f64);
        let cubic = CubicBez::new(to_pt(points[0]), to_pt(points[1]), to_pt(points[2]), to_pt(points[3]));
        let mut lengths = Vec::with_capacity(samples + 1);
        let mut total = 0.0f64;
        lengths.push(0.0);
        for i in 1..=samples {
            let t0 = (i - 1) as f64 / samples as f64;
            let t1 = i as f64 / samples as f64;
            total += cubic.subsegment(t0..t1).arclen(ARCLEN_ACCURACY);
            lengths.push(total as f32);
        }
        Some(SpatialCurve { points, lengths })
    }

    fn point(&self, t: f32) -> Vec2 {
        let [p0, p1, p2, p3] = self.points;
        let mt = 1.0 - t;
        p0 * (mt * mt * mt) + p1 * (3.0 * mt * mt * t) + p2 * (3.0 * mt * t * t) + p3 * (t * t * t)
    }

    pub fn length(&self) -> f32 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at `progress` of the curve's arc length.
    pub fn position_at(&self, progress: f32) -> Vec2 {
        let progress = progress.clamp(0.0, 1.0);
        let total = self.length();
        if total <= 0.0 {
            return self.point(progress);
        }
        let target = progress * total;
        let idx = self.lengths.partition_point(|&l| l < target);
        if idx == 0 {
            return self.points[0];
        }
        if idx >= self.lengths.len() {
            return self.points[3];
        }
        let (l0, l1) = (self.lengths[idx - 1], self.lengths[idx]);
        let frac = if l1 > l0 { (target - l0) / (l1 - l0) } else { 0.0 };
        let samples = (self.lengths.len() - 1) as f32;
        self.point(((idx - 1) as f32 + frac) / samples)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe<T> {
    pub start_frame: f32,
    /// Equal to `start_frame` for the terminal keyframe of a track.
    pub end_frame: f32,
    pub start_value: T,
    pub end_value: T,
    pub easing: Easing,
    pub hold: bool,
    pub spatial: Option<SpatialCurve>,
}

/// One evaluation of a keyframe track.
#[derive(Debug, Clone)]
pub struct Sample<'a, T> {
    pub keyframe: &'a Keyframe<T>,
    pub value: T,
    pub linear_progress: f32,
    pub interpolated_progress: f32,
}

/// Keyframes sorted by start frame. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeTrack<T> {
    keyframes: Vec<Keyframe<T>>,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    pub fn new(keyframes: Vec<Keyframe<T>>) -> Option<Self> {
        if keyframes.is_empty() {
            None
        } else {
            Some(Self { keyframes })
        }
    }

    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    pub fn is_animated(&self) -> bool {
        self.keyframes.len() > 1 || self.keyframes[0].start_value != self.keyframes[0].end_value
    }

    pub fn evaluate(&self, frame: f32) -> Sample<'_, T> {
        let first = &self.keyframes[0];
        if frame < first.start_frame {
            return Sample {
                keyframe: first,
                value: first.start_value.clone(),
                linear_progress: 0.0,
                interpolated_progress: 0.0,
            };
        }

        // Last keyframe whose start is at or before `frame`.
        let idx = self.keyframes.partition_point(|kf| kf.start_frame <= frame);
        let kf = &self.keyframes[idx.saturating_sub(1)];

        if frame >= kf.end_frame {
            return Sample {
                keyframe: kf,
                value: kf.end_value.clone(),
                linear_progress: 1.0,
                interpolated_progress: 1.0,
            };
        }

        let linear = (frame - kf.start_frame) / (kf.end_frame - kf.start_frame);
        if kf.hold {
            return Sample {
                keyframe: kf,
                value: kf.start_value.clone(),
                linear_progress: linear,
                interpolated_progress: 0.0,
            };
        }

        let eased = kf.easing.ease(linear);
        let value = match &kf.spatial {
            Some(curve) => kf.start_value.along_curve(&kf.end_value, curve, eased),
            None => kf.start_value.lerp(&kf.end_value, eased),
        };
        Sample {
            keyframe: kf,
            value,
            linear_progress: linear,
            interpolated_progress: eased,
        }
    }
}

fn tangent_point(tangent: Option<&data::BezierTangent>, default: f32) -> Option<Vec2> {
    tangent.map(|t| {
        Vec2::new(
            t.x.first().copied().unwrap_or(default),
            t.y.first().copied().unwrap_or(default),
        )
    })
}

fn tangent_vec(values: Option<&Vec<f32>>) -> Option<Vec2> {
    values.and_then(|v| match v.as_slice() {
        [x, y, ..] => Some(Vec2::new(*x, *y)),
        _ => None,
    })
}

/// Converts serialized keyframes into runtime keyframes.
///
/// A trailing entry without a start value only marks where the previous
/// segment ends and does not become a keyframe of its own.
pub(crate) fn from_data<S, T: Interpolatable>(
    frames: &[data::Keyframe<S>],
    convert: &impl Fn(&S) -> T,
    spatial_samples: usize,
) -> Vec<Keyframe<T>> {
    let mut out: Vec<Keyframe<T>> = Vec::with_capacity(frames.len());
    let mut prev_end: Option<T> = None;

    for (i, kf) in frames.iter().enumerate() {
        let next = frames.get(i + 1);
        if next.is_none() && kf.s.is_none() && !out.is_empty() {
            break;
        }
        let Some(start_value) = kf.s.as_ref().map(convert).or_else(|| prev_end.clone()) else {
            continue;
        };
        let end_value = kf
            .e
            .as_ref()
            .map(convert)
            .or_else(|| next.and_then(|n| n.s.as_ref().map(convert)))
            .unwrap_or_else(|| start_value.clone());

        let out_tangent = tangent_point(kf.o.as_ref(), 0.0).unwrap_or(Vec2::ZERO);
        let in_tangent = tangent_point(kf.i.as_ref(), 1.0)
            .or_else(|| tangent_point(next.and_then(|n| n.i.as_ref()), 1.0))
            .unwrap_or(Vec2::ONE);
        let hold = kf.h == Some(1);

        let spatial = if hold {
            None
        } else {
            let to = tangent_vec(kf.to.as_ref());
            let ti = tangent_vec(kf.ti.as_ref()).or_else(|| tangent_vec(next.and_then(|n| n.ti.as_ref())));
            T::spatial_curve(&start_value, &end_value, to, ti, spatial_samples)
        };

        prev_end = Some(end_value.clone());
        out.push(Keyframe {
            start_frame: kf.t,
            end_frame: next.map(|n| n.t).unwrap_or(kf.t),
            start_value,
            end_value,
            easing: Easing::new(out_tangent, in_tangent),
            hold,
            spatial,
        });
    }
    out
}
