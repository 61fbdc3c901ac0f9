use crate::animatable::{vec2, AnimatedValue, FrameContext};
use crate::Result;
use glam::{Vec2, Vec4};
use lottie_data::model as data;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientKind {
    Linear,
    Radial,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Vec4,
}

/// A resolved gradient, in the local space of the content that paints it.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBrush {
    pub kind: GradientKind,
    /// Linear: start point. Radial: center.
    pub start: Vec2,
    /// Linear: end point. Radial: a point on the outer circle.
    pub end: Vec2,
    pub stops: Vec<GradientStop>,
}

impl GradientBrush {
    pub fn radius(&self) -> f32 {
        let r = self.start.distance(self.end);
        if r <= 0.0 {
            0.001
        } else {
            r
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GradientKey {
    start: i32,
    end: i32,
    colors: i32,
}

/// Animated gradient shared by gradient fills and gradient strokes.
///
/// Brushes are cached per node keyed by the quantized progress of each
/// animated input; static inputs contribute a zero bucket.
#[derive(Debug)]
pub struct GradientAnimation {
    kind: GradientKind,
    start: AnimatedValue<Vec2>,
    end: AnimatedValue<Vec2>,
    colors: AnimatedValue<Vec<f32>>,
    color_points: usize,
    cache: HashMap<GradientKey, Rc<GradientBrush>>,
}

impl GradientAnimation {
    pub fn from_data(
        kind: u8,
        start: &data::Property<data::Vec2>,
        end: &data::Property<data::Vec2>,
        colors: &data::GradientColors,
        samples: usize,
    ) -> Result<Self> {
        Ok(Self {
            kind: if kind == 2 {
                GradientKind::Radial
            } else {
                GradientKind::Linear
            },
            start: AnimatedValue::from_property("s", start, vec2, Vec2::ZERO, samples)?,
            end: AnimatedValue::from_property("e", end, vec2, Vec2::ZERO, samples)?,
            colors: AnimatedValue::from_property("g", &colors.k, |v| v.clone(), Vec::new(), samples)?,
            color_points: colors.p as usize,
            cache: HashMap::new(),
        })
    }

    pub fn kind(&self) -> GradientKind {
        self.kind
    }

    pub fn set_frame(&mut self, ctx: FrameContext) -> bool {
        self.start.set_frame(ctx) | self.end.set_frame(ctx) | self.colors.set_frame(ctx)
    }

    pub fn version(&self) -> u64 {
        self.start.version() + self.end.version() + self.colors.version()
    }

    /// The brush for the current values, built at most once per cache bucket.
    pub fn brush(&mut self, progress: f32, cache_steps: f32) -> Rc<GradientBrush> {
        let bucket = |animated: bool| {
            if animated {
                (progress * cache_steps).round() as i32
            } else {
                0
            }
        };
        let key = GradientKey {
            start: bucket(self.start.is_animated()),
            end: bucket(self.end.is_animated()),
            colors: bucket(self.colors.is_animated()),
        };
        if let Some(brush) = self.cache.get(&key) {
            return Rc::clone(brush);
        }
        let brush = Rc::new(GradientBrush {
            kind: self.kind,
            start: self.start.get(),
            end: self.end.get(),
            stops: parse_gradient_stops(self.colors.value(), self.color_points),
        });
        tracing::trace!(?key, "gradient cache miss");
        self.cache.insert(key, Rc::clone(&brush));
        brush
    }

    pub fn cached_brushes(&self) -> usize {
        self.cache.len()
    }
}

// Helpers
struct ColorStop {
    t: f32,
    r: f32,
    g: f32,
    b: f32,
}

struct AlphaStop {
    t: f32,
    a: f32,
}

/// Decodes `color_count` `[t, r, g, b]` stops followed by `[t, a]` alpha
/// stops. With alpha present the result has a stop at every distinct offset
/// of either list.
pub fn parse_gradient_stops(raw: &[f32], color_count: usize) -> Vec<GradientStop> {
    let color_data_len = (color_count * 4).min(raw.len());
    let color_stops: Vec<ColorStop> = raw[..color_data_len]
        .chunks_exact(4)
        .map(|c| ColorStop {
            t: c[0],
            r: c[1],
            g: c[2],
            b: c[3],
        })
        .collect();
    let alpha_stops: Vec<AlphaStop> = raw[color_data_len..]
        .chunks_exact(2)
        .map(|c| AlphaStop { t: c[0], a: c[1] })
        .collect();

    if alpha_stops.is_empty() {
        return color_stops
            .iter()
            .map(|c| GradientStop {
                offset: c.t,
                color: Vec4::new(c.r, c.g, c.b, 1.0),
            })
            .collect();
    }

    let mut offsets: Vec<f32> = color_stops
        .iter()
        .map(|c| c.t)
        .chain(alpha_stops.iter().map(|a| a.t))
        .collect();
    offsets.sort_by(|a, b| a.total_cmp(b));
    offsets.dedup();
    offsets
        .into_iter()
        .map(|t| {
            let (r, g, b) = interpolate_color(&color_stops, t);
            GradientStop {
                offset: t,
                color: Vec4::new(r, g, b, interpolate_alpha(&alpha_stops, t)),
            }
        })
        .collect()
}

/// Index pair and ratio of the stops around `t`, clamped to the ends.
fn bracket(offsets: impl Iterator<Item = f32> + Clone, t: f32) -> Option<(usize, usize, f32)> {
    let count = offsets.clone().count();
    if count == 0 {
        return None;
    }
    let offsets: Vec<f32> = offsets.collect();
    if t <= offsets[0] {
        return Some((0, 0, 0.0));
    }
    if t >= offsets[count - 1] {
        return Some((count - 1, count - 1, 0.0));
    }
    let hi = offsets.partition_point(|&o| o < t).min(count - 1);
    let lo = hi.saturating_sub(1);
    let range = offsets[hi] - offsets[lo];
    let ratio = if range == 0.0 {
        0.0
    } else {
        (t - offsets[lo]) / range
    };
    Some((lo, hi, ratio))
}

fn interpolate_color(stops: &[ColorStop], t: f32) -> (f32, f32, f32) {
    match bracket(stops.iter().map(|s| s.t), t) {
        None => (1.0, 1.0, 1.0),
        Some((lo, hi, ratio)) => {
            let (s1, s2) = (&stops[lo], &stops[hi]);
            (
                s1.r + (s2.r - s1.r) * ratio,
                s1.g + (s2.g - s1.g) * ratio,
                s1.b + (s2.b - s1.b) * ratio,
            )
        }
    }
}

fn interpolate_alpha(stops: &[AlphaStop], t: f32) -> f32 {
    match bracket(stops.iter().map(|s| s.t), t) {
        None => 1.0,
        Some((lo, hi, ratio)) => stops[lo].a + (stops[hi].a - stops[lo].a) * ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_color_only_stops() {
        let stops = parse_gradient_stops(&[0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0], 2);
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].color, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(stops[1].offset, 1.0);
    }

    #[test]
    fn test_alpha_stops_merge_offsets() {
        let raw = [
            0.0, 1.0, 1.0, 1.0, //
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.5, 0.5, 1.0, 0.0,
        ];
        let stops = parse_gradient_stops(&raw, 2);
        let offsets: Vec<f32> = stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);
        assert!((stops[1].color.x - 0.5).abs() < 1e-6);
        assert_eq!(stops[1].color.w, 0.5);
        assert_eq!(stops[2].color.w, 0.0);
    }

    fn linear(animated: bool) -> GradientAnimation {
        let start: data::Property<data::Vec2> = if animated {
            serde_json::from_value(json!({"a": 1, "k": [
                {"t": 0, "s": [0, 0]},
                {"t": 100, "s": [100, 0]}
            ]}))
            .unwrap()
        } else {
            data::Property::fixed([0.0, 0.0])
        };
        let colors: data::GradientColors =
            serde_json::from_value(json!({"p": 2, "k": {"k": [0, 0, 0, 0, 1, 1, 1, 1]}})).unwrap();
        GradientAnimation::from_data(1, &start, &data::Property::fixed([10.0, 0.0]), &colors, 64)
            .unwrap()
    }

    #[test]
    fn test_static_gradient_builds_once() {
        let mut g = linear(false);
        let a = g.brush(0.1, 100.0);
        let b = g.brush(0.9, 100.0);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(g.cached_brushes(), 1);
    }

    #[test]
    fn test_animated_gradient_buckets_by_progress() {
        let mut g = linear(true);
        let at = |frame: f32| FrameContext {
            frame,
            progress: frame / 100.0,
        };
        g.set_frame(at(10.0));
        let a = g.brush(0.1, 100.0);
        g.set_frame(at(10.2));
        let b = g.brush(0.102, 100.0);
        assert!(Rc::ptr_eq(&a, &b), "same bucket must reuse the brush");
        g.set_frame(at(50.0));
        let c = g.brush(0.5, 100.0);
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(c.start, Vec2::new(50.0, 0.0));
    }
}
