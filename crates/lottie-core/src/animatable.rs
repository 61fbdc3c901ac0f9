use crate::error::{LottieError, Result};
use crate::keyframe::{self, Keyframe, KeyframeTrack, SpatialCurve};
use glam::{Vec2, Vec4};
use lottie_data::model::{self as data, BezierPath};
use std::fmt;
use std::rc::Rc;

pub trait Interpolatable: Sized + Clone + PartialEq + fmt::Debug {
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Motion path between two keyframe values, for types that move in space.
    fn spatial_curve(
        _start: &Self,
        _end: &Self,
        _tan_out: Option<Vec2>,
        _tan_in: Option<Vec2>,
        _samples: usize,
    ) -> Option<SpatialCurve> {
        None
    }

    fn along_curve(&self, other: &Self, _curve: &SpatialCurve, t: f32) -> Self {
        self.lerp(other, t)
    }
}

impl Interpolatable for BezierPath {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        if t <= 0.0 {
            return self.clone();
        }
        if t >= 1.0 {
            return other.clone();
        }

        // Mismatched vertex counts interpolate over the common prefix.
        let min_verts = self.v.len().min(other.v.len());
        if min_verts == 0 {
            return self.clone();
        }

        let mix = |a: [f32; 2], b: [f32; 2]| [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t];
        let pick = |list: &[[f32; 2]], i: usize| list.get(i).copied().unwrap_or([0.0, 0.0]);

        let mut shape = BezierPath {
            c: self.c,
            v: Vec::with_capacity(min_verts),
            i: Vec::with_capacity(min_verts),
            o: Vec::with_capacity(min_verts),
        };
        for idx in 0..min_verts {
            shape.v.push(mix(self.v[idx], other.v[idx]));
            shape.i.push(mix(pick(&self.i, idx), pick(&other.i, idx)));
            shape.o.push(mix(pick(&self.o, idx), pick(&other.o, idx)));
        }
        shape
    }
}

impl Interpolatable for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolatable for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::lerp(*self, *other, t)
    }

    fn spatial_curve(
        start: &Self,
        end: &Self,
        tan_out: Option<Vec2>,
        tan_in: Option<Vec2>,
        samples: usize,
    ) -> Option<SpatialCurve> {
        SpatialCurve::new(
            *start,
            *end,
            tan_out.unwrap_or(Vec2::ZERO),
            tan_in.unwrap_or(Vec2::ZERO),
            samples,
        )
    }

    fn along_curve(&self, _other: &Self, curve: &SpatialCurve, t: f32) -> Self {
        curve.position_at(t)
    }
}

impl Interpolatable for Vec4 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec4::lerp(*self, *other, t)
    }
}

// For gradient colors (Vec<f32>)
impl Interpolatable for Vec<f32> {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| a + (b - a) * t)
            .collect()
    }
}

/// Time position handed to every animated value on a frame change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Frame in the owning layer's local time.
    pub frame: f32,
    /// Overall composition progress in [0, 1].
    pub progress: f32,
}

/// What a value callback sees when asked for an override.
#[derive(Debug, Clone)]
pub struct FrameInfo<T> {
    pub start_frame: f32,
    pub end_frame: f32,
    pub start_value: T,
    pub end_value: T,
    pub linear_keyframe_progress: f32,
    pub interpolated_keyframe_progress: f32,
    pub overall_progress: f32,
    /// The value the animation would produce without the override.
    pub keyframe_value: T,
}

pub type ValueFn<T> = Rc<dyn Fn(&FrameInfo<T>) -> T>;

enum Source<T> {
    Static(T),
    Keyframed(KeyframeTrack<T>),
}

/// A property that is either constant or driven by keyframes, with an
/// optional override. `version` bumps exactly when the visible value changes.
pub struct AnimatedValue<T: Interpolatable> {
    source: Source<T>,
    value: T,
    evaluated_at: Option<FrameContext>,
    version: u64,
    callback: Option<ValueFn<T>>,
}

impl<T: Interpolatable> fmt::Debug for AnimatedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatedValue")
            .field("value", &self.value)
            .field("animated", &self.is_animated())
            .field("version", &self.version)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl<T: Interpolatable> AnimatedValue<T> {
    pub fn fixed(value: T) -> Self {
        Self {
            source: Source::Static(value.clone()),
            value,
            evaluated_at: None,
            version: 0,
            callback: None,
        }
    }

    pub fn keyframed(keyframes: Vec<Keyframe<T>>) -> Option<Self> {
        let track = KeyframeTrack::new(keyframes)?;
        let value = track.keyframes()[0].start_value.clone();
        Some(Self {
            source: Source::Keyframed(track),
            value,
            evaluated_at: None,
            version: 0,
            callback: None,
        })
    }

    /// Builds a value from its serialized form. `default` stands in for an
    /// absent property.
    pub fn from_property<S>(
        name: &'static str,
        prop: &data::Property<S>,
        convert: impl Fn(&S) -> T,
        default: T,
        spatial_samples: usize,
    ) -> Result<Self> {
        match &prop.k {
            data::Value::Default => Ok(Self::fixed(default)),
            data::Value::Static(v) => Ok(Self::fixed(convert(v))),
            data::Value::Animated(frames) => {
                let keyframes = keyframe::from_data(frames, &convert, spatial_samples);
                Self::keyframed(keyframes).ok_or(LottieError::NoKeyframes { property: name })
            }
        }
    }

    pub fn is_animated(&self) -> bool {
        match &self.source {
            Source::Static(_) => false,
            Source::Keyframed(track) => track.is_animated(),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Installs or clears the override. The next `set_frame` re-evaluates.
    pub fn set_callback(&mut self, callback: Option<ValueFn<T>>) {
        self.callback = callback;
        self.evaluated_at = None;
    }

    /// Re-evaluates at `ctx`. Returns true when the value changed.
    pub fn set_frame(&mut self, ctx: FrameContext) -> bool {
        if self.evaluated_at == Some(ctx) && self.callback.is_none() {
            return false;
        }
        if self.evaluated_at.is_some() && self.callback.is_none() && !self.is_animated() {
            return false;
        }
        self.evaluated_at = Some(ctx);

        let next = match &self.source {
            Source::Static(v) => match &self.callback {
                None => v.clone(),
                Some(cb) => cb(&FrameInfo {
                    start_frame: ctx.frame,
                    end_frame: ctx.frame,
                    start_value: v.clone(),
                    end_value: v.clone(),
                    linear_keyframe_progress: 0.0,
                    interpolated_keyframe_progress: 0.0,
                    overall_progress: ctx.progress,
                    keyframe_value: v.clone(),
                }),
            },
            Source::Keyframed(track) => {
                let sample = track.evaluate(ctx.frame);
                match &self.callback {
                    None => sample.value,
                    Some(cb) => cb(&FrameInfo {
                        start_frame: sample.keyframe.start_frame,
                        end_frame: sample.keyframe.end_frame,
                        start_value: sample.keyframe.start_value.clone(),
                        end_value: sample.keyframe.end_value.clone(),
                        linear_keyframe_progress: sample.linear_progress,
                        interpolated_keyframe_progress: sample.interpolated_progress,
                        overall_progress: ctx.progress,
                        keyframe_value: sample.value,
                    }),
                }
            }
        };

        if next != self.value {
            self.value = next;
            self.version += 1;
            true
        } else {
            false
        }
    }
}

impl AnimatedValue<f32> {
    pub fn get(&self) -> f32 {
        self.value
    }
}

impl AnimatedValue<Vec2> {
    pub fn get(&self) -> Vec2 {
        self.value
    }
}

impl AnimatedValue<Vec4> {
    pub fn get(&self) -> Vec4 {
        self.value
    }
}

pub(crate) fn vec2(v: &[f32; 2]) -> Vec2 {
    Vec2::new(v[0], v[1])
}

/// RGB or RGBA with alpha defaulting to opaque.
pub(crate) fn color(v: &Vec<f32>) -> Vec4 {
    let c = |i: usize, d: f32| v.get(i).copied().unwrap_or(d);
    Vec4::new(c(0, 0.0), c(1, 0.0), c(2, 0.0), c(3, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottie_data::model::{Keyframe as DataKeyframe, Property, Value};

    fn kf(t: f32, s: f32) -> DataKeyframe<f32> {
        DataKeyframe {
            t,
            s: Some(s),
            e: None,
            i: None,
            o: None,
            to: None,
            ti: None,
            h: None,
        }
    }

    fn at(frame: f32) -> FrameContext {
        FrameContext { frame, progress: 0.0 }
    }

    fn animated(frames: Vec<DataKeyframe<f32>>) -> AnimatedValue<f32> {
        let prop = Property {
            a: 1,
            k: Value::Animated(frames),
            ix: None,
        };
        AnimatedValue::from_property("test", &prop, |v| *v, 0.0, 64).unwrap()
    }

    #[test]
    fn test_animator_resolve_binary_search() {
        let mut value = animated(vec![kf(0.0, 0.0), kf(10.0, 10.0), kf(20.0, 20.0)]);

        for (frame, expected) in [(0.0, 0.0), (5.0, 5.0), (10.0, 10.0), (15.0, 15.0), (25.0, 20.0)] {
            value.set_frame(at(frame));
            assert!(
                (value.get() - expected).abs() < 1e-4,
                "frame {} expected {} got {}",
                frame,
                expected,
                value.get()
            );
        }
    }

    #[test]
    fn test_hold_keyframe() {
        let mut first = kf(0.0, 3.0);
        first.h = Some(1);
        let mut value = animated(vec![first, kf(10.0, 7.0)]);

        value.set_frame(at(0.0));
        assert_eq!(value.get(), 3.0);
        value.set_frame(at(9.99));
        assert_eq!(value.get(), 3.0);
        value.set_frame(at(10.0));
        assert_eq!(value.get(), 7.0);
    }

    #[test]
    fn test_version_bumps_only_on_change() {
        let mut value = animated(vec![kf(0.0, 0.0), kf(10.0, 10.0)]);
        value.set_frame(at(5.0));
        let v = value.version();
        assert!(!value.set_frame(at(5.0)));
        assert_eq!(value.version(), v);

        // Past the end the value no longer changes.
        assert!(value.set_frame(at(20.0)));
        let v = value.version();
        assert!(!value.set_frame(at(30.0)));
        assert_eq!(value.version(), v);
    }

    #[test]
    fn test_static_value_evaluates_once() {
        let mut value = AnimatedValue::fixed(5.0f32);
        assert!(!value.set_frame(at(0.0)));
        assert!(!value.set_frame(at(10.0)));
        assert_eq!(value.version(), 0);
        assert!(!value.is_animated());
    }

    #[test]
    fn test_callback_sees_frame_info() {
        let mut value = animated(vec![kf(0.0, 0.0), kf(10.0, 100.0)]);
        value.set_callback(Some(Rc::new(|info: &FrameInfo<f32>| {
            assert_eq!(info.start_frame, 0.0);
            assert_eq!(info.end_frame, 10.0);
            assert_eq!(info.end_value, 100.0);
            info.keyframe_value * 2.0
        })));
        value.set_frame(at(5.0));
        assert!((value.get() - 100.0).abs() < 1e-4);

        value.set_callback(None);
        value.set_frame(at(5.0));
        assert!((value.get() - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_keyframes_are_rejected() {
        let prop: Property<f32> = Property {
            a: 1,
            k: Value::Animated(vec![]),
            ix: None,
        };
        let err = AnimatedValue::from_property("o", &prop, |v| *v, 0.0, 64).unwrap_err();
        assert!(matches!(err, LottieError::NoKeyframes { property: "o" }));
    }

    #[test]
    fn test_shape_lerp_uses_common_vertices() {
        let a = BezierPath {
            c: true,
            v: vec![[0.0, 0.0], [10.0, 0.0]],
            i: vec![[0.0, 0.0]; 2],
            o: vec![[0.0, 0.0]; 2],
        };
        let b = BezierPath {
            c: true,
            v: vec![[0.0, 10.0], [10.0, 10.0], [5.0, 5.0]],
            i: vec![[0.0, 0.0]; 3],
            o: vec![[0.0, 0.0]; 3],
        };
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.v, vec![[0.0, 5.0], [10.0, 5.0]]);
    }
}
