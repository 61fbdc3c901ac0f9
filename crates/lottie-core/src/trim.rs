use crate::animatable::{AnimatedValue, FrameContext};
use crate::key_path::{LottieProperty, ValueCallback};
use crate::path::PathMeasure;
use crate::Result;
use kurbo::BezPath;
use lottie_data::model as data;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimMode {
    /// Every shape the trim applies to is trimmed on its own.
    Simultaneously,
    /// The paths of a stroke are trimmed as one continuous run.
    Individually,
}

#[derive(Debug)]
pub struct TrimPathContent {
    pub mode: TrimMode,
    /// Percent, 0..100
    start: AnimatedValue<f32>,
    end: AnimatedValue<f32>,
    /// Degrees, 360 = one full path length
    offset: AnimatedValue<f32>,
}

impl TrimPathContent {
    pub fn from_data(tm: &data::TrimShape, samples: usize) -> Result<Self> {
        Ok(Self {
            mode: if tm.m == 2 {
                TrimMode::Individually
            } else {
                TrimMode::Simultaneously
            },
            start: AnimatedValue::from_property("s", &tm.s, |v| *v, 0.0, samples)?,
            end: AnimatedValue::from_property("e", &tm.e, |v| *v, 100.0, samples)?,
            offset: AnimatedValue::from_property("o", &tm.o, |v| *v, 0.0, samples)?,
        })
    }

    pub fn set_frame(&mut self, ctx: FrameContext) -> bool {
        self.start.set_frame(ctx) | self.end.set_frame(ctx) | self.offset.set_frame(ctx)
    }

    pub fn version(&self) -> u64 {
        self.start.version() + self.end.version() + self.offset.version()
    }

    pub fn start(&self) -> f32 {
        self.start.get()
    }

    pub fn end(&self) -> f32 {
        self.end.get()
    }

    pub fn offset(&self) -> f32 {
        self.offset.get()
    }

    /// Trims `path` in place with this node's current values.
    pub fn apply(&self, path: &mut BezPath, accuracy: f64) {
        apply_trim(
            path,
            self.start() / 100.0,
            self.end() / 100.0,
            self.offset() / 360.0,
            accuracy,
        );
    }

    pub fn apply_value_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        let target = match property {
            LottieProperty::TrimStart => &mut self.start,
            LottieProperty::TrimEnd => &mut self.end,
            LottieProperty::TrimOffset => &mut self.offset,
            _ => return Ok(false),
        };
        target.set_callback(ValueCallback::float_fn(property, callback)?);
        Ok(true)
    }
}

/// Keeps the stretch of `path` between `start` and `end` (fractions of its
/// total length), rotated by `offset` (also a fraction). Stretches running
/// past either end wrap around to the other.
pub fn apply_trim(path: &mut BezPath, start: f32, end: f32, offset: f32, accuracy: f64) {
    if start == 1.0 && end == 0.0 {
        return;
    }
    let measure = PathMeasure::new(path, accuracy);
    let length = measure.length();
    if length < 1.0 || (end - start - 1.0).abs() < 0.01 {
        return;
    }

    let a = length * start as f64;
    let b = length * end as f64;
    let offset = length * offset as f64;
    let mut new_start = a.min(b) + offset;
    let mut new_end = a.max(b) + offset;

    // A trim rotated fully past the end shifts back onto the path.
    if new_start >= length && new_end >= length {
        new_start = new_start.rem_euclid(length);
        new_end = new_end.rem_euclid(length);
    }
    if new_start < 0.0 {
        new_start = new_start.rem_euclid(length);
    }
    if new_end < 0.0 {
        new_end = new_end.rem_euclid(length);
    }

    if new_start == new_end {
        path.truncate(0);
        return;
    }
    if new_start >= new_end {
        new_start -= length;
    }

    // Refilled in place.
    path.truncate(0);
    measure.segment(new_start, new_end, path);
    if new_end > length {
        measure.segment(0.0, new_end % length, path);
    } else if new_start < 0.0 {
        measure.segment(length + new_start, length, path);
    }
}

/// What to draw of one path in an individually trimmed stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrimSegment {
    Skip,
    Whole,
    /// Fractions of this path's own length, fed to [`apply_trim`] with no offset.
    Partial { start: f32, end: f32 },
}

/// Splits one continuous trim window over a run of paths.
///
/// `lengths` are the paths' lengths in drawing order; `start`, `end` are
/// percentages and `offset` is in degrees. Returns `None` when the window
/// covers everything and the paths can be drawn untouched.
pub fn individual_trim_plan(
    lengths: &[f64],
    start: f32,
    end: f32,
    offset: f32,
) -> Option<Vec<TrimSegment>> {
    if start / 100.0 < 0.01 && end / 100.0 > 0.99 {
        return None;
    }
    let total: f64 = lengths.iter().sum();
    if total <= 0.0 {
        return Some(vec![TrimSegment::Skip; lengths.len()]);
    }
    let offset_length = offset as f64 * total / 360.0;
    let start_length = start as f64 * total / 100.0 + offset_length;
    let end_length = end as f64 * total / 100.0 + offset_length;

    let mut current = 0.0;
    let mut plan = Vec::with_capacity(lengths.len());
    for &length in lengths {
        if length <= 0.0 {
            plan.push(TrimSegment::Skip);
            continue;
        }
        let wrapped_end = end_length - total;
        let segment = if end_length > total
            && wrapped_end < current + length
            && current < wrapped_end
        {
            // The window wraps around to the beginning.
            let s = if start_length > total {
                (start_length - total) / length
            } else {
                0.0
            };
            let e = (wrapped_end / length).min(1.0);
            TrimSegment::Partial {
                start: s as f32,
                end: e as f32,
            }
        } else if current + length < start_length || current > end_length {
            TrimSegment::Skip
        } else if current + length <= end_length && start_length < current {
            TrimSegment::Whole
        } else {
            let s = if start_length < current {
                0.0
            } else {
                (start_length - current) / length
            };
            let e = if end_length > current + length {
                1.0
            } else {
                (end_length - current) / length
            };
            TrimSegment::Partial {
                start: s as f32,
                end: e as f32,
            }
        };
        plan.push(segment);
        current += length;
    }
    Some(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(len: f64) -> BezPath {
        let mut p = BezPath::new();
        p.move_to((0.0, 0.0));
        p.line_to((len, 0.0));
        p
    }

    fn length(path: &BezPath) -> f64 {
        PathMeasure::new(path, 0.01).length()
    }

    #[test]
    fn test_full_trim_is_identity() {
        let mut path = line(100.0);
        let before = path.clone();
        apply_trim(&mut path, 0.0, 1.0, 0.0, 0.01);
        assert_eq!(path, before);
        // Any rotation of a full window is still the identity.
        apply_trim(&mut path, 0.0, 1.0, 0.37, 0.01);
        assert_eq!(path, before);
    }

    #[test]
    fn test_wraparound_keeps_both_ends() {
        let mut path = line(100.0);
        apply_trim(&mut path, 0.8, 1.2, 0.0, 0.01);
        assert!((length(&path) - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_offset_rotates_window() {
        let mut path = line(100.0);
        apply_trim(&mut path, 0.0, 0.5, 0.25, 0.01);
        assert!((length(&path) - 50.0).abs() < 1e-6);
        let first = path.elements()[0];
        assert_eq!(first, kurbo::PathEl::MoveTo(kurbo::Point::new(25.0, 0.0)));
    }

    #[test]
    fn test_equal_start_and_end_clears() {
        let mut path = line(100.0);
        apply_trim(&mut path, 0.3, 0.3, 0.0, 0.01);
        assert!(path.elements().is_empty());
    }

    #[test]
    fn test_short_paths_are_untouched() {
        let mut path = line(0.5);
        let before = path.clone();
        apply_trim(&mut path, 0.2, 0.4, 0.0, 0.01);
        assert_eq!(path, before);
    }

    #[test]
    fn test_individual_plan_full_window() {
        assert_eq!(individual_trim_plan(&[10.0, 20.0], 0.0, 100.0, 0.0), None);
    }

    #[test]
    fn test_individual_plan_boundaries() {
        // Window [50, 100] over two paths of 50 each.
        let plan = individual_trim_plan(&[50.0, 50.0], 50.0, 100.0, 0.0).unwrap();
        // The first path ends exactly where the window starts: an empty partial.
        assert_eq!(plan[0], TrimSegment::Partial { start: 1.0, end: 1.0 });
        // The second starts exactly at the window start and ends at its end.
        assert_eq!(plan[1], TrimSegment::Partial { start: 0.0, end: 1.0 });
    }

    #[test]
    fn test_individual_plan_skip_whole_partial() {
        // Window [25, 75] over four paths of 25: currentLength == startLength
        // on the second, currentLength + length == endLength on the third.
        let plan = individual_trim_plan(&[25.0; 4], 25.0, 75.0, 0.0).unwrap();
        assert_eq!(plan[0], TrimSegment::Partial { start: 1.0, end: 1.0 });
        assert_eq!(plan[1], TrimSegment::Partial { start: 0.0, end: 1.0 });
        assert_eq!(plan[2], TrimSegment::Whole);
        assert_eq!(plan[3], TrimSegment::Partial { start: 0.0, end: 0.0 });

        let plan = individual_trim_plan(&[10.0, 10.0, 80.0], 30.0, 60.0, 0.0).unwrap();
        assert_eq!(plan[0], TrimSegment::Skip);
        assert_eq!(plan[1], TrimSegment::Skip);
        assert_eq!(plan[2], TrimSegment::Partial { start: 0.125, end: 0.5 });
    }

    #[test]
    fn test_individual_plan_degenerate_lengths() {
        let plan = individual_trim_plan(&[0.0, 0.0], 20.0, 60.0, 0.0).unwrap();
        assert_eq!(plan, vec![TrimSegment::Skip, TrimSegment::Skip]);

        // A zero-length path between real ones is skipped without disturbing the rest.
        let plan = individual_trim_plan(&[50.0, 0.0, 50.0], 25.0, 75.0, 0.0).unwrap();
        assert_eq!(plan[0], TrimSegment::Partial { start: 0.5, end: 1.0 });
        assert_eq!(plan[1], TrimSegment::Skip);
        assert_eq!(plan[2], TrimSegment::Partial { start: 0.0, end: 0.5 });
    }

    #[test]
    fn test_individual_plan_wraps() {
        // A 36 degree offset is 10 units: the window [100, 110] wraps onto the first path.
        let plan = individual_trim_plan(&[50.0, 50.0], 90.0, 100.0, 36.0).unwrap();
        assert_eq!(plan[0], TrimSegment::Partial { start: 0.0, end: 0.2 });
        assert_eq!(plan[1], TrimSegment::Partial { start: 1.0, end: 1.0 });
    }
}
