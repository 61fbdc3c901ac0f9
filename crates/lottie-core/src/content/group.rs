use super::ContentId;
use crate::animatable::{AnimatedValue, FrameContext};
use crate::key_path::{LottieProperty, ValueCallback};
use crate::path_ops::PathOp;
use crate::transform::TransformAnimation;
use crate::Result;
use glam::Mat3;
use lottie_data::model as data;

#[derive(Debug)]
pub struct GroupContent {
    /// Children in list order, after greedy absorption.
    pub(crate) children: Vec<ContentId>,
    /// The path-bearing subset of `children`, in list order.
    pub(crate) path_children: Vec<ContentId>,
    pub(crate) transform: Option<TransformAnimation>,
    /// Layer roots and repeater bodies: transparent to key paths.
    pub(crate) container: bool,
}

impl GroupContent {
    pub fn new(transform: Option<TransformAnimation>, container: bool) -> Self {
        Self {
            children: Vec::new(),
            path_children: Vec::new(),
            transform,
            container,
        }
    }

    pub fn children(&self) -> &[ContentId] {
        &self.children
    }

    pub fn is_container(&self) -> bool {
        self.container
    }

    pub fn set_frame(&mut self, ctx: FrameContext) -> bool {
        self.transform.as_mut().is_some_and(|t| t.set_frame(ctx))
    }

    pub fn version(&self) -> u64 {
        self.transform.as_ref().map_or(0, |t| t.version())
    }

    pub fn matrix(&self) -> Mat3 {
        self.transform.as_ref().map_or(Mat3::IDENTITY, |t| t.matrix())
    }

    /// 0..100
    pub fn opacity(&self) -> f32 {
        self.transform.as_ref().map_or(100.0, |t| t.opacity())
    }

    pub fn apply_value_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        match &mut self.transform {
            Some(t) => t.apply_value_callback(property, callback),
            None => Ok(false),
        }
    }
}

/// Draws its absorbed siblings `copies` times, each copy one more step of
/// its own transform away from the first.
#[derive(Debug)]
pub struct RepeaterContent {
    copies: AnimatedValue<f32>,
    offset: AnimatedValue<f32>,
    pub(crate) transform: TransformAnimation,
    /// The private group holding everything this repeater absorbed.
    pub(crate) group: Option<ContentId>,
}

impl RepeaterContent {
    pub fn from_data(rp: &data::RepeaterShape, samples: usize) -> Result<Self> {
        Ok(Self {
            copies: AnimatedValue::from_property("c", &rp.c, |v| *v, 1.0, samples)?,
            offset: AnimatedValue::from_property("o", &rp.o, |v| *v, 0.0, samples)?,
            transform: TransformAnimation::from_repeater(&rp.tr, samples)?,
            group: None,
        })
    }

    pub fn set_frame(&mut self, ctx: FrameContext) -> bool {
        self.copies.set_frame(ctx) | self.offset.set_frame(ctx) | self.transform.set_frame(ctx)
    }

    pub fn version(&self) -> u64 {
        self.copies.version() + self.offset.version() + self.transform.version()
    }

    /// Whole copies drawn; negative and fractional counts truncate.
    pub fn copies(&self) -> usize {
        self.copies.get().max(0.0) as usize
    }

    pub fn offset(&self) -> f32 {
        self.offset.get()
    }

    /// Matrix of copy `index` relative to the repeater's parent.
    pub fn copy_matrix(&self, index: usize) -> Mat3 {
        self.transform
            .matrix_for_repeater(index as f32 + self.offset())
    }

    /// Alpha multiplier of copy `index`, interpolated from the start to the
    /// end opacity across the copies.
    pub fn copy_alpha(&self, index: usize) -> f32 {
        let copies = self.copies.get();
        let t = if copies > 0.0 {
            ((index as f32 + self.offset()) / copies).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let start = self.transform.start_opacity() / 100.0;
        let end = self.transform.end_opacity() / 100.0;
        start + (end - start) * t
    }

    pub fn apply_value_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        match property {
            LottieProperty::RepeaterCopies => self
                .copies
                .set_callback(ValueCallback::float_fn(property, callback)?),
            LottieProperty::RepeaterOffset => self
                .offset
                .set_callback(ValueCallback::float_fn(property, callback)?),
            _ => return self.transform.apply_value_callback(property, callback),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    Merge,
    Add,
    Subtract,
    Intersect,
    ExcludeIntersections,
}

impl MergeMode {
    pub fn from_data(mm: u8) -> Self {
        match mm {
            2 => MergeMode::Add,
            3 => MergeMode::Subtract,
            4 => MergeMode::Intersect,
            5 => MergeMode::ExcludeIntersections,
            _ => MergeMode::Merge,
        }
    }

    /// The boolean operator this mode delegates to; `None` for plain merging.
    pub fn path_op(self) -> Option<PathOp> {
        match self {
            MergeMode::Merge => None,
            MergeMode::Add => Some(PathOp::Union),
            MergeMode::Subtract => Some(PathOp::Difference),
            MergeMode::Intersect => Some(PathOp::Intersect),
            MergeMode::ExcludeIntersections => Some(PathOp::Xor),
        }
    }
}

#[derive(Debug)]
pub struct MergePathsContent {
    pub mode: MergeMode,
    /// Absorbed path contents in list order.
    pub(crate) absorbed: Vec<ContentId>,
    pub(crate) resolved: bool,
}

impl MergePathsContent {
    pub fn from_data(mm: &data::MergePathsShape) -> Self {
        Self {
            mode: MergeMode::from_data(mm.mm),
            absorbed: Vec::new(),
            resolved: false,
        }
    }
}
