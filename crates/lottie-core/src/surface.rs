//! The drawing contract between the engine and a rasterizer.
//!
//! Paths arrive already mapped into the surface's current coordinate space;
//! gradient brushes carry the matrix that maps their points there.

use crate::gradient::GradientBrush;
use glam::{Mat3, Vec4};
use kurbo::{BezPath, Rect};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashPattern {
    pub array: Vec<f32>,
    pub offset: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash: Option<DashPattern>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintStyle {
    Fill(FillRule),
    Stroke(StrokeStyle),
}

/// Tint applied on top of the source, keeping the source's coverage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorFilter {
    pub color: Vec4,
}

#[derive(Debug, Clone)]
pub enum PaintSource {
    /// Straight RGBA, components in 0..1.
    Solid(Vec4),
    Gradient {
        brush: Rc<GradientBrush>,
        /// Maps the brush's start/end points into surface space.
        transform: Mat3,
    },
}

#[derive(Debug, Clone)]
pub struct Paint {
    pub source: PaintSource,
    /// 0..1, multiplied into the source's own alpha.
    pub alpha: f32,
    pub style: PaintStyle,
    pub color_filter: Option<ColorFilter>,
}

pub trait Surface {
    fn draw_path(&mut self, path: &BezPath, paint: &Paint);
    fn save(&mut self);
    fn restore(&mut self);
    fn concat(&mut self, matrix: Mat3);
    fn clip_rect(&mut self, rect: Rect);
    /// Starts an offscreen layer composited with `alpha` on `end_layer`.
    fn begin_layer(&mut self, bounds: Rect, alpha: f32);
    fn end_layer(&mut self);
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    DrawPath { path: BezPath, paint: Paint },
    Save,
    Restore,
    Concat(Mat3),
    ClipRect(Rect),
    BeginLayer { bounds: Rect, alpha: f32 },
    EndLayer,
}

/// A surface that records every call. Used by tests and the inspector.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// The recorded `draw_path` calls, in order.
    pub fn draws(&self) -> impl Iterator<Item = (&BezPath, &Paint)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::DrawPath { path, paint } => Some((path, paint)),
            _ => None,
        })
    }

    pub fn draw_count(&self) -> usize {
        self.draws().count()
    }
}

impl Surface for RecordingSurface {
    fn draw_path(&mut self, path: &BezPath, paint: &Paint) {
        self.commands.push(DrawCommand::DrawPath {
            path: path.clone(),
            paint: paint.clone(),
        });
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn concat(&mut self, matrix: Mat3) {
        self.commands.push(DrawCommand::Concat(matrix));
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::ClipRect(rect));
    }

    fn begin_layer(&mut self, bounds: Rect, alpha: f32) {
        self.commands.push(DrawCommand::BeginLayer { bounds, alpha });
    }

    fn end_layer(&mut self) {
        self.commands.push(DrawCommand::EndLayer);
    }
}
