//! Layers on top of the content graph: timing, parenting and addressing.

use crate::animatable::FrameContext;
use crate::config::PlayerConfig;
use crate::content::{ContentGraph, ContentId, GraphBuilder, GraphSettings};
use crate::key_path::{KeyPath, KeyPathTarget, LottieProperty, ResolvedKeyPath, ValueCallback};
use crate::path::union_bounds;
use crate::path_ops::PathOps;
use crate::surface::Surface;
use crate::transform::TransformAnimation;
use crate::Result;
use glam::Mat3;
use kurbo::Rect;
use lottie_data::model::{self as data, LottieJson};
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

const SHAPE_LAYER: u8 = 4;
const NULL_LAYER: u8 = 3;

#[derive(Debug)]
pub struct LayerContent {
    pub name: String,
    in_point: f32,
    out_point: f32,
    start_time: f32,
    time_stretch: f32,
    transform: TransformAnimation,
    /// Slot of the parent layer in `Composition::layers`.
    parent: Option<usize>,
    /// `None` for null layers and hidden layers, which only parent others.
    root: Option<ContentId>,
    nodes: Range<usize>,
    world: Mat3,
}

impl LayerContent {
    pub fn is_active(&self, frame: f32) -> bool {
        self.in_point <= frame && frame < self.out_point
    }

    pub fn root(&self) -> Option<ContentId> {
        self.root
    }

    /// Number of content nodes built for this layer.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn frame_range(&self) -> (f32, f32) {
        (self.in_point, self.out_point)
    }

    /// Matrix from layer space to composition space at the current frame.
    pub fn world_matrix(&self) -> Mat3 {
        self.world
    }

    fn local_frame(&self, frame: f32) -> f32 {
        let stretch = if self.time_stretch == 0.0 {
            1.0
        } else {
            self.time_stretch
        };
        (frame - self.start_time) / stretch
    }

    fn alpha(&self) -> u8 {
        (self.transform.opacity().clamp(0.0, 100.0) / 100.0 * 255.0) as u8
    }
}

/// A loaded scene: every layer's content graph plus the composition clock.
#[derive(Debug)]
pub struct Composition {
    pub width: f32,
    pub height: f32,
    pub in_point: f32,
    pub out_point: f32,
    pub frame_rate: f32,
    layers: Vec<LayerContent>,
    graph: ContentGraph,
    frame: f32,
}

impl Composition {
    pub fn new(model: &LottieJson, config: &PlayerConfig, path_ops: Rc<dyn PathOps>) -> Result<Self> {
        let duration_frames = (model.op - model.ip).max(0.0);
        let duration_ms = if model.fr > 0.0 {
            duration_frames / model.fr * 1000.0
        } else {
            0.0
        };
        let settings = GraphSettings {
            accuracy: config.arc_length_accuracy,
            apply_opacity_to_layers: config.apply_opacity_to_layers,
            cache_steps: config.gradient_cache_steps(duration_ms),
        };
        let exact = path_ops.is_exact();
        let mut graph = ContentGraph::new(settings, path_ops);
        let samples = config.spatial_table_samples;

        let mut layers = Vec::with_capacity(model.layers.len());
        let mut indices: Vec<Option<u32>> = Vec::with_capacity(model.layers.len());
        let mut parents: Vec<Option<u32>> = Vec::with_capacity(model.layers.len());
        let mut absorptions = 0;
        for layer in &model.layers {
            if layer.ty != SHAPE_LAYER && layer.ty != NULL_LAYER {
                tracing::warn!(ty = layer.ty, name = ?layer.nm, "skipping unsupported layer type");
                continue;
            }
            let name = layer.nm.clone().unwrap_or_default();
            let start = graph.len();
            let drawn = layer.ty == SHAPE_LAYER && !layer.hd.unwrap_or(false);
            let root = if drawn {
                let mut builder = GraphBuilder::new(&mut graph, samples, config.strict);
                let root = builder.build_root(&name, &layer.shapes)?;
                absorptions += builder.absorptions;
                Some(root)
            } else {
                None
            };
            layers.push(LayerContent {
                name,
                in_point: layer.ip,
                out_point: layer.op,
                start_time: layer.st,
                time_stretch: layer.sr,
                transform: TransformAnimation::from_data(&layer.ks, samples)?,
                parent: None,
                root,
                nodes: start..graph.len(),
                world: Mat3::IDENTITY,
            });
            indices.push(layer.ind);
            parents.push(layer.parent);
        }

        let by_index: HashMap<u32, usize> = indices
            .iter()
            .enumerate()
            .filter_map(|(slot, ind)| ind.map(|i| (i, slot)))
            .collect();
        for (layer, parent) in layers.iter_mut().zip(&parents) {
            layer.parent = parent.and_then(|p| by_index.get(&p).copied());
        }

        let boolean_merges = graph.boolean_merges();
        if boolean_merges > 0 && !exact {
            tracing::warn!(
                count = boolean_merges,
                "no boolean path backend installed; merge paths fall back to concatenation"
            );
        }
        tracing::debug!(
            layers = layers.len(),
            nodes = graph.len(),
            absorptions,
            "composition built"
        );

        let mut composition = Self {
            width: model.w as f32,
            height: model.h as f32,
            in_point: model.ip,
            out_point: model.op,
            frame_rate: model.fr,
            layers,
            graph,
            frame: model.ip,
        };
        composition.evaluate();
        Ok(composition)
    }

    pub fn layers(&self) -> &[LayerContent] {
        &self.layers
    }

    pub fn graph(&self) -> &ContentGraph {
        &self.graph
    }

    pub fn frame(&self) -> f32 {
        self.frame
    }

    pub fn duration_frames(&self) -> f32 {
        (self.out_point - self.in_point).max(0.0)
    }

    /// Global progress of `frame` in 0..=1.
    pub fn progress_at(&self, frame: f32) -> f32 {
        let duration = self.duration_frames();
        if duration <= 0.0 {
            return 0.0;
        }
        ((frame - self.in_point) / duration).clamp(0.0, 1.0)
    }

    pub fn set_frame(&mut self, frame: f32) {
        self.frame = frame;
        self.evaluate();
    }

    pub fn set_progress(&mut self, progress: f32) {
        let frame = self.in_point + progress.clamp(0.0, 1.0) * self.duration_frames();
        self.set_frame(frame);
    }

    fn evaluate(&mut self) {
        let progress = self.progress_at(self.frame);
        for layer in &mut self.layers {
            let ctx = FrameContext {
                frame: layer.local_frame(self.frame),
                progress,
            };
            layer.transform.set_frame(ctx);
            self.graph.set_frame(layer.nodes.clone(), ctx);
        }
        for slot in 0..self.layers.len() {
            self.layers[slot].world = self.world_matrix(slot);
        }
        self.graph.update_paths();
    }

    fn world_matrix(&self, slot: usize) -> Mat3 {
        let mut matrix = self.layers[slot].transform.matrix();
        let mut parent = self.layers[slot].parent;
        let mut depth = 0;
        while let Some(p) = parent {
            if depth >= self.layers.len() {
                tracing::warn!(layer = %self.layers[slot].name, "layer parent chain has a cycle");
                break;
            }
            matrix = self.layers[p].transform.matrix() * matrix;
            parent = self.layers[p].parent;
            depth += 1;
        }
        matrix
    }

    /// Draws the current frame, clipped to the composition size.
    pub fn draw(&mut self, surface: &mut dyn Surface) {
        self.draw_with_matrix(surface, Mat3::IDENTITY);
    }

    /// Draws the current frame with `matrix` mapping composition space onto
    /// the surface.
    pub fn draw_with_matrix(&mut self, surface: &mut dyn Surface, matrix: Mat3) {
        surface.save();
        surface.concat(matrix);
        surface.clip_rect(Rect::new(0.0, 0.0, self.width as f64, self.height as f64));
        for layer in self.layers.iter().rev() {
            let Some(root) = layer.root else {
                continue;
            };
            if !layer.is_active(self.frame) {
                continue;
            }
            self.graph.draw(root, surface, layer.world, layer.alpha());
        }
        surface.restore();
    }

    /// Union of the bounds of every active layer, in composition space.
    pub fn bounds(&self) -> Option<Rect> {
        self.layers
            .iter()
            .filter(|l| l.is_active(self.frame))
            .filter_map(|l| l.root.map(|root| (root, l.world)))
            .fold(None, |acc, (root, world)| {
                union_bounds(acc, self.graph.bounds(root, world))
            })
    }

    /// Every layer and content item `key_path` matches, with its full path.
    pub fn resolve_key_path(&self, key_path: &KeyPath) -> Vec<ResolvedKeyPath> {
        let mut out = Vec::new();
        let mut current = Vec::new();
        for (slot, layer) in self.layers.iter().enumerate() {
            if !key_path.matches(&layer.name, 0) {
                continue;
            }
            current.push(layer.name.clone());
            if key_path.fully_resolves_to(&layer.name, 0) {
                if let Ok(path) = KeyPath::new(current.iter().cloned()) {
                    out.push(ResolvedKeyPath {
                        path,
                        target: KeyPathTarget::Layer(slot),
                    });
                }
            }
            if let Some(root) = layer.root {
                if key_path.propagate_to_children(&layer.name, 0) {
                    let depth = key_path.increment_depth_by(&layer.name, 0);
                    self.graph
                        .resolve_key_path(root, key_path, depth, &mut current, &mut out);
                }
            }
            current.pop();
        }
        out
    }

    /// Installs `callback` on `property` of everything `key_path` matches and
    /// re-evaluates the current frame. Returns the paths that accepted it.
    pub fn add_value_callback(
        &mut self,
        key_path: &KeyPath,
        property: LottieProperty,
        callback: Option<ValueCallback>,
    ) -> Result<Vec<ResolvedKeyPath>> {
        ValueCallback::check(property, callback.as_ref())?;
        let mut applied = Vec::new();
        for resolved in self.resolve_key_path(key_path) {
            let accepted = match resolved.target {
                KeyPathTarget::Layer(slot) => self.layers[slot]
                    .transform
                    .apply_value_callback(property, callback.as_ref())?,
                KeyPathTarget::Content(id) => {
                    self.graph
                        .apply_value_callback(id, property, callback.as_ref())?
                }
            };
            if accepted {
                applied.push(resolved);
            }
        }
        tracing::debug!(%key_path, ?property, targets = applied.len(), "value callback installed");
        self.evaluate();
        Ok(applied)
    }
}

/// Number of layers in `model` the composition can draw or use as parents.
pub fn supported_layers(model: &LottieJson) -> usize {
    model
        .layers
        .iter()
        .filter(|l: &&data::Layer| l.ty == SHAPE_LAYER || l.ty == NULL_LAYER)
        .count()
}
