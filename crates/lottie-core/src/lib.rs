//! Playback engine for Lottie shape animations.
//!
//! A [`LottiePlayer`] turns a typed scene ([`lottie_data::model::LottieJson`])
//! into a [`Composition`]: per-layer content graphs of shapes, paints,
//! groups, repeaters, merges and trims. Each frame the clock re-evaluates the
//! animated values, path caches rebuild where inputs moved, and drawing emits
//! paint commands to a [`Surface`].

pub mod animatable;
pub mod composition;
pub mod config;
pub mod content;
pub mod error;
pub mod gradient;
pub mod key_path;
pub mod keyframe;
pub mod path;
pub mod path_ops;
pub mod surface;
pub mod transform;
pub mod trim;

pub use animatable::{AnimatedValue, FrameContext, FrameInfo, Interpolatable};
pub use composition::Composition;
pub use config::PlayerConfig;
pub use error::{LottieError, Result};
pub use key_path::{KeyPath, KeyPathTarget, LottieProperty, ResolvedKeyPath, ValueCallback};
pub use path_ops::{ConcatPathOps, PathOp, PathOps};
pub use surface::{DrawCommand, Paint, PaintSource, PaintStyle, RecordingSurface, Surface};

use lottie_data::model::LottieJson;
use std::rc::Rc;
use std::sync::Arc;

/// Immutable scene data shared between players.
#[derive(Debug)]
pub struct LottieAsset {
    pub model: LottieJson,
    pub width: f32,
    pub height: f32,
    pub duration_frames: f32,
    pub frame_rate: f32,
}

impl LottieAsset {
    pub fn from_model(model: LottieJson) -> Self {
        Self {
            width: model.w as f32,
            height: model.h as f32,
            duration_frames: model.op - model.ip,
            frame_rate: model.fr,
            model,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(Self::from_model(serde_json::from_str(json)?))
    }

    /// Frame of the marker named `name`.
    pub fn marker_frame(&self, name: &str) -> Option<f32> {
        self.model
            .markers
            .iter()
            .find(|m| m.cm.as_deref() == Some(name))
            .map(|m| m.tm)
    }
}

pub struct LottiePlayer {
    pub asset: Option<Arc<LottieAsset>>,
    pub current_frame: f32,
    config: PlayerConfig,
    path_ops: Rc<dyn PathOps>,
    composition: Option<Composition>,
}

impl Default for LottiePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl LottiePlayer {
    pub fn new() -> Self {
        Self::with_config(PlayerConfig::default())
    }

    pub fn with_config(config: PlayerConfig) -> Self {
        Self {
            asset: None,
            current_frame: 0.0,
            config,
            path_ops: Rc::new(ConcatPathOps),
            composition: None,
        }
    }

    /// Installs the boolean geometry backend used by merge paths. Applies to
    /// the next `load`.
    pub fn with_path_ops(mut self, path_ops: Rc<dyn PathOps>) -> Self {
        self.path_ops = path_ops;
        self
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn load(&mut self, asset: Arc<LottieAsset>) -> Result<()> {
        let composition = Composition::new(&asset.model, &self.config, Rc::clone(&self.path_ops))?;
        self.current_frame = asset.model.ip; // Start at in-point
        self.composition = Some(composition);
        self.asset = Some(asset);
        Ok(())
    }

    // Convenience load (creates new Asset wrapper)
    pub fn load_json(&mut self, data: LottieJson) -> Result<()> {
        self.load(Arc::new(LottieAsset::from_model(data)))
    }

    pub fn composition(&self) -> Option<&Composition> {
        self.composition.as_ref()
    }

    /// Moves the clock by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        let Some(asset) = &self.asset else {
            return;
        };
        let (ip, op) = (asset.model.ip, asset.model.op);
        let mut frame = self.current_frame + dt * asset.frame_rate;
        if frame >= op {
            let duration = op - ip;
            frame = if self.config.looping && duration > 0.0 {
                ip + (frame - op) % duration
            } else {
                // Last whole frame still inside the out point.
                (op - 1.0).max(ip)
            };
        }
        self.set_frame(frame);
    }

    pub fn set_frame(&mut self, frame: f32) {
        self.current_frame = frame;
        if let Some(composition) = &mut self.composition {
            composition.set_frame(frame);
        }
    }

    /// Seeks to `progress` in 0..=1 of the in..out range.
    pub fn set_progress(&mut self, progress: f32) {
        if let Some(composition) = &mut self.composition {
            composition.set_progress(progress);
            self.current_frame = composition.frame();
        }
    }

    pub fn draw(&mut self, surface: &mut dyn Surface) {
        match &mut self.composition {
            Some(composition) => composition.draw(surface),
            None => tracing::debug!("draw called before load"),
        }
    }

    pub fn resolve_key_path(&self, key_path: &KeyPath) -> Result<Vec<ResolvedKeyPath>> {
        let composition = self.composition.as_ref().ok_or(LottieError::NotLoaded)?;
        Ok(composition.resolve_key_path(key_path))
    }

    /// Overrides `property` on everything `key_path` matches; `None` clears
    /// an earlier override.
    pub fn add_value_callback(
        &mut self,
        key_path: &KeyPath,
        property: LottieProperty,
        callback: Option<ValueCallback>,
    ) -> Result<Vec<ResolvedKeyPath>> {
        let composition = self.composition.as_mut().ok_or(LottieError::NotLoaded)?;
        composition.add_value_callback(key_path, property, callback)
    }
}
