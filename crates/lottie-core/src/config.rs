use serde::{Deserialize, Serialize};

/// Player-wide knobs. Every field has a default so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Gradient brush cache granularity, in milliseconds of animation time.
    pub gradient_cache_quantum_ms: f32,
    /// Render a group into an offscreen layer when it has partial opacity
    /// and more than one drawable child.
    pub apply_opacity_to_layers: bool,
    /// Accuracy passed to kurbo arc-length queries.
    pub arc_length_accuracy: f64,
    /// Number of samples in the arc-length table of a spatial keyframe.
    pub spatial_table_samples: usize,
    /// Wrap around in `LottiePlayer::advance` instead of clamping at the end.
    pub looping: bool,
    /// Fail the build on unsupported shape items instead of skipping them.
    pub strict: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            gradient_cache_quantum_ms: 32.0,
            apply_opacity_to_layers: false,
            arc_length_accuracy: 0.01,
            spatial_table_samples: 64,
            looping: true,
            strict: false,
        }
    }
}

impl PlayerConfig {
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of gradient cache buckets across an animation of `duration_ms`.
    pub(crate) fn gradient_cache_steps(&self, duration_ms: f32) -> f32 {
        if self.gradient_cache_quantum_ms <= 0.0 {
            return 0.0;
        }
        (duration_ms / self.gradient_cache_quantum_ms).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PlayerConfig::from_json_str(r#"{"apply_opacity_to_layers": true}"#).unwrap();
        assert!(config.apply_opacity_to_layers);
        assert_eq!(config.gradient_cache_quantum_ms, 32.0);
        assert_eq!(config.spatial_table_samples, 64);
    }

    #[test]
    fn test_cache_steps() {
        let config = PlayerConfig::default();
        assert_eq!(config.gradient_cache_steps(3200.0), 100.0);
    }
}
