use thiserror::Error;

/// Failures raised while building a composition or installing overrides.
///
/// Per-frame evaluation never produces these; degenerate values there
/// (zero-length paths, empty trims, non-positive stroke widths) are no-ops.
#[derive(Debug, Error)]
pub enum LottieError {
    #[error("animated property `{property}` has no usable keyframes")]
    NoKeyframes { property: &'static str },

    #[error("shape `{shape}` is missing required property `{property}`")]
    MissingProperty { shape: String, property: &'static str },

    #[error("unsupported shape item inside `{group}`")]
    UnknownShape { group: String },

    #[error("property {property:?} expects a {expected} callback")]
    PropertyTypeMismatch {
        property: crate::key_path::LottieProperty,
        expected: &'static str,
    },

    #[error("invalid key path: {0}")]
    InvalidKeyPath(String),

    #[error("no composition loaded")]
    NotLoaded,

    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LottieError>;
