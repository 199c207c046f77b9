/// Error types for scene, camera and configuration setup
///
/// The per-frame render path never produces these: degenerate geometry is
/// skipped for the frame instead of failing it.

/// Errors raised while building the inputs of the pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("camera orientation vector must be finite and non-zero")]
    DegenerateOrientation,

    #[error("object '{object}': {kind} references point {index}, but only {count} points exist")]
    IndexOutOfRange {
        object: String,
        kind: &'static str,
        index: usize,
        count: usize,
    },

    #[error("object '{object}': surface {surface} has {len} vertices, at least 3 are required")]
    SurfaceTooSmall {
        object: String,
        surface: usize,
        len: usize,
    },

    #[error("scene parse error at line {line}: {message}")]
    SceneParse { line: usize, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
