use std::path::PathBuf;

/// Errors raised while loading external masks or configuration.
///
/// None of these cross [`generate_masks`](crate::masks::generate_masks): the
/// engine turns them into neutral masks plus a diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum MaskError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode mask image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ::image::ImageError,
    },
    #[error("mask image {0} has no pixels")]
    EmptyMask(PathBuf),
    #[error("invalid mask path: {0:?}")]
    InvalidPath(String),
    #[error("invalid engine configuration: {0}")]
    Config(#[from] serde_json::Error),
}
