//! Stencil Core: regional mask engine for local adjustments.
//!
//! This crate builds the per-region masks that restrict an adjustment to
//! part of an image: parametric color selections, geometric areas, brush
//! strokes, color-difference picks, external mask files and masks linked
//! from other tools. No UI or framework dependencies.

pub mod buffer;
pub mod cache;
pub mod color;
pub mod config;
pub mod error;
pub mod image;
pub mod masks;
pub mod params;
pub mod parallel;
pub mod progress;

// Re-exports for convenience.
pub use buffer::Array2D;
pub use cache::{Cache, CacheHook};
pub use color::LchColor;
pub use config::EngineConfig;
pub use error::MaskError;
pub use crate::image::RgbImage;
pub use masks::{
    ExternalMaskManager, GeneratedMasks, LinkedMaskManager, MaskDecoder, MaskGeometry,
    MasksEditId, fill_pipette_masks, generate_masks, get_delta_e_color,
};
pub use params::{Mask, ProcParams, RegionList, ToolMasks};
pub use progress::ProgressListener;
