//! Masks loaded from image files, with a shared decode cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::buffer::Array2D;
use crate::cache::{Cache, CacheHook};
use crate::config::EngineConfig;
use crate::error::MaskError;
use crate::parallel;
use crate::progress::{ProgressListener, report_error};

use super::filter::guided_filter;

/// Turns a file into a single-channel 0..1 mask.
pub trait MaskDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Array2D<f32>, MaskError>;
}

/// Default decoder: any format the `image` crate reads, reduced to luminance.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFileDecoder;

impl MaskDecoder for ImageFileDecoder {
    fn decode(&self, path: &Path) -> Result<Array2D<f32>, MaskError> {
        if path.as_os_str().is_empty() {
            return Err(MaskError::InvalidPath(String::new()));
        }
        let img = ::image::open(path).map_err(|err| match err {
            ::image::ImageError::IoError(source) => MaskError::Io {
                path: path.to_path_buf(),
                source,
            },
            source => MaskError::Decode {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let luma = img.to_luma32f();
        let (w, h) = luma.dimensions();
        if w == 0 || h == 0 {
            return Err(MaskError::EmptyMask(path.to_path_buf()));
        }
        Array2D::from_vec(w as usize, h as usize, luma.into_raw())
            .ok_or_else(|| MaskError::EmptyMask(path.to_path_buf()))
    }
}

type DecodedMask = Arc<Array2D<f32>>;

struct EvictionLog;

impl CacheHook<PathBuf, DecodedMask> for EvictionLog {
    fn on_discard(&self, key: &PathBuf, _value: &DecodedMask) {
        tracing::debug!(path = %key.display(), "external mask evicted");
    }

    fn on_displace(&self, key: &PathBuf, _value: &DecodedMask) {
        tracing::debug!(path = %key.display(), "external mask replaced");
    }

    fn on_destroy(&self) {
        tracing::debug!("external mask cache destroyed");
    }
}

/// Decodes external mask files once and serves them to every region that
/// references them.
///
/// `Send + Sync`; one manager may be shared between documents.
pub struct ExternalMaskManager {
    cache: Cache<PathBuf, DecodedMask>,
    decoder: Arc<dyn MaskDecoder>,
}

impl ExternalMaskManager {
    /// Manager with the default [`ImageFileDecoder`].
    pub fn new(capacity: usize) -> Self {
        Self::with_decoder(capacity, Arc::new(ImageFileDecoder))
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.external_cache_capacity)
    }

    pub fn with_decoder(capacity: usize, decoder: Arc<dyn MaskDecoder>) -> Self {
        Self {
            cache: Cache::with_hook(capacity, Arc::new(EvictionLog)),
            decoder,
        }
    }

    /// Start a session with an empty cache.
    pub fn init(&self) {
        self.cache.clear();
        tracing::info!(capacity = self.cache.capacity(), "external mask cache ready");
    }

    /// Release every decoded mask.
    pub fn cleanup(&self) {
        let released = self.cache.len();
        self.cache.clear();
        tracing::info!(released, "external mask cache cleaned up");
    }

    /// Number of decoded masks currently cached.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn load(&self, path: &Path) -> Result<DecodedMask, MaskError> {
        if let Some(hit) = self.cache.get(path) {
            tracing::debug!(path = %path.display(), "external mask cache hit");
            return Ok(hit);
        }
        tracing::debug!(path = %path.display(), "external mask cache miss");
        let decoded = Arc::new(self.decoder.decode(path)?);
        if decoded.is_empty() {
            return Err(MaskError::EmptyMask(path.to_path_buf()));
        }
        self.cache.set(path.to_path_buf(), Arc::clone(&decoded));
        Ok(decoded)
    }

    /// Write the mask stored at `path` into `out`, resampled to the crop.
    ///
    /// The file spans the whole `full_width × full_height` frame; `out` is
    /// resized to `guide` and crop pixel `(x, y)` samples the file at
    /// `(x + offset_x, y + offset_y)`. A positive `feather` (processing
    /// pixels) runs a guided filter against `guide`.
    ///
    /// On failure returns `false`, reports to `listener` and leaves `out`
    /// untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_mask(
        &self,
        path: &Path,
        inverted: bool,
        feather: f32,
        offset_x: i32,
        offset_y: i32,
        full_width: u32,
        full_height: u32,
        guide: &Array2D<f32>,
        out: &mut Array2D<f32>,
        multithread: bool,
        listener: Option<&dyn ProgressListener>,
    ) -> bool {
        let src = match self.load(path) {
            Ok(src) => src,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "external mask unavailable");
                report_error(listener, &err.to_string());
                return false;
            }
        };

        let (sw, sh) = (src.width() as f32, src.height() as f32);
        let sx = sw / full_width.max(1) as f32;
        let sy = sh / full_height.max(1) as f32;
        let mut resampled = parallel::build(guide.width(), guide.height(), multithread, |x, y| {
            let fx = (x as f32 + offset_x as f32 + 0.5) * sx - 0.5;
            let fy = (y as f32 + offset_y as f32 + 0.5) * sy - 0.5;
            bilinear(&src, fx, fy)
        });

        let radius = feather.round();
        if radius >= 1.0 {
            resampled = guided_filter(guide, &resampled, radius as usize, multithread);
        }

        out.resize(guide.width(), guide.height(), 0.0);
        parallel::map_into(&resampled, out, multithread, |&v| {
            let v = v.clamp(0.0, 1.0);
            if inverted { 1.0 - v } else { v }
        });
        true
    }
}

/// Sample `src` at a fractional position, clamping to the edges.
fn bilinear(src: &Array2D<f32>, fx: f32, fy: f32) -> f32 {
    let max_x = (src.width() - 1) as f32;
    let max_y = (src.height() - 1) as f32;
    let fx = fx.clamp(0.0, max_x);
    let fy = fy.clamp(0.0, max_y);
    let (x0, y0) = (fx.floor() as usize, fy.floor() as usize);
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);
    let (tx, ty) = (fx - x0 as f32, fy - y0 as f32);
    let top = src[(x0, y0)] * (1.0 - tx) + src[(x1, y0)] * tx;
    let bottom = src[(x0, y1)] * (1.0 - tx) + src[(x1, y1)] * tx;
    top * (1.0 - ty) + bottom * ty
}
