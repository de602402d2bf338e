//! Declarative description of one region mask.
//!
//! A [`Mask`] owns one instance of every source kind; a source contributes
//! only when its `enabled` flag is set. Geometry is expressed in normalized
//! full-image coordinates (x in 0..1 of the full width, y in 0..1 of the full
//! height) so the same descriptor works at any preview scale.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One region mask. The default is enabled with no sources, i.e. a neutral
/// (select everything) mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mask {
    /// Name under which the computed mask can be linked by other tools.
    pub name: String,
    /// A disabled mask selects everything.
    pub enabled: bool,
    /// Invert the final composite.
    pub inverted: bool,
    pub parametric: ParametricMask,
    pub area: AreaMask,
    pub delta_e: DeltaEMask,
    pub drawn: DrawnMask,
    pub linked: LinkedMask,
    pub external: ExternalMask,
    pub postprocess: MaskPostprocess,
}

impl Default for Mask {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            inverted: false,
            parametric: ParametricMask::default(),
            area: AreaMask::default(),
            delta_e: DeltaEMask::default(),
            drawn: DrawnMask::default(),
            linked: LinkedMask::default(),
            external: ExternalMask::default(),
            postprocess: MaskPostprocess::default(),
        }
    }
}

/// Selection by hue, chromaticity, and lightness curves.
///
/// Each curve maps the normalized channel value (0..1) to a weight (0..1);
/// the source value is the product of the three. An empty curve passes
/// everything. The hue curve wraps around at 0/1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParametricMask {
    pub enabled: bool,
    /// Gaussian σ in full-resolution pixels applied to this source.
    pub blur: f32,
    pub hue: Vec<[f32; 2]>,
    pub chromaticity: Vec<[f32; 2]>,
    pub lightness: Vec<[f32; 2]>,
    /// -1..1. Positive keeps textured areas, negative keeps flat ones, 0 is off.
    pub contrast_threshold: f32,
}

/// Geometric selection built from an ordered list of shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaMask {
    pub enabled: bool,
    pub inverted: bool,
    pub shapes: Vec<AreaShape>,
}

/// How a shape combines with the shapes before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeMode {
    #[default]
    Add,
    Subtract,
    Intersect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaShape {
    #[serde(default)]
    pub mode: ShapeMode,
    /// Width of the soft edge as a fraction of the shorter full-image side.
    /// 0 gives a hard edge exactly on the boundary.
    #[serde(default)]
    pub feather: f32,
    pub geometry: ShapeGeometry,
}

/// Shape outlines. Angles are in degrees, counter-clockwise in image space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeGeometry {
    Rectangle {
        center: [f32; 2],
        /// Fraction of the full width.
        width: f32,
        /// Fraction of the full height.
        height: f32,
        #[serde(default)]
        angle: f32,
        /// Corner rounding, 0 (square) to 1 (fully rounded short side).
        #[serde(default)]
        roundness: f32,
    },
    Ellipse {
        center: [f32; 2],
        radius_x: f32,
        radius_y: f32,
        #[serde(default)]
        angle: f32,
    },
    Polygon {
        points: Vec<[f32; 2]>,
    },
    /// Half-plane split through `center`; the side opposite `angle` is selected.
    Gradient {
        center: [f32; 2],
        #[serde(default)]
        angle: f32,
    },
}

/// Selection by perceptual distance to a reference color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaEMask {
    pub enabled: bool,
    pub inverted: bool,
    /// Reference lightness, 0..100.
    pub l: f32,
    /// Reference chroma.
    pub c: f32,
    /// Reference hue in degrees.
    pub h: f32,
    /// ΔE within which the mask is fully on.
    pub range: f32,
    /// Falloff steepness past `range`. Higher is sharper.
    pub decay: f32,
    /// Peak mask value, 0..1.
    pub strength: f32,
    pub weight_l: f32,
    pub weight_c: f32,
    pub weight_h: f32,
}

impl Default for DeltaEMask {
    fn default() -> Self {
        Self {
            enabled: false,
            inverted: false,
            l: 50.0,
            c: 0.0,
            h: 0.0,
            range: 10.0,
            decay: 1.0,
            strength: 1.0,
            weight_l: 1.0,
            weight_c: 1.0,
            weight_h: 1.0,
        }
    }
}

/// Brush-painted selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawnMask {
    pub enabled: bool,
    pub inverted: bool,
    /// Gaussian σ in full-resolution pixels.
    pub feather: f32,
    /// 0 keeps strokes at full strength, 1 makes them invisible.
    pub transparency: f32,
    /// Painted in order; later strokes paint over (or erase) earlier ones.
    pub strokes: Vec<DrawnStroke>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnStroke {
    /// Brush path in normalized coordinates. A single point is a dab.
    pub points: Vec<[f32; 2]>,
    /// Brush radius as a fraction of the shorter full-image side.
    pub radius: f32,
    #[serde(default = "DrawnStroke::default_opacity")]
    pub opacity: f32,
    /// Fraction of the radius painted at full opacity before the falloff.
    #[serde(default = "DrawnStroke::default_hardness")]
    pub hardness: f32,
    #[serde(default)]
    pub erase: bool,
}

impl DrawnStroke {
    fn default_opacity() -> f32 {
        1.0
    }

    fn default_hardness() -> f32 {
        1.0
    }
}

/// Reuse of a mask computed by another tool (or region).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedMask {
    pub enabled: bool,
    pub inverted: bool,
    /// Producing tool.
    pub tool: String,
    /// Mask name within the producing tool.
    pub name: String,
}

/// Mask loaded from a grayscale image file covering the full frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalMask {
    pub enabled: bool,
    pub inverted: bool,
    pub path: PathBuf,
    /// Edge-aware smoothing radius in full-resolution pixels.
    pub feather: f32,
}

/// Final refinements applied to the composite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskPostprocess {
    /// Gaussian σ in full-resolution pixels, applied to both channels.
    pub blur: f32,
    /// Guided-filter radius in full-resolution pixels, lightness channel only.
    pub smoothing: f32,
}
