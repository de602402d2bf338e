//! Mask parameters as stored in a document.

pub mod mask;
pub mod regions;

use serde::{Deserialize, Serialize};

pub use mask::{
    AreaMask, AreaShape, DeltaEMask, DrawnMask, DrawnStroke, ExternalMask, LinkedMask, Mask,
    MaskPostprocess, ParametricMask, ShapeGeometry, ShapeMode,
};
pub use regions::RegionList;

/// The masks of one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMasks {
    pub tool: String,
    #[serde(default = "ToolMasks::default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub masks: Vec<Mask>,
}

impl ToolMasks {
    pub fn new(tool: impl Into<String>, masks: Vec<Mask>) -> Self {
        Self {
            tool: tool.into(),
            enabled: true,
            masks,
        }
    }

    fn default_enabled() -> bool {
        true
    }
}

/// Per-document processing parameters, reduced to what masking needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcParams {
    /// Tools in pipeline order.
    #[serde(default)]
    pub tools: Vec<ToolMasks>,
}

impl ProcParams {
    /// Masks of `tool`, if present.
    pub fn tool(&self, tool: &str) -> Option<&ToolMasks> {
        self.tools.iter().find(|t| t.tool == tool)
    }
}
