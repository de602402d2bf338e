//! Mask sources, the linked and external mask services, and the engine
//! that combines them per region.

pub mod area;
pub mod curves;
pub mod delta_e;
pub mod drawn;
pub mod engine;
pub mod external;
pub mod filter;
pub mod geometry;
pub mod linked;
pub mod parametric;

pub use delta_e::{MasksEditId, fill_pipette_masks, get_delta_e_color};
pub use engine::{GeneratedMasks, generate_masks};
pub use external::{ExternalMaskManager, ImageFileDecoder, MaskDecoder};
pub use geometry::MaskGeometry;
pub use linked::{LinkedMaskKey, LinkedMaskManager};
