//! Per-document store of masks shared between tools.
//!
//! A tool that computes a mask another tool links to stores it here under
//! `(tool, name)`; the consumer copies it out later in the same pass. The
//! producer must run first. Exclusive `&mut` access is the only
//! synchronization: the engine processes regions sequentially, so a store
//! and an apply on the same key can never overlap.

use std::collections::{HashMap, HashSet};

use crate::buffer::Array2D;
use crate::params::ProcParams;
use crate::parallel;
use crate::progress::{ProgressListener, report_error};

/// Composite key of a linked mask.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkedMaskKey {
    pub tool: String,
    pub name: String,
}

impl LinkedMaskKey {
    pub fn new(tool: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            name: name.into(),
        }
    }
}

struct StoredMask {
    lightness: Array2D<f32>,
    chroma: Array2D<f32>,
}

/// Store of linkable masks and the keys the current document references.
#[derive(Default)]
pub struct LinkedMaskManager {
    masks: HashMap<LinkedMaskKey, StoredMask>,
    needed: HashSet<LinkedMaskKey>,
}

impl LinkedMaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new document or parameter set.
    ///
    /// Drops every stored mask and marks as needed each key referenced by an
    /// enabled linked source of an enabled mask in an enabled tool.
    pub fn init(&mut self, params: &ProcParams) {
        self.masks.clear();
        self.needed.clear();
        for tool in params.tools.iter().filter(|t| t.enabled) {
            for mask in tool.masks.iter().filter(|m| m.enabled && m.linked.enabled) {
                self.needed
                    .insert(LinkedMaskKey::new(&mask.linked.tool, &mask.linked.name));
            }
        }
        tracing::debug!(needed = self.needed.len(), "linked mask store reset");
    }

    /// Register interest in `(tool, name)` outside of [`init`](Self::init).
    pub fn mark_needed(&mut self, tool: &str, name: &str) {
        self.needed.insert(LinkedMaskKey::new(tool, name));
    }

    /// `true` if some consumer references `(tool, name)`.
    pub fn is_needed(&self, tool: &str, name: &str) -> bool {
        self.needed.contains(&LinkedMaskKey::new(tool, name))
    }

    /// Copy `mask1` (lightness) and `mask2` (chroma) into the store.
    ///
    /// Returns `false` and leaves the store untouched when nobody needs the key.
    pub fn store_mask(
        &mut self,
        tool: &str,
        name: &str,
        mask1: &Array2D<f32>,
        mask2: &Array2D<f32>,
        multithread: bool,
    ) -> bool {
        let key = LinkedMaskKey::new(tool, name);
        if !self.needed.contains(&key) {
            return false;
        }
        debug_assert!(mask1.same_size(mask2), "linked mask channels differ in size");

        let mut lightness = Array2D::new(mask1.width(), mask1.height());
        parallel::map_into(mask1, &mut lightness, multithread, |&v| v);
        let mut chroma = Array2D::new(mask2.width(), mask2.height());
        parallel::map_into(mask2, &mut chroma, multithread, |&v| v);

        tracing::debug!(tool, name, "stored linked mask");
        self.masks.insert(key, StoredMask { lightness, chroma });
        true
    }

    /// Copy the stored pair for `(tool, name)` into `out1`/`out2`, as
    /// `1 - x` when `inverted`.
    ///
    /// Returns `false` and leaves the outputs untouched when nothing is
    /// stored under the key; the caller falls back to a neutral mask.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_mask(
        &self,
        tool: &str,
        name: &str,
        inverted: bool,
        out1: &mut Array2D<f32>,
        out2: &mut Array2D<f32>,
        multithread: bool,
        listener: Option<&dyn ProgressListener>,
    ) -> bool {
        let Some(stored) = self.masks.get(&LinkedMaskKey::new(tool, name)) else {
            tracing::warn!(tool, name, "linked mask not available");
            report_error(listener, &format!("linked mask \"{tool}/{name}\" is not available"));
            return false;
        };

        out1.resize(stored.lightness.width(), stored.lightness.height(), 0.0);
        out2.resize(stored.chroma.width(), stored.chroma.height(), 0.0);
        if inverted {
            parallel::map_into(&stored.lightness, out1, multithread, |&v| 1.0 - v);
            parallel::map_into(&stored.chroma, out2, multithread, |&v| 1.0 - v);
        } else {
            parallel::map_into(&stored.lightness, out1, multithread, |&v| v);
            parallel::map_into(&stored.chroma, out2, multithread, |&v| v);
        }
        true
    }

    /// Number of stored masks.
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}
