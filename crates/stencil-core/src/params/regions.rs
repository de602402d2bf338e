//! Pairing of a tool's adjustment regions with their masks.

use serde::{Deserialize, Serialize};

use super::mask::Mask;

/// A tool's regions and masks, kept the same length.
///
/// Regions are tool-specific (`R`), masks are shared. Every mutating method
/// keeps `regions.len() == masks.len()`; [`write_back`](Self::write_back)
/// checks it again in debug builds before handing the lists to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionList<R> {
    regions: Vec<R>,
    masks: Vec<Mask>,
    /// Index of the region being edited.
    pub selected: usize,
    /// Region whose mask is shown instead of the image.
    pub show_mask: Option<usize>,
}

impl<R: Default> Default for RegionList<R> {
    fn default() -> Self {
        Self {
            regions: vec![R::default()],
            masks: vec![Mask::default()],
            selected: 0,
            show_mask: None,
        }
    }
}

impl<R: Default> RegionList<R> {
    /// Load from stored parameters, padding an empty list with one default
    /// region so there is always something to select.
    pub fn from_parts(mut regions: Vec<R>, mut masks: Vec<Mask>) -> Self {
        debug_assert_eq!(regions.len(), masks.len(), "regions/masks length mismatch");
        if regions.is_empty() {
            regions.push(R::default());
            masks.clear();
            masks.push(Mask::default());
        }
        Self {
            regions,
            masks,
            selected: 0,
            show_mask: None,
        }
    }

    /// Append a default region and mask; returns its index.
    pub fn add(&mut self) -> usize {
        self.regions.push(R::default());
        self.masks.push(Mask::default());
        self.regions.len() - 1
    }
}

impl<R> RegionList<R> {
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> &[R] {
        &self.regions
    }

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<(&mut R, &mut Mask)> {
        self.regions.get_mut(idx).zip(self.masks.get_mut(idx))
    }

    /// Remove the pair at `idx`, keeping at least one region.
    pub fn remove(&mut self, idx: usize) -> bool {
        if self.regions.len() <= 1 || idx >= self.regions.len() {
            return false;
        }
        self.regions.remove(idx);
        self.masks.remove(idx);
        if self.selected >= self.regions.len() {
            self.selected = self.regions.len() - 1;
        }
        if self.show_mask.is_some_and(|i| i >= self.regions.len()) {
            self.show_mask = None;
        }
        true
    }

    /// Move the pair at `idx` one slot towards the front (`up`) or back.
    pub fn move_region(&mut self, idx: usize, up: bool) -> bool {
        let Some(other) = (if up { idx.checked_sub(1) } else { idx.checked_add(1) }) else {
            return false;
        };
        if idx >= self.regions.len() || other >= self.regions.len() {
            return false;
        }
        self.regions.swap(idx, other);
        self.masks.swap(idx, other);
        true
    }

    /// Hand back the region and mask lists for storage in the tool parameters.
    pub fn write_back(self) -> (Vec<R>, Vec<Mask>) {
        debug_assert_eq!(
            self.regions.len(),
            self.masks.len(),
            "regions/masks length mismatch"
        );
        (self.regions, self.masks)
    }
}
