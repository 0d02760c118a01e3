use crate::grid::SectorAddress;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Filled with the sector colour while set.
    Flashing,
    /// Drawn with a bold border while set.
    Highlighted,
}

/// The transient per-sector state shared by clicks, passive playback and learning mode.
///
/// Membership is boolean: adding an address twice and removing it once leaves it absent.
/// Every mutation that changes a set raises the redraw flag.
#[derive(Debug, Clone, Default)]
pub struct SectorTracker {
    flashing: BTreeSet<SectorAddress>,
    highlighted: BTreeSet<SectorAddress>,
    redraw: bool,
}

impl SectorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, layer: Layer) -> &BTreeSet<SectorAddress> {
        match layer {
            Layer::Flashing => &self.flashing,
            Layer::Highlighted => &self.highlighted,
        }
    }

    fn set_mut(&mut self, layer: Layer) -> &mut BTreeSet<SectorAddress> {
        match layer {
            Layer::Flashing => &mut self.flashing,
            Layer::Highlighted => &mut self.highlighted,
        }
    }

    pub fn add(&mut self, layer: Layer, sector: SectorAddress) -> bool {
        let changed = self.set_mut(layer).insert(sector);
        self.redraw |= changed;
        changed
    }

    pub fn remove(&mut self, layer: Layer, sector: SectorAddress) -> bool {
        let changed = self.set_mut(layer).remove(&sector);
        self.redraw |= changed;
        changed
    }

    pub fn clear(&mut self, layer: Layer) -> bool {
        let set = self.set_mut(layer);
        let changed = !set.is_empty();
        set.clear();
        self.redraw |= changed;
        changed
    }

    pub fn clear_all(&mut self) -> bool {
        let flashing = self.clear(Layer::Flashing);
        let highlighted = self.clear(Layer::Highlighted);
        flashing || highlighted
    }

    pub fn contains(&self, layer: Layer, sector: SectorAddress) -> bool {
        self.set(layer).contains(&sector)
    }

    pub fn is_empty(&self, layer: Layer) -> bool {
        self.set(layer).is_empty()
    }

    pub fn iter(&self, layer: Layer) -> impl Iterator<Item = SectorAddress> + '_ {
        self.set(layer).iter().copied()
    }

    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }
}
