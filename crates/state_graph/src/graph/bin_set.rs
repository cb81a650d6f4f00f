//! The ordered collection of render bins for one view

use std::collections::BTreeMap;

use log::{debug, trace, warn};

use super::bin::RenderBin;
use super::error::GraphResult;
use super::leaf::DrawItem;
use crate::core::config::{BinRegistryConfig, RenderGraphConfig};
use crate::state::RenderStateDescriptor;

/// Counters describing one accumulated frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Non-empty bins
    pub bins: usize,
    /// State nodes across all bins, roots included
    pub state_nodes: usize,
    /// Leaves that will be emitted
    pub leaves: usize,
    /// Device-state transitions in emission order, the first draw included
    pub state_changes: usize,
}

/// Bins keyed by order number, emitted in ascending order
///
/// One instance per view; never shared between concurrently culled views.
#[derive(Debug)]
pub struct RenderBinSet {
    bins: BTreeMap<i32, RenderBin>,
    registry: BinRegistryConfig,
    prune_after_empty_frames: u32,
}

impl RenderBinSet {
    /// Create an empty bin set resolving names through `registry`
    pub fn new(registry: BinRegistryConfig) -> Self {
        Self {
            bins: BTreeMap::new(),
            registry,
            prune_after_empty_frames: 0,
        }
    }

    /// Create an empty bin set from the full configuration
    pub fn from_config(config: &RenderGraphConfig) -> Self {
        Self::new(config.bins.clone())
            .with_prune_after(config.accumulator.prune_after_empty_frames)
    }

    /// Keep empty bins alive for this many consecutive empty frames
    pub fn with_prune_after(mut self, frames: u32) -> Self {
        self.prune_after_empty_frames = frames;
        self
    }

    /// Registry used to resolve bin names
    pub fn registry(&self) -> &BinRegistryConfig {
        &self.registry
    }

    /// Return the bin at `order`, creating it on first use
    ///
    /// A new bin takes its sort mode from the registry policy for `name`.
    /// The name of an existing bin is never changed.
    pub fn get_or_create_bin(&mut self, order: i32, name: Option<&str>) -> &mut RenderBin {
        let registry = &self.registry;
        self.bins.entry(order).or_insert_with(|| {
            if let Some(name) = name {
                if registry.lookup(name).is_none() {
                    warn!("No policy registered for bin '{name}', using {:?}", registry.default_sort_mode);
                }
            }
            let sort_mode = registry.sort_mode_for(name);
            trace!("creating bin {order} ({name:?}, {sort_mode:?})");
            RenderBin::new(order, name.map(str::to_owned), sort_mode)
        })
    }

    /// Bin at `order`, if it exists
    pub fn bin(&self, order: i32) -> Option<&RenderBin> {
        self.bins.get(&order)
    }

    /// Mutable bin at `order`, if it exists
    pub fn bin_mut(&mut self, order: i32) -> Option<&mut RenderBin> {
        self.bins.get_mut(&order)
    }

    /// Bins in emission order
    pub fn bins(&self) -> impl Iterator<Item = &RenderBin> {
        self.bins.values()
    }

    /// Number of bins, empty ones included
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// True when no bin holds a leaf
    pub fn is_empty(&self) -> bool {
        self.bins.values().all(RenderBin::is_empty)
    }

    /// Leaves across all bins
    pub fn leaf_count(&self) -> usize {
        self.bins.values().map(RenderBin::leaf_count).sum()
    }

    /// Clear every bin's leaves, keeping bins and node shape
    pub fn clean(&mut self) {
        for bin in self.bins.values_mut() {
            bin.clean();
        }
    }

    /// Record which bins ended the frame empty
    pub fn end_frame(&mut self) {
        for bin in self.bins.values_mut() {
            bin.end_frame();
        }
    }

    /// Drop empty subtrees, then bins that have stayed empty long enough
    pub fn prune(&mut self) {
        let threshold = self.prune_after_empty_frames;
        let before = self.bins.len();
        self.bins.retain(|_, bin| {
            let empty = bin.prune();
            !empty || bin.empty_frames() < threshold
        });
        if self.bins.len() != before {
            debug!("Pruned {} empty render bins", before - self.bins.len());
        }
    }

    /// Visit every leaf of every non-empty bin in final draw order
    pub fn emit_all<F>(&mut self, mut visitor: F) -> GraphResult<()>
    where
        F: FnMut(DrawItem<'_>),
    {
        for bin in self.bins.values_mut() {
            if bin.is_empty() {
                continue;
            }
            bin.emit(&mut visitor)?;
        }
        Ok(())
    }

    /// Compute frame statistics, including state transitions in draw order
    pub fn stats(&mut self) -> GraphResult<FrameStats> {
        let mut stats = FrameStats {
            bins: self.bins.values().filter(|bin| !bin.is_empty()).count(),
            state_nodes: self.bins.values().map(|bin| bin.root().node_count()).sum(),
            ..FrameStats::default()
        };

        let mut previous: Option<RenderStateDescriptor> = None;
        self.emit_all(|item| {
            stats.leaves += 1;
            if previous.as_ref() != Some(item.state) {
                stats.state_changes += 1;
                previous = Some(item.state.clone());
            }
        })?;
        Ok(stats)
    }
}

impl Default for RenderBinSet {
    fn default() -> Self {
        Self::new(BinRegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4;
    use crate::graph::{DrawableId, Leaf, SortMode};
    use crate::state::{ProgramId, StateCategory, StateSet, StateValue};
    use slotmap::SlotMap;

    fn program(id: u32) -> RenderStateDescriptor {
        StateSet::new()
            .with(StateCategory::Program, StateValue::Program(ProgramId(id)))
            .unwrap()
            .build()
    }

    fn order(set: &mut RenderBinSet) -> Vec<DrawableId> {
        let mut out = Vec::new();
        set.emit_all(|item| out.push(item.drawable)).unwrap();
        out
    }

    #[test]
    fn test_named_bin_takes_registry_policy() {
        let mut set = RenderBinSet::default();

        assert_eq!(set.get_or_create_bin(10, Some("DepthSortedBin")).sort_mode(), SortMode::BackToFront);
        assert_eq!(set.get_or_create_bin(3, Some("Unknown")).sort_mode(), SortMode::StateOrder);
        assert_eq!(set.get_or_create_bin(10, Some("Other")).name(), Some("DepthSortedBin"));
    }

    #[test]
    fn test_bins_emit_in_ascending_order() {
        let mut scene: SlotMap<DrawableId, ()> = SlotMap::with_key();
        let ids: Vec<_> = (0..3).map(|_| scene.insert(())).collect();
        let mut set = RenderBinSet::default();

        set.get_or_create_bin(5, None).insert(&[], Leaf::new(ids[0], Mat4::identity(), 0.0)).unwrap();
        set.get_or_create_bin(-3, None).insert(&[], Leaf::new(ids[1], Mat4::identity(), 0.0)).unwrap();
        set.get_or_create_bin(0, None).insert(&[], Leaf::new(ids[2], Mat4::identity(), 0.0)).unwrap();

        assert_eq!(order(&mut set), vec![ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn test_stats_count_state_changes() {
        let mut scene: SlotMap<DrawableId, ()> = SlotMap::with_key();
        let ids: Vec<_> = (0..4).map(|_| scene.insert(())).collect();
        let mut set = RenderBinSet::default();
        let bin = set.get_or_create_bin(0, None);
        for (i, id) in ids.iter().enumerate() {
            bin.insert(&[program((i % 2) as u32)], Leaf::new(*id, Mat4::identity(), 0.0)).unwrap();
        }

        let stats = set.stats().unwrap();
        assert_eq!(stats.leaves, 4);
        assert_eq!(stats.bins, 1);
        assert_eq!(stats.state_nodes, 3);
        assert_eq!(stats.state_changes, 2);
    }

    #[test]
    fn test_prune_respects_empty_frame_threshold() {
        let mut scene: SlotMap<DrawableId, ()> = SlotMap::with_key();
        let id = scene.insert(());
        let mut set = RenderBinSet::default().with_prune_after(2);
        set.get_or_create_bin(1, None).insert(&[program(1)], Leaf::new(id, Mat4::identity(), 0.0)).unwrap();
        set.end_frame();

        set.clean();
        set.end_frame();
        set.prune();
        assert_eq!(set.len(), 1);
        assert_eq!(set.bin(1).unwrap().root().node_count(), 1);

        set.clean();
        set.end_frame();
        set.prune();
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut scene: SlotMap<DrawableId, ()> = SlotMap::with_key();
        let id = scene.insert(());
        let mut set = RenderBinSet::default();
        set.get_or_create_bin(0, None).insert(&[program(1)], Leaf::new(id, Mat4::identity(), 0.0)).unwrap();
        set.get_or_create_bin(0, None).root_mut().find_or_create_child(&program(2));
        set.get_or_create_bin(4, None);

        set.prune();
        let once: Vec<(i32, usize)> = set.bins().map(|b| (b.order(), b.root().node_count())).collect();
        set.prune();
        let twice: Vec<(i32, usize)> = set.bins().map(|b| (b.order(), b.root().node_count())).collect();

        assert_eq!(once, vec![(0, 2)]);
        assert_eq!(once, twice);
    }
}
