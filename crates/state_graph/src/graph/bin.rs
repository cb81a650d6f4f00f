//! Render bins: numbered partitions of the draw sequence

use std::cmp::Ordering;

use log::trace;
use serde::{Deserialize, Serialize};

use super::error::GraphResult;
use super::leaf::{DrawItem, Leaf, SortScratch};
use super::node::RenderStateNode;
use crate::state::RenderStateDescriptor;

/// Order in which a bin emits its leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortMode {
    /// Walk the state tree in descriptor order, leaves in insertion order
    #[default]
    StateOrder,
    /// Farthest first, for blended geometry
    BackToFront,
    /// Nearest first, for early depth rejection
    FrontToBack,
    /// Insertion order, ignoring state
    TraversalOrder,
}

impl SortMode {
    /// Whether emission follows the state tree
    pub fn is_state_ordered(self) -> bool {
        self == Self::StateOrder
    }

    /// Global leaf ordering for the non-tree modes; ties go to insertion order
    pub(crate) fn compare(self, a: &Leaf, b: &Leaf) -> Ordering {
        let by_depth = match self {
            Self::BackToFront => b.depth.total_cmp(&a.depth),
            Self::FrontToBack => a.depth.total_cmp(&b.depth),
            Self::StateOrder | Self::TraversalOrder => Ordering::Equal,
        };
        by_depth.then(a.sequence.cmp(&b.sequence))
    }
}

/// A numbered bin holding one render-state tree
#[derive(Debug)]
pub struct RenderBin {
    order: i32,
    name: Option<String>,
    sort_mode: SortMode,
    root: RenderStateNode,
    next_sequence: u32,
    /// Reused across frames by the non-tree sort modes
    scratch: SortScratch,
    empty_frames: u32,
}

impl RenderBin {
    /// Create an empty bin
    pub fn new(order: i32, name: Option<String>, sort_mode: SortMode) -> Self {
        Self {
            order,
            name,
            sort_mode,
            root: RenderStateNode::root(),
            next_sequence: 0,
            scratch: SortScratch::new(),
            empty_frames: 0,
        }
    }

    /// Emission order number
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Name the bin was created with
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Current sort policy
    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    /// Change the sort policy; applies from the next emission
    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.sort_mode = mode;
    }

    /// Root of the state tree
    pub fn root(&self) -> &RenderStateNode {
        &self.root
    }

    /// Mutable root of the state tree
    pub fn root_mut(&mut self) -> &mut RenderStateNode {
        &mut self.root
    }

    /// Insert a leaf at the node reached by walking `path` from the root
    ///
    /// Stamps the leaf with the bin's next insertion sequence.
    pub fn insert(&mut self, path: &[RenderStateDescriptor], mut leaf: Leaf) -> GraphResult<()> {
        leaf.sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        let mut node = &mut self.root;
        for descriptor in path {
            node = node.find_or_create_child(descriptor);
        }
        node.add_leaf(leaf)
    }

    /// Clear all leaves, keeping tree shape and scratch capacity
    pub fn clean(&mut self) {
        self.root.clean();
        self.scratch.clear();
        self.next_sequence = 0;
    }

    /// Drop empty subtrees; returns true when the bin holds nothing
    pub fn prune(&mut self) -> bool {
        self.root.prune()
    }

    /// True when no leaf is reachable from the root
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Number of leaves in the bin
    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Consecutive frames this bin ended empty
    pub fn empty_frames(&self) -> u32 {
        self.empty_frames
    }

    pub(crate) fn end_frame(&mut self) {
        if self.is_empty() {
            self.empty_frames = self.empty_frames.saturating_add(1);
        } else {
            self.empty_frames = 0;
        }
    }

    /// Visit every leaf in this bin's sort order
    pub fn emit<F>(&mut self, visitor: &mut F) -> GraphResult<()>
    where
        F: FnMut(DrawItem<'_>),
    {
        self.root.emit(self.sort_mode, &mut self.scratch, visitor)?;
        if !self.sort_mode.is_state_ordered() {
            trace!("bin {} sorted {} leaves ({:?})", self.order, self.scratch.len(), self.sort_mode);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4;
    use crate::graph::leaf::DrawableId;
    use crate::state::{CompareFunc, StateCategory, StateSet, StateValue};
    use slotmap::SlotMap;

    fn depth_test(func: CompareFunc) -> RenderStateDescriptor {
        StateSet::new()
            .with(StateCategory::DepthTest, StateValue::DepthTest(Some(func)))
            .unwrap()
            .build()
    }

    fn emitted(bin: &mut RenderBin) -> Vec<DrawableId> {
        let mut out = Vec::new();
        bin.emit(&mut |item: DrawItem<'_>| out.push(item.drawable)).unwrap();
        out
    }

    #[test]
    fn test_insert_stamps_sequence() {
        let mut scene: SlotMap<DrawableId, ()> = SlotMap::with_key();
        let (a, b) = (scene.insert(()), scene.insert(()));
        let mut bin = RenderBin::new(0, None, SortMode::StateOrder);
        let path = [depth_test(CompareFunc::Less)];

        bin.insert(&path, Leaf::new(a, Mat4::identity(), 0.0)).unwrap();
        bin.insert(&path, Leaf::new(b, Mat4::identity(), 0.0)).unwrap();

        let node = bin.root().child(&path[0]).unwrap();
        assert_eq!(node.leaves()[0].sequence, 0);
        assert_eq!(node.leaves()[1].sequence, 1);
    }

    #[test]
    fn test_depth_ties_break_by_insertion() {
        let mut scene: SlotMap<DrawableId, ()> = SlotMap::with_key();
        let ids: Vec<_> = (0..4).map(|_| scene.insert(())).collect();
        let mut bin = RenderBin::new(10, Some("DepthSortedBin".into()), SortMode::BackToFront);

        bin.insert(&[depth_test(CompareFunc::Less)], Leaf::new(ids[0], Mat4::identity(), 3.0)).unwrap();
        bin.insert(&[depth_test(CompareFunc::Always)], Leaf::new(ids[1], Mat4::identity(), 3.0)).unwrap();
        bin.insert(&[], Leaf::new(ids[2], Mat4::identity(), 8.0)).unwrap();
        bin.insert(&[depth_test(CompareFunc::Less)], Leaf::new(ids[3], Mat4::identity(), 3.0)).unwrap();

        assert_eq!(emitted(&mut bin), vec![ids[2], ids[0], ids[1], ids[3]]);
    }

    #[test]
    fn test_equal_depth_follows_insertion_across_nodes() {
        let mut scene: SlotMap<DrawableId, ()> = SlotMap::with_key();
        let (first, second) = (scene.insert(()), scene.insert(()));
        let mut bin = RenderBin::new(10, Some("DepthSortedBin".into()), SortMode::BackToFront);

        // `first` sits under the later sibling in descriptor order
        bin.insert(&[depth_test(CompareFunc::Always)], Leaf::new(first, Mat4::identity(), 3.0)).unwrap();
        bin.insert(&[depth_test(CompareFunc::Less)], Leaf::new(second, Mat4::identity(), 3.0)).unwrap();

        assert_eq!(emitted(&mut bin), vec![first, second]);
        bin.set_sort_mode(SortMode::FrontToBack);
        assert_eq!(emitted(&mut bin), vec![first, second]);
        bin.set_sort_mode(SortMode::StateOrder);
        assert_eq!(emitted(&mut bin), vec![second, first]);
    }

    #[test]
    fn test_traversal_order_ignores_state_and_depth() {
        let mut scene: SlotMap<DrawableId, ()> = SlotMap::with_key();
        let ids: Vec<_> = (0..3).map(|_| scene.insert(())).collect();
        let mut bin = RenderBin::new(20, Some("UIOverlay".into()), SortMode::TraversalOrder);

        bin.insert(&[depth_test(CompareFunc::Greater)], Leaf::new(ids[0], Mat4::identity(), 1.0)).unwrap();
        bin.insert(&[depth_test(CompareFunc::Less)], Leaf::new(ids[1], Mat4::identity(), 7.0)).unwrap();
        bin.insert(&[], Leaf::new(ids[2], Mat4::identity(), 4.0)).unwrap();

        assert_eq!(emitted(&mut bin), ids);
    }

    #[test]
    fn test_set_sort_mode_applies_on_next_emit() {
        let mut scene: SlotMap<DrawableId, ()> = SlotMap::with_key();
        let (near, far) = (scene.insert(()), scene.insert(()));
        let mut bin = RenderBin::new(0, None, SortMode::StateOrder);
        bin.insert(&[], Leaf::new(near, Mat4::identity(), 1.0)).unwrap();
        bin.insert(&[], Leaf::new(far, Mat4::identity(), 5.0)).unwrap();

        assert_eq!(emitted(&mut bin), vec![near, far]);
        bin.set_sort_mode(SortMode::BackToFront);
        assert_eq!(emitted(&mut bin), vec![far, near]);
    }

    #[test]
    fn test_clean_resets_sequence_and_empties() {
        let mut scene: SlotMap<DrawableId, ()> = SlotMap::with_key();
        let id = scene.insert(());
        let mut bin = RenderBin::new(0, None, SortMode::StateOrder);
        bin.insert(&[depth_test(CompareFunc::Less)], Leaf::new(id, Mat4::identity(), 0.0)).unwrap();

        bin.clean();
        assert!(bin.is_empty());
        assert!(emitted(&mut bin).is_empty());

        bin.insert(&[depth_test(CompareFunc::Less)], Leaf::new(id, Mat4::identity(), 0.0)).unwrap();
        assert_eq!(bin.root().child(&depth_test(CompareFunc::Less)).unwrap().leaves()[0].sequence, 0);
    }
}
