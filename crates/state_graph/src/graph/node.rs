//! Render-state tree nodes
//!
//! Each node is keyed by the descriptor pushed at its level of the traversal.
//! A node caches the state composed along its path from the bin root, so leaves
//! resolve their device state without re-walking the stack.

use std::collections::BTreeMap;

use log::trace;

use super::bin::SortMode;
use super::error::GraphResult;
use super::leaf::{DrawItem, Leaf, SortScratch, SortedLeaf};
use crate::state::RenderStateDescriptor;

/// A node in a render-state tree
#[derive(Debug, Clone)]
pub struct RenderStateNode {
    /// Descriptor pushed at this level
    descriptor: RenderStateDescriptor,
    /// State composed from the root, inheritance flags kept
    accumulated: RenderStateDescriptor,
    /// `accumulated` without flags; what leaves are drawn with
    effective: RenderStateDescriptor,
    children: BTreeMap<RenderStateDescriptor, RenderStateNode>,
    leaves: Vec<Leaf>,
}

impl RenderStateNode {
    /// Create a root node carrying the identity descriptor
    pub fn root() -> Self {
        Self {
            descriptor: RenderStateDescriptor::empty(),
            accumulated: RenderStateDescriptor::empty(),
            effective: RenderStateDescriptor::empty(),
            children: BTreeMap::new(),
            leaves: Vec::new(),
        }
    }

    fn child_of(parent: &RenderStateDescriptor, descriptor: &RenderStateDescriptor) -> Self {
        // StateSet rejects mismatched values before a descriptor exists
        debug_assert!(
            descriptor
                .entries()
                .iter()
                .all(|entry| entry.category.accepts(&entry.value)),
            "malformed descriptor reached the render graph: {descriptor:?}"
        );
        let accumulated = parent.compose(descriptor);
        let effective = accumulated.device_state();
        Self {
            descriptor: descriptor.clone(),
            accumulated,
            effective,
            children: BTreeMap::new(),
            leaves: Vec::new(),
        }
    }

    /// Descriptor this node was created for
    pub fn descriptor(&self) -> &RenderStateDescriptor {
        &self.descriptor
    }

    /// Device state leaves under this node are drawn with
    pub fn effective_state(&self) -> &RenderStateDescriptor {
        &self.effective
    }

    /// Return the child for `descriptor`, creating it on first use
    pub fn find_or_create_child(&mut self, descriptor: &RenderStateDescriptor) -> &mut Self {
        let parent = &self.accumulated;
        self.children.entry(descriptor.clone()).or_insert_with(|| {
            trace!("creating state node for {descriptor:?}");
            Self::child_of(parent, descriptor)
        })
    }

    /// Look up an existing child
    pub fn child(&self, descriptor: &RenderStateDescriptor) -> Option<&Self> {
        self.children.get(descriptor)
    }

    /// Children in descriptor order
    pub fn children(&self) -> impl Iterator<Item = &Self> {
        self.children.values()
    }

    /// Leaves attached directly to this node, in insertion order
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Append a leaf; duplicates are kept
    ///
    /// Leaves enter through [`RenderBin::insert`](super::RenderBin::insert),
    /// which stamps the insertion sequence the sorted modes tie-break on.
    pub(crate) fn add_leaf(&mut self, leaf: Leaf) -> GraphResult<()> {
        self.leaves.try_reserve(1)?;
        self.leaves.push(leaf);
        Ok(())
    }

    /// Clear leaf lists in this subtree, keeping the node shape
    pub fn clean(&mut self) {
        self.leaves.clear();
        for child in self.children.values_mut() {
            child.clean();
        }
    }

    /// Remove empty children recursively
    ///
    /// Returns true when this node ends up with neither leaves nor children,
    /// telling the caller to drop it.
    pub fn prune(&mut self) -> bool {
        self.children.retain(|_, child| !child.prune());
        self.leaves.is_empty() && self.children.is_empty()
    }

    /// True when no leaf is reachable from this node
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty() && self.children.values().all(Self::is_empty)
    }

    /// Number of leaves in this subtree
    pub fn leaf_count(&self) -> usize {
        self.leaves.len() + self.children.values().map(Self::leaf_count).sum::<usize>()
    }

    /// Number of nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.values().map(Self::node_count).sum::<usize>()
    }

    /// Visit every leaf of this subtree in the order `sort_mode` dictates
    ///
    /// State order walks the tree directly. The other modes gather every
    /// leaf into `scratch` and sort once; ties fall back to the insertion
    /// sequence stamped by [`RenderBin::insert`](super::RenderBin::insert).
    pub fn emit<F>(&self, sort_mode: SortMode, scratch: &mut SortScratch, visitor: &mut F) -> GraphResult<()>
    where
        F: FnMut(DrawItem<'_>),
    {
        if sort_mode.is_state_ordered() {
            self.emit_state_order(visitor);
            return Ok(());
        }

        scratch.clear();
        self.gather_into(scratch.leaves_mut())?;
        scratch.sort(sort_mode);
        scratch.visit(visitor);
        Ok(())
    }

    fn emit_state_order<F>(&self, visitor: &mut F)
    where
        F: FnMut(DrawItem<'_>),
    {
        for leaf in &self.leaves {
            visitor(DrawItem::new(leaf, &self.effective));
        }
        for child in self.children.values() {
            child.emit_state_order(visitor);
        }
    }

    /// Copy every leaf of this subtree into a reusable buffer
    fn gather_into(&self, out: &mut Vec<SortedLeaf>) -> GraphResult<()> {
        out.try_reserve(self.leaves.len())?;
        for leaf in &self.leaves {
            let gathered = out.len() as u32;
            out.push(SortedLeaf {
                leaf: *leaf,
                state: self.effective.clone(),
                gathered,
            });
        }
        for child in self.children.values() {
            child.gather_into(out)?;
        }
        Ok(())
    }
}

impl Default for RenderStateNode {
    fn default() -> Self {
        Self::root()
    }
}
