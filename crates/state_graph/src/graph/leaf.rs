//! Leaf records and the items handed to the submission stage

use super::bin::SortMode;
use crate::foundation::math::Mat4;
use crate::state::RenderStateDescriptor;

slotmap::new_key_type! {
    /// Opaque handle to a drawable owned by the scene
    pub struct DrawableId;
}

/// A single drawable-plus-context record held by a render-state node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leaf {
    /// Drawable to submit; never owned by the graph
    pub drawable: DrawableId,
    /// Model-view matrix captured at accumulation time
    pub model_view: Mat4,
    /// View-space sort distance
    pub depth: f32,
    /// Insertion order within the owning bin
    pub sequence: u32,
}

impl Leaf {
    /// Create a new leaf
    pub fn new(drawable: DrawableId, model_view: Mat4, depth: f32) -> Self {
        Self {
            drawable,
            model_view,
            depth,
            sequence: 0,
        }
    }

    /// Set the insertion sequence
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }
}

/// What the submission stage receives for each leaf, in final order
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    /// Drawable to submit
    pub drawable: DrawableId,
    /// Resolved device state for the draw
    pub state: &'a RenderStateDescriptor,
    /// Model-view snapshot
    pub model_view: &'a Mat4,
    /// Sort distance the leaf was accumulated with
    pub depth: f32,
}

impl<'a> DrawItem<'a> {
    pub(crate) fn new(leaf: &'a Leaf, state: &'a RenderStateDescriptor) -> Self {
        Self {
            drawable: leaf.drawable,
            state,
            model_view: &leaf.model_view,
            depth: leaf.depth,
        }
    }
}

/// Leaf copied out of the tree for global sorting
#[derive(Debug, Clone)]
pub(crate) struct SortedLeaf {
    pub leaf: Leaf,
    pub state: RenderStateDescriptor,
    /// Position in gather order, last tie-break
    pub gathered: u32,
}

/// Reusable buffer for the depth and traversal sort modes
///
/// Bins keep one across frames so global sorts do not allocate once the
/// buffer has grown to the frame's leaf count.
#[derive(Debug, Default)]
pub struct SortScratch {
    leaves: Vec<SortedLeaf>,
}

impl SortScratch {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop buffered leaves, keeping capacity
    pub fn clear(&mut self) {
        self.leaves.clear();
    }

    /// Leaves currently buffered
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub(crate) fn leaves_mut(&mut self) -> &mut Vec<SortedLeaf> {
        &mut self.leaves
    }

    /// Sort buffered leaves by `mode`, then by gather order
    pub(crate) fn sort(&mut self, mode: SortMode) {
        self.leaves
            .sort_unstable_by(|a, b| mode.compare(&a.leaf, &b.leaf).then(a.gathered.cmp(&b.gathered)));
    }

    pub(crate) fn visit<F>(&self, visitor: &mut F)
    where
        F: FnMut(DrawItem<'_>),
    {
        for sorted in &self.leaves {
            visitor(DrawItem::new(&sorted.leaf, &sorted.state));
        }
    }
}
