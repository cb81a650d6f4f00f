//! The event stream a scene traversal feeds into the accumulator

use serde::{Deserialize, Serialize};

use crate::foundation::math::{BoundingSphere, Mat4};
use crate::graph::DrawableId;
use crate::state::RenderStateDescriptor;

/// How a bin redirect interacts with redirects nested below it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BinMode {
    /// Redirect the subtree unless an enclosing redirect overrides it
    #[default]
    Use,
    /// Redirect the subtree and ignore nested `Use` redirects
    Override,
    /// Redirect even below an `Override`
    Protected,
}

/// Destination of a bin redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinTarget {
    /// Emission order number
    pub order: i32,
    /// Name resolved against the bin registry when the bin is created
    #[serde(default)]
    pub name: Option<String>,
    /// Interaction with nested redirects
    #[serde(default)]
    pub mode: BinMode,
}

impl BinTarget {
    /// Redirect to bin `order`
    pub fn new(order: i32, name: Option<&str>) -> Self {
        Self {
            order,
            name: name.map(str::to_owned),
            mode: BinMode::Use,
        }
    }

    /// Set the redirect mode
    pub fn with_mode(mut self, mode: BinMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A drawable reached by the traversal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawableVisit {
    /// The drawable
    pub drawable: DrawableId,
    /// Accumulated model-view matrix at the drawable
    pub model_view: Mat4,
    /// Local-space bound used for sort keys and near/far
    pub bound: BoundingSphere,
}

impl DrawableVisit {
    /// Create a new visit
    pub fn new(drawable: DrawableId, model_view: Mat4, bound: BoundingSphere) -> Self {
        Self {
            drawable,
            model_view,
            bound,
        }
    }
}

/// Depth-first traversal callbacks
///
/// `StateOverride` and `BinRedirect` are scoped by the enclosing
/// `EnterNode`/`LeaveNode` pair.
#[derive(Debug, Clone)]
pub enum TraversalEvent {
    /// Entering a scene node
    EnterNode,
    /// The current node carries render state
    StateOverride(RenderStateDescriptor),
    /// The current node sends its subtree into another bin
    BinRedirect(BinTarget),
    /// A drawable under the current node
    Drawable(DrawableVisit),
    /// Leaving the current node
    LeaveNode,
}
