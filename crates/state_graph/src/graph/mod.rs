//! # State-Sorted Render Graph
//!
//! Rebuilt every frame from the scene traversal, the render graph turns an
//! arbitrarily nested hierarchy into a flat, render-state-ordered draw
//! sequence.
//!
//! ## Architecture
//!
//! ```text
//! RenderBinSet (ascending order number)
//!     ├── bin -1 "Skybox"          StateOrder
//!     ├── bin  0 "RenderBin"       StateOrder
//!     │       └── RenderStateNode (identity)
//!     │               ├── node [program 1] ── leaves
//!     │               └── node [program 2]
//!     │                       └── node [texture 4] ── leaves
//!     └── bin 10 "DepthSortedBin"  BackToFront
//! ```
//!
//! `clean()` clears leaves but keeps the shape, so a stable scene rebuilds
//! its graph each frame without touching the allocator. `prune()` reclaims
//! nodes and bins that went unused.

pub mod bin;
pub mod bin_set;
pub mod error;
pub mod leaf;
pub mod node;

pub use bin::{RenderBin, SortMode};
pub use bin_set::{FrameStats, RenderBinSet};
pub use error::{GraphError, GraphResult};
pub use leaf::{DrawItem, DrawableId, Leaf, SortScratch};
pub use node::RenderStateNode;
