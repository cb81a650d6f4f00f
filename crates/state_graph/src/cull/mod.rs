//! # Cull / Accumulation Phase
//!
//! The per-frame builder that consumes the scene traversal's event stream
//! and fills a [`RenderBinSet`](crate::graph::RenderBinSet).
//!
//! ## Event Flow
//!
//! ```text
//! scene traversal ──► TraversalEvent ──► TraversalAccumulator
//!                                           ├── active-state stack
//!                                           ├── active-bin stack
//!                                           └── RenderBinSet ──► emit_all ──► submission
//! ```

pub mod accumulator;
pub mod depth;
pub mod event;

pub use accumulator::{AccumulatorPhase, TraversalAccumulator};
pub use depth::NearFar;
pub use event::{BinMode, BinTarget, DrawableVisit, TraversalEvent};
