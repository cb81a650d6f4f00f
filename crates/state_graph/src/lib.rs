//! # State Graph
//!
//! A per-frame, state-sorted render graph: the cull traversal feeds drawables
//! and their render state into a [`TraversalAccumulator`], which files them
//! into ordered render bins, each holding a tree of render-state nodes. The
//! finished graph is emitted as a flat draw sequence that minimizes device
//! state changes while honouring explicit bin ordering and depth sorting.
//!
//! ## Features
//!
//! - **State sorting**: leaves grouped by composed render state
//! - **Render bins**: explicit ordering for skyboxes, overlays and translucency
//! - **Depth sorting**: back-to-front and front-to-back bins with stable ties
//! - **Frame reuse**: tree shape survives `clean`, unused nodes are pruned
//! - **Configuration**: bin registry and accumulator policy from TOML or RON
//!
//! ## Quick Start
//!
//! ```rust
//! use slotmap::SlotMap;
//! use state_graph::prelude::*;
//!
//! fn main() -> Result<(), GraphError> {
//!     let mut drawables = SlotMap::<DrawableId, &str>::with_key();
//!     let teapot = drawables.insert("teapot");
//!
//!     let shaded = StateSet::new()
//!         .with(StateCategory::Program, StateValue::Program(ProgramId(1)))?
//!         .build();
//!
//!     let mut accumulator = TraversalAccumulator::new(&RenderGraphConfig::default());
//!     accumulator.accumulate(vec![
//!         TraversalEvent::EnterNode,
//!         TraversalEvent::StateOverride(shaded),
//!         TraversalEvent::Drawable(DrawableVisit::new(
//!             teapot,
//!             Mat4::new_translation(&Vec3::new(0.0, 0.0, -5.0)),
//!             BoundingSphere::new(Point3::origin(), 1.0),
//!         )),
//!         TraversalEvent::LeaveNode,
//!     ])?;
//!
//!     accumulator.emit_all(|item| println!("draw {}", drawables[item.drawable]))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate, clippy::missing_errors_doc)]

// Configuration
pub mod config;
pub mod core;

// Shared utilities
pub mod foundation;

// Render graph
pub mod state;
pub mod graph;
pub mod cull;

#[cfg(test)]
mod tests;

pub use crate::core::{Config, ConfigError, RenderGraphConfig};
pub use cull::{TraversalAccumulator, TraversalEvent};
pub use graph::{GraphError, GraphResult, RenderBinSet};

/// Common imports for render graph users
pub mod prelude {
    pub use crate::{
        core::{AccumulatorConfig, BinRegistryConfig, Config, DepthSortMetric, RenderGraphConfig},
        cull::{
            AccumulatorPhase, BinMode, BinTarget, DrawableVisit, NearFar, TraversalAccumulator,
            TraversalEvent,
        },
        foundation::math::{BoundingSphere, Mat4, Point3, Vec3},
        graph::{
            DrawItem, DrawableId, FrameStats, GraphError, GraphResult, RenderBin, RenderBinSet,
            RenderStateNode, SortMode, SortScratch,
        },
        state::{
            ProgramId, RenderStateDescriptor, RenderingHint, StateCategory, StateFlags, StateSet,
            StateValue, TextureId,
        },
    };
}
