//! # Render State
//!
//! Immutable, ordered descriptions of device state. A [`StateSet`] is the
//! mutable builder used by scene nodes; [`RenderStateDescriptor`] is the frozen,
//! cheaply clonable value the render graph keys its trees by.
//!
//! ## Ordering
//!
//! Descriptors compare lexicographically over their entries, and entries are
//! sorted by [`StateCategory`], which is declared in order of switching cost.
//! Sibling nodes in a state-ordered bin therefore group the most expensive
//! state (the program) first.

pub mod attribute;
pub mod descriptor;

pub use attribute::{
    BlendFactor, BlendFunc, CompareFunc, CullFace, PolygonMode, ProgramId, RenderingHint,
    StateCategory, StateFlags, StateValue, TextureId,
};
pub use descriptor::{RenderStateDescriptor, StateEntry, StateSet};
