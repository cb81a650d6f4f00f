//! Render graph error types

use std::collections::TryReserveError;

use thiserror::Error;

use crate::cull::AccumulatorPhase;

/// Errors raised while building or emitting a render graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// Growing the graph ran out of memory; the frame must be abandoned
    #[error("Allocation failed while growing the render graph: {0}")]
    AllocationFailure(#[from] TryReserveError),

    /// A state value did not belong to its category
    #[error("Malformed state descriptor: {0}")]
    MalformedDescriptor(String),

    /// Accumulator used in the wrong phase
    #[error("Accumulator is {actual:?}, expected {expected:?}")]
    InvalidPhase {
        /// Phase the operation requires
        expected: AccumulatorPhase,
        /// Phase the accumulator was in
        actual: AccumulatorPhase,
    },

    /// Pops, pushes, enters and leaves did not pair up
    #[error("Unbalanced traversal: {0}")]
    UnbalancedTraversal(&'static str),

    /// The frame failed during accumulation and has nothing to emit
    #[error("Frame {0} was abandoned during accumulation")]
    FrameAbandoned(u64),
}

/// Result alias for render graph operations
pub type GraphResult<T> = Result<T, GraphError>;
