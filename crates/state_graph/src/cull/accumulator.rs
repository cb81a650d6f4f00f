//! Traversal accumulator: builds the render graph during the cull phase
//!
//! The accumulator is a two-state machine. `begin_frame` moves it from
//! `Idle` to `Traversing` and cleans the bin set; `end_frame` moves it back.
//! Emission is only possible while `Idle` and only for frames that finished
//! accumulating without error, so a half-built graph is never submitted.

use log::{debug, trace, warn};

use super::depth::{max_scale, NearFar};
use super::event::{BinMode, BinTarget, DrawableVisit, TraversalEvent};
use crate::core::config::{AccumulatorConfig, RenderGraphConfig};
use crate::foundation::math;
use crate::graph::{DrawItem, FrameStats, GraphError, GraphResult, Leaf, RenderBinSet};
use crate::state::{RenderStateDescriptor, RenderingHint};

/// Accumulator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorPhase {
    /// Between frames; the bin set may be emitted
    Idle,
    /// Inside a frame's traversal
    Traversing,
}

/// Resolved entry of the active-bin stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveBin {
    order: i32,
    /// Set when this entry or any enclosing one is an `Override` redirect
    overridden: bool,
}

/// Pushes made since the matching `EnterNode`
#[derive(Debug, Clone, Copy, Default)]
struct NodeScope {
    states: usize,
    bins: usize,
}

/// Per-view builder of the state-sorted render graph
#[derive(Debug)]
pub struct TraversalAccumulator {
    config: AccumulatorConfig,
    bins: RenderBinSet,
    phase: AccumulatorPhase,
    state_stack: Vec<RenderStateDescriptor>,
    bin_stack: Vec<ActiveBin>,
    scopes: Vec<NodeScope>,
    near_far: NearFar,
    frame_number: u64,
    abandoned: bool,
}

impl TraversalAccumulator {
    /// Create an idle accumulator with its own bin set
    pub fn new(config: &RenderGraphConfig) -> Self {
        Self {
            config: config.accumulator.clone(),
            bins: RenderBinSet::from_config(config),
            phase: AccumulatorPhase::Idle,
            state_stack: Vec::new(),
            bin_stack: Vec::new(),
            scopes: Vec::new(),
            near_far: NearFar::new(),
            frame_number: 0,
            abandoned: false,
        }
    }

    /// Current phase
    pub fn phase(&self) -> AccumulatorPhase {
        self.phase
    }

    /// Number of frames begun so far
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Near/far range of the last accumulated frame
    pub fn near_far(&self) -> NearFar {
        self.near_far
    }

    /// The bin set being filled or last filled
    pub fn bins(&self) -> &RenderBinSet {
        &self.bins
    }

    /// Mutable access to the bin set, e.g. to adjust sort modes between frames
    pub fn bins_mut(&mut self) -> &mut RenderBinSet {
        &mut self.bins
    }

    fn expect_phase(&self, expected: AccumulatorPhase) -> GraphResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GraphError::InvalidPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Remember that the frame failed; it will not be emitted
    fn poison<T>(&mut self, result: GraphResult<T>) -> GraphResult<T> {
        if result.is_err() {
            self.abandoned = true;
        }
        result
    }

    /// Start a new frame: clean the bin set and enter `Traversing`
    pub fn begin_frame(&mut self) -> GraphResult<()> {
        self.expect_phase(AccumulatorPhase::Idle)?;

        self.frame_number += 1;
        self.bins.clean();
        self.state_stack.clear();
        self.bin_stack.clear();
        self.scopes.clear();
        self.near_far.reset();
        self.abandoned = false;
        self.phase = AccumulatorPhase::Traversing;

        trace!("frame {} accumulation started", self.frame_number);
        Ok(())
    }

    /// Push a state descriptor; it applies to drawables until popped
    pub fn push_state(&mut self, descriptor: RenderStateDescriptor) -> GraphResult<()> {
        self.expect_phase(AccumulatorPhase::Traversing)?;
        let reserved = self.state_stack.try_reserve(1).map_err(GraphError::from);
        self.poison(reserved)?;

        self.state_stack.push(descriptor);
        if let Some(scope) = self.scopes.last_mut() {
            scope.states += 1;
        }
        Ok(())
    }

    /// Pop the most recent state descriptor
    pub fn pop_state(&mut self) -> GraphResult<()> {
        self.expect_phase(AccumulatorPhase::Traversing)?;
        if let Some(scope) = self.scopes.last_mut() {
            if scope.states == 0 {
                return Err(GraphError::UnbalancedTraversal("state pop crosses a node boundary"));
            }
            scope.states -= 1;
        }
        self.state_stack
            .pop()
            .map(|_| ())
            .ok_or(GraphError::UnbalancedTraversal("state pop without push"))
    }

    /// Redirect subsequent drawables into another bin
    ///
    /// Any enclosing `Override` redirect wins unless `target` is `Protected`.
    /// A `Protected` redirect below an `Override` does not lift it for the
    /// redirects nested under it.
    pub fn push_bin(&mut self, target: &BinTarget) -> GraphResult<()> {
        self.expect_phase(AccumulatorPhase::Traversing)?;
        let reserved = self.bin_stack.try_reserve(1).map_err(GraphError::from);
        self.poison(reserved)?;

        let enclosing = self.bin_stack.last().copied();
        let active = match enclosing {
            Some(enclosing) if enclosing.overridden && target.mode != BinMode::Protected => {
                trace!("bin {} overridden by enclosing bin {}", target.order, enclosing.order);
                enclosing
            }
            _ => {
                self.bins.get_or_create_bin(target.order, target.name.as_deref());
                ActiveBin {
                    order: target.order,
                    overridden: target.mode == BinMode::Override
                        || enclosing.is_some_and(|enclosing| enclosing.overridden),
                }
            }
        };

        self.bin_stack.push(active);
        if let Some(scope) = self.scopes.last_mut() {
            scope.bins += 1;
        }
        Ok(())
    }

    /// Restore the bin that was active before the last redirect
    pub fn pop_bin(&mut self) -> GraphResult<()> {
        self.expect_phase(AccumulatorPhase::Traversing)?;
        if let Some(scope) = self.scopes.last_mut() {
            if scope.bins == 0 {
                return Err(GraphError::UnbalancedTraversal("bin pop crosses a node boundary"));
            }
            scope.bins -= 1;
        }
        self.bin_stack
            .pop()
            .map(|_| ())
            .ok_or(GraphError::UnbalancedTraversal("bin pop without push"))
    }

    /// Open a node scope for scoped state and bin pushes
    pub fn enter_node(&mut self) -> GraphResult<()> {
        self.expect_phase(AccumulatorPhase::Traversing)?;
        self.scopes.push(NodeScope::default());
        Ok(())
    }

    /// Close the current node scope, popping everything it pushed
    pub fn leave_node(&mut self) -> GraphResult<()> {
        self.expect_phase(AccumulatorPhase::Traversing)?;
        let scope = self
            .scopes
            .pop()
            .ok_or(GraphError::UnbalancedTraversal("leave without enter"))?;

        let states = self.state_stack.len().saturating_sub(scope.states);
        self.state_stack.truncate(states);
        let bins = self.bin_stack.len().saturating_sub(scope.bins);
        self.bin_stack.truncate(bins);
        Ok(())
    }

    /// Effective rendering hint of the active state stack
    fn active_hint(&self) -> RenderingHint {
        self.state_stack
            .iter()
            .rev()
            .map(RenderStateDescriptor::hint)
            .find(|hint| *hint != RenderingHint::Default)
            .unwrap_or_default()
    }

    /// Insert a drawable under the active state into the active bin
    pub fn add_drawable(&mut self, visit: &DrawableVisit) -> GraphResult<()> {
        self.expect_phase(AccumulatorPhase::Traversing)?;

        let center = math::to_view_space(&visit.model_view, &visit.bound.center);
        let depth = self.config.depth_metric.sort_depth(&center);
        if self.config.compute_near_far && visit.bound.is_valid() {
            let radius = visit.bound.radius * max_scale(&visit.model_view);
            self.near_far.include(math::view_distance(&center), radius);
        }

        let (order, name) = match self.bin_stack.last() {
            Some(active) => (active.order, None),
            None if self.active_hint() == RenderingHint::Transparent => (
                self.config.transparent_bin.order,
                self.config.transparent_bin.name.as_deref(),
            ),
            None => (0, Some(self.config.default_bin_name.as_str())),
        };

        let leaf = Leaf::new(visit.drawable, visit.model_view, depth);
        let inserted = self
            .bins
            .get_or_create_bin(order, name)
            .insert(&self.state_stack, leaf);
        self.poison(inserted)
    }

    /// Feed one traversal event
    pub fn apply(&mut self, event: TraversalEvent) -> GraphResult<()> {
        match event {
            TraversalEvent::EnterNode => self.enter_node(),
            TraversalEvent::StateOverride(descriptor) => self.push_state(descriptor),
            TraversalEvent::BinRedirect(target) => self.push_bin(&target),
            TraversalEvent::Drawable(visit) => self.add_drawable(&visit),
            TraversalEvent::LeaveNode => self.leave_node(),
        }
    }

    /// Finish the frame and return to `Idle`
    ///
    /// Fails, and abandons the frame, if accumulation hit an error or the
    /// traversal left scopes open.
    pub fn end_frame(&mut self) -> GraphResult<()> {
        self.expect_phase(AccumulatorPhase::Traversing)?;

        if self.abandoned {
            self.abandon_frame();
            return Err(GraphError::FrameAbandoned(self.frame_number));
        }
        if !self.scopes.is_empty() || !self.state_stack.is_empty() || !self.bin_stack.is_empty() {
            warn!(
                "Frame {} ended with {} open scopes, {} states, {} bins",
                self.frame_number,
                self.scopes.len(),
                self.state_stack.len(),
                self.bin_stack.len()
            );
            self.abandon_frame();
            return Err(GraphError::UnbalancedTraversal("frame ended with open scopes"));
        }

        self.bins.end_frame();
        let interval = u64::from(self.config.prune_interval_frames);
        if interval > 0 && self.frame_number % interval == 0 {
            self.bins.prune();
        }
        self.phase = AccumulatorPhase::Idle;

        debug!(
            "Frame {} accumulated {} leaves in {} bins",
            self.frame_number,
            self.bins.leaf_count(),
            self.bins.len()
        );
        Ok(())
    }

    /// Drop the current frame; nothing is emitted until the next frame ends cleanly
    pub fn abandon_frame(&mut self) {
        warn!("Abandoning frame {}", self.frame_number);
        self.bins.clean();
        self.state_stack.clear();
        self.bin_stack.clear();
        self.scopes.clear();
        self.abandoned = true;
        self.phase = AccumulatorPhase::Idle;
    }

    /// Run a whole frame from an event stream
    pub fn accumulate<I>(&mut self, events: I) -> GraphResult<()>
    where
        I: IntoIterator<Item = TraversalEvent>,
    {
        self.begin_frame()?;
        for event in events {
            if let Err(err) = self.apply(event) {
                self.abandon_frame();
                return Err(err);
            }
        }
        self.end_frame()
    }

    /// Visit the finished frame's leaves in final draw order
    pub fn emit_all<F>(&mut self, visitor: F) -> GraphResult<()>
    where
        F: FnMut(DrawItem<'_>),
    {
        self.expect_phase(AccumulatorPhase::Idle)?;
        if self.abandoned {
            return Err(GraphError::FrameAbandoned(self.frame_number));
        }
        self.bins.emit_all(visitor)
    }

    /// Statistics of the finished frame
    pub fn stats(&mut self) -> GraphResult<FrameStats> {
        self.expect_phase(AccumulatorPhase::Idle)?;
        if self.abandoned {
            return Err(GraphError::FrameAbandoned(self.frame_number));
        }
        self.bins.stats()
    }
}
