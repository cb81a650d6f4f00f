//! Render-state descriptors and the state-set builder

use std::collections::BTreeMap;
use std::sync::Arc;

use super::attribute::{RenderingHint, StateCategory, StateFlags, StateValue};
use crate::graph::GraphError;

/// One category/value pair plus its inheritance flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateEntry {
    /// Which piece of device state this entry sets
    pub category: StateCategory,
    /// The value to set
    pub value: StateValue,
    /// Inheritance flags, stripped from device descriptors
    pub flags: StateFlags,
}

impl StateEntry {
    /// Whether this entry survives a later entry in the same category
    fn wins_against(&self, later: &Self) -> bool {
        self.flags.contains(StateFlags::OVERRIDE) && !later.flags.contains(StateFlags::PROTECTED)
    }
}

/// Immutable, totally ordered description of device state
///
/// Entries are sorted by category and unique per category. Cloning shares
/// the entry storage.
///
/// Derived equality and ordering include the inheritance flags, because a
/// descriptor as pushed is also the key of its render-state node. Device
/// equivalence is equality of [`device_state`](Self::device_state), which is
/// what emitted leaves carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderStateDescriptor {
    entries: Arc<[StateEntry]>,
    hint: RenderingHint,
}

impl RenderStateDescriptor {
    /// The identity descriptor: no state changes at all
    pub fn empty() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
            hint: RenderingHint::Default,
        }
    }

    /// Entries in category order
    pub fn entries(&self) -> &[StateEntry] {
        &self.entries
    }

    /// Rendering hint carried by this descriptor
    pub fn hint(&self) -> RenderingHint {
        self.hint
    }

    /// True when the descriptor asks for blended, depth-sorted drawing
    pub fn is_transparent(&self) -> bool {
        self.hint == RenderingHint::Transparent
    }

    /// True for the identity descriptor
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.hint == RenderingHint::Default
    }

    /// Look up the entry for a category
    pub fn get(&self, category: StateCategory) -> Option<&StateEntry> {
        self.entries
            .binary_search_by(|entry| entry.category.cmp(&category))
            .ok()
            .map(|index| &self.entries[index])
    }

    /// Layer `over` on top of `self`
    ///
    /// Per category the later entry replaces the earlier one, unless the
    /// earlier entry is `OVERRIDE` and the later one is not `PROTECTED`.
    /// The hint is the last non-default hint.
    pub fn compose(&self, over: &Self) -> Self {
        let hint = if over.hint == RenderingHint::Default {
            self.hint
        } else {
            over.hint
        };

        if over.entries.is_empty() {
            return Self {
                entries: Arc::clone(&self.entries),
                hint,
            };
        }
        if self.entries.is_empty() {
            return Self {
                entries: Arc::clone(&over.entries),
                hint,
            };
        }

        let mut merged = Vec::with_capacity(self.entries.len() + over.entries.len());
        let (mut below, mut above) = (self.entries.iter().peekable(), over.entries.iter().peekable());
        loop {
            match (below.peek(), above.peek()) {
                (Some(b), Some(a)) => match b.category.cmp(&a.category) {
                    std::cmp::Ordering::Less => {
                        merged.push(**b);
                        below.next();
                    }
                    std::cmp::Ordering::Greater => {
                        merged.push(**a);
                        above.next();
                    }
                    std::cmp::Ordering::Equal => {
                        merged.push(if b.wins_against(a) { **b } else { **a });
                        below.next();
                        above.next();
                    }
                },
                (Some(b), None) => {
                    merged.push(**b);
                    below.next();
                }
                (None, Some(a)) => {
                    merged.push(**a);
                    above.next();
                }
                (None, None) => break,
            }
        }

        Self {
            entries: Arc::from(merged),
            hint,
        }
    }

    /// The same state with inheritance flags removed
    ///
    /// Two device descriptors are equal iff they configure the device identically.
    pub fn device_state(&self) -> Self {
        if self.entries.iter().all(|entry| entry.flags.is_empty()) {
            return self.clone();
        }
        let stripped: Vec<StateEntry> = self
            .entries
            .iter()
            .map(|entry| StateEntry {
                flags: StateFlags::empty(),
                ..*entry
            })
            .collect();
        Self {
            entries: Arc::from(stripped),
            hint: self.hint,
        }
    }
}

impl Default for RenderStateDescriptor {
    fn default() -> Self {
        Self::empty()
    }
}

/// Mutable collection of state entries attached to a scene node
///
/// Values are validated against their category on insertion, so every
/// descriptor built from a state set is well formed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSet {
    entries: BTreeMap<StateCategory, (StateValue, StateFlags)>,
    hint: RenderingHint,
}

impl StateSet {
    /// Create an empty state set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value for a category
    pub fn set(&mut self, category: StateCategory, value: StateValue) -> Result<(), GraphError> {
        self.set_with_flags(category, value, StateFlags::empty())
    }

    /// Set a value together with its inheritance flags
    pub fn set_with_flags(
        &mut self,
        category: StateCategory,
        value: StateValue,
        flags: StateFlags,
    ) -> Result<(), GraphError> {
        if !category.accepts(&value) {
            return Err(GraphError::MalformedDescriptor(format!(
                "{value:?} is not a valid value for {category:?}"
            )));
        }
        self.entries.insert(category, (value, flags));
        Ok(())
    }

    /// Builder form of [`StateSet::set`]
    pub fn with(mut self, category: StateCategory, value: StateValue) -> Result<Self, GraphError> {
        self.set(category, value)?;
        Ok(self)
    }

    /// Builder form of [`StateSet::set_with_flags`]
    pub fn with_flags(
        mut self,
        category: StateCategory,
        value: StateValue,
        flags: StateFlags,
    ) -> Result<Self, GraphError> {
        self.set_with_flags(category, value, flags)?;
        Ok(self)
    }

    /// Remove a category, returning its previous value
    pub fn remove(&mut self, category: StateCategory) -> Option<StateValue> {
        self.entries.remove(&category).map(|(value, _)| value)
    }

    /// Set the rendering hint
    pub fn set_rendering_hint(&mut self, hint: RenderingHint) {
        self.hint = hint;
    }

    /// Builder form of [`StateSet::set_rendering_hint`]
    pub fn with_rendering_hint(mut self, hint: RenderingHint) -> Self {
        self.hint = hint;
        self
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries and no hint are set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.hint == RenderingHint::Default
    }

    /// Freeze into a descriptor
    pub fn build(&self) -> RenderStateDescriptor {
        let entries: Vec<StateEntry> = self
            .entries
            .iter()
            .map(|(&category, &(value, flags))| StateEntry { category, value, flags })
            .collect();
        RenderStateDescriptor {
            entries: Arc::from(entries),
            hint: self.hint,
        }
    }
}

impl From<&StateSet> for RenderStateDescriptor {
    fn from(set: &StateSet) -> Self {
        set.build()
    }
}
