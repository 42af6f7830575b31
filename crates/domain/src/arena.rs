//! Append-only action storage with tombstones.
//!
//! Slots are never compacted: removing an action clears its slot and its
//! index entry, so the position of every other action (and the href already
//! handed out for it) stays stable.

use std::collections::HashMap;

use crate::action::Action;
use crate::id::ActionId;

/// Actions of one name, in creation order.
#[derive(Debug, Clone, Default)]
pub struct ActionArena {
    slots: Vec<Option<Action>>,
    index: HashMap<ActionId, usize>,
}

impl ActionArena {
    pub fn push(&mut self, action: Action) {
        self.index.insert(action.id(), self.slots.len());
        self.slots.push(Some(action));
    }

    #[must_use]
    pub fn get(&self, id: ActionId) -> Option<&Action> {
        let slot = *self.index.get(&id)?;
        self.slots.get(slot)?.as_ref()
    }

    pub fn get_mut(&mut self, id: ActionId) -> Option<&mut Action> {
        let slot = *self.index.get(&id)?;
        self.slots.get_mut(slot)?.as_mut()
    }

    /// Tombstone the action with `id`, returning it if it was live.
    pub fn remove(&mut self, id: ActionId) -> Option<Action> {
        let slot = self.index.remove(&id)?;
        self.slots.get_mut(slot)?.take()
    }

    /// Live actions in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Action> {
        self.slots.iter_mut().flatten()
    }

    /// Number of live actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of slots ever allocated, tombstones included.
    #[must_use]
    pub fn capacity_used(&self) -> usize {
        self.slots.len()
    }
}
