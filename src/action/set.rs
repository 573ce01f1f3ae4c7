//! Action sets
//!
//! An action set wraps one action map and turns its raw, level-style
//! candidate events into edge-triggered transitions, keeping its own
//! active/inactive bookkeeping. The manager holds at most one active set and
//! feeds the set's transitions into its own arbitration.

use crate::action::{ActionEvent, ActionMap, ActionState, Arbiter, Listener, ListenerRegistry, UpdateReport};
use crate::input::InputQuery;

/// One action map with local edge detection and its own listeners.
#[derive(Debug, Default)]
pub struct ActionSet {
    map: ActionMap,
    arbiter: Arbiter,
    listeners: ListenerRegistry<ActionEvent>,
}

impl ActionSet {
    /// Wrap `map`.
    #[must_use]
    pub fn new(map: ActionMap) -> Self {
        Self {
            map,
            arbiter: Arbiter::new(),
            listeners: ListenerRegistry::new(),
        }
    }

    /// The wrapped map.
    #[must_use]
    pub fn map(&self) -> &ActionMap {
        &self.map
    }

    /// The wrapped map, for rebinding.
    pub fn map_mut(&mut self) -> &mut ActionMap {
        &mut self.map
    }

    /// Register a listener for transitions matching `pattern`.
    pub fn add_action_listener(&mut self, pattern: impl Into<String>, listener: Listener<ActionEvent>) -> bool {
        self.listeners.add(pattern, listener)
    }

    /// Unregister a listener.
    pub fn remove_action_listener(&mut self, pattern: &str, listener: &Listener<ActionEvent>) -> bool {
        self.listeners.remove(pattern, listener)
    }

    /// Evaluate the map and return this poll's transitions, after handing
    /// them to the set's own listeners.
    pub fn update(&mut self, inputs: &dyn InputQuery) -> (Vec<ActionEvent>, UpdateReport) {
        let Self {
            map,
            arbiter,
            listeners,
        } = self;

        let report = map.update(inputs, &mut |event| {
            arbiter.offer(event);
        });

        let mut transitions = Vec::new();
        arbiter.resolve(|event| {
            listeners.notify(&event.action_path, &event);
            transitions.push(event);
        });
        (transitions, report)
    }

    /// Whether the set currently considers `action_path` active.
    #[must_use]
    pub fn is_active(&self, action_path: &str) -> bool {
        self.arbiter.is_active(action_path)
    }

    /// Iterate over the paths the set currently considers active.
    pub fn active_paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.active_states().map(|(path, _)| path)
    }

    /// Iterate over the actions the set currently holds, with their latest state.
    pub fn active_states(&self) -> impl Iterator<Item = (&str, &ActionState)> + '_ {
        self.arbiter.states()
    }

    /// Forget all local state without producing transitions.
    ///
    /// Returns the paths that were active.
    pub fn reset(&mut self) -> Vec<String> {
        self.arbiter.reset()
    }
}

impl From<ActionMap> for ActionSet {
    fn from(map: ActionMap) -> Self {
        Self::new(map)
    }
}
