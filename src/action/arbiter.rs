//! Per-poll arbitration
//!
//! Any number of bindings may target the same action path in one poll. The
//! arbiter collects their candidate events and turns them into at most one
//! transition per action path:
//!
//! ```text
//!            activation candidate
//!   Inactive ───────────────────────► Active
//!   (no state) ◄─────────────────────  (state stored)
//!            deactivation candidate,
//!            no activation candidate this poll
//! ```
//!
//! - The first activation and the first deactivation candidate per path are
//!   kept; later duplicates in the same poll are dropped.
//! - An activation candidate cancels the deactivation candidate for its path.
//! - An activation for an already-active path refreshes the stored value and
//!   parameters without producing a transition.

use rustc_hash::FxHashMap;

use crate::action::{ActionEvent, ActionState};

/// Candidate buffers plus the action state store.
#[derive(Debug, Default)]
pub struct Arbiter {
    states: FxHashMap<String, ActionState>,
    activations: Vec<ActionEvent>,
    deactivations: Vec<ActionEvent>,
}

impl Arbiter {
    /// Create an arbiter with no active actions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a candidate event for the current poll.
    ///
    /// Returns `false` if an earlier candidate with the same path and the same
    /// `active` flag was already offered this poll.
    pub fn offer(&mut self, event: ActionEvent) -> bool {
        let buffer = if event.active {
            &mut self.activations
        } else {
            &mut self.deactivations
        };
        if buffer.iter().any(|e| e.action_path == event.action_path) {
            return false;
        }
        buffer.push(event);
        true
    }

    /// Apply the buffered candidates to the state store.
    ///
    /// `on_transition` receives every resulting transition: activations first,
    /// in the order their candidates were offered, then deactivations. Both
    /// buffers are empty afterwards.
    pub fn resolve(&mut self, mut on_transition: impl FnMut(ActionEvent)) -> usize {
        let mut transitions = 0;

        for event in std::mem::take(&mut self.activations) {
            self.deactivations
                .retain(|e| e.action_path != event.action_path);

            match self.states.get_mut(&event.action_path) {
                Some(state) => {
                    // parameter changes while held are not edges
                    *state = ActionState::from(&event);
                }
                None => {
                    self.states
                        .insert(event.action_path.clone(), ActionState::from(&event));
                    transitions += 1;
                    on_transition(event);
                }
            }
        }

        for event in std::mem::take(&mut self.deactivations) {
            if self.states.remove(&event.action_path).is_some() {
                transitions += 1;
                on_transition(event);
            }
        }

        transitions
    }

    /// Whether `action_path` is currently active.
    #[must_use]
    pub fn is_active(&self, action_path: &str) -> bool {
        self.states.contains_key(action_path)
    }

    /// Stored state of `action_path`, if active.
    #[must_use]
    pub fn state(&self, action_path: &str) -> Option<&ActionState> {
        self.states.get(action_path)
    }

    /// Iterate over active actions.
    pub fn states(&self) -> impl Iterator<Item = (&str, &ActionState)> + '_ {
        self.states.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of active actions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.states.len()
    }

    /// Drop the state of `action_path` without producing a transition.
    pub fn forget(&mut self, action_path: &str) -> Option<ActionState> {
        self.states.remove(action_path)
    }

    /// Drop every state and pending candidate without producing transitions.
    ///
    /// Returns the paths that were active.
    pub fn reset(&mut self) -> Vec<String> {
        self.activations.clear();
        self.deactivations.clear();
        self.states.drain().map(|(path, _)| path).collect()
    }
}
