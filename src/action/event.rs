//! Action events and per-action state

use crate::input::{InputValue, Parameters, SourceRef};

/// One evaluated binding, or one action transition.
///
/// Action maps emit these as candidates every poll; the manager dispatches
/// the ones that represent a transition to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    /// Full semantic path of the action, like `/action/jump`
    pub action_path: String,
    /// Whether the action is (becoming) active
    pub active: bool,
    /// Value after filtering
    pub value: Option<InputValue>,
    /// Binding parameters, with filter parameters merged underneath
    pub action_parameters: Option<Parameters>,
    /// Filter the binding went through, if any
    pub filter_path: Option<String>,
    /// Parameters the binding supplied to that filter
    pub filter_parameters: Option<Parameters>,
    /// Source that produced the input
    pub source: Option<SourceRef>,
}

impl ActionEvent {
    /// A bare event with no value, parameters or source.
    #[must_use]
    pub fn new(action_path: impl Into<String>, active: bool) -> Self {
        Self {
            action_path: action_path.into(),
            active,
            value: None,
            action_parameters: None,
            filter_path: None,
            filter_parameters: None,
            source: None,
        }
    }
}

/// Stored state of an active action.
///
/// Exists only while the action is active; there is at most one per action path.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionState {
    /// Always `true` while the state exists
    pub active: bool,
    /// Latest value
    pub value: Option<InputValue>,
    /// Latest action parameters
    pub action_parameters: Option<Parameters>,
    /// Latest filter parameters
    pub filter_parameters: Option<Parameters>,
    /// Source currently driving the action
    pub input_source: Option<SourceRef>,
}

impl ActionState {
    /// An activation event for `action_path` carrying this state.
    #[must_use]
    pub fn to_event(&self, action_path: impl Into<String>) -> ActionEvent {
        ActionEvent {
            action_path: action_path.into(),
            active: true,
            value: self.value.clone(),
            action_parameters: self.action_parameters.clone(),
            filter_path: None,
            filter_parameters: self.filter_parameters.clone(),
            source: self.input_source.clone(),
        }
    }
}

impl From<&ActionEvent> for ActionState {
    fn from(event: &ActionEvent) -> Self {
        Self {
            active: true,
            value: event.value.clone(),
            action_parameters: event.action_parameters.clone(),
            filter_parameters: event.filter_parameters.clone(),
            input_source: event.source.clone(),
        }
    }
}
