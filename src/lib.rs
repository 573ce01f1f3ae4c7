//! Semantic input routing
//!
//! Decouples physical input devices from application actions:
//! - input sources answer queries for paths like `/input/keyboard/key/32`
//! - filters transform readings on their way to an action
//! - action maps bind input paths to action paths like `/action/jump`
//! - the action manager polls everything once per frame, arbitrates
//!   conflicting bindings and notifies listeners on edges only

pub mod action;
pub mod core;
pub mod error;
pub mod filter;
pub mod input;
pub mod path;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::action::{
        ActionEvent, ActionManager, ActionMap, ActionSet, ActionState, Binding, BindingDescription, Listener,
        listener,
    };
    pub use crate::core::{ManagerConfig, PollStats};
    pub use crate::error::{DeviceError, FilterError, InputError, LoadError};
    pub use crate::filter::{Filter, SharedFilter};
    pub use crate::input::{InputQuery, InputSource, InputValue, Parameters, Reading, UiTarget};
}
