//! Action module
//!
//! Bindings from input paths to action paths, their evaluation, and the
//! edge-triggered action state built on top of them.

mod arbiter;
mod description;
mod event;
mod listener;
mod manager;
mod map;
mod set;

pub use arbiter::Arbiter;
pub use description::{BindingDescription, FilterEntry, InputEntry};
pub use event::{ActionEvent, ActionState};
pub use listener::{Listener, ListenerRegistry, listener};
pub use manager::ActionManager;
pub use map::{ActionMap, Binding, UpdateReport};
pub use set::ActionSet;
