//! Core module
//!
//! Configuration, the per-poll event queue and poll statistics

mod config;
mod debug;
mod events;

pub use config::ManagerConfig;
pub use debug::PollStats;
pub use events::EventQueue;
