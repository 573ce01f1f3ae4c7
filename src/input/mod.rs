//! Input handling module
//!
//! Input sources, the values they report and the prefix registry that routes
//! full semantic paths to them.

mod registry;
mod source;
mod table;
mod value;

pub use registry::SourceRegistry;
pub use source::{InputQuery, InputReading, InputSource, Reading, SourceRef};
pub use table::{InputFeed, TableInputSource};
pub use value::{InputValue, Parameters, UiTarget};
