//! Table-backed input source
//!
//! The host (or a test) writes readings through an [`InputFeed`] at any time,
//! from any thread. Writes are staged and only become visible to queries when
//! the source is polled, so every query within one poll sees the same snapshot.
//!
//! # Example
//!
//! ```ignore
//! let source = TableInputSource::new("Scripted");
//! let feed = source.feed();
//! manager.add_input_source("script", source);
//!
//! feed.press("/0/jump");
//! manager.poll(); // /input/script/0/jump is now active
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::DeviceError;
use crate::input::{InputSource, InputValue, Reading};

#[derive(Debug, Default)]
struct FeedState {
    /// Writes since the last poll, applied in order
    pending: Vec<(String, Option<Reading>)>,
    /// Haptic pulses received, in milliseconds
    pulses: Vec<u32>,
}

/// Write handle for a [`TableInputSource`].
#[derive(Debug, Clone, Default)]
pub struct InputFeed {
    state: Arc<Mutex<FeedState>>,
}

impl InputFeed {
    /// Stage a reading for `relative_path`.
    pub fn set(&self, relative_path: impl Into<String>, reading: Reading) {
        self.state
            .lock()
            .pending
            .push((relative_path.into(), Some(reading)));
    }

    /// Stage an active reading with value `true`.
    pub fn press(&self, relative_path: impl Into<String>) {
        self.set(relative_path, Reading::active(true));
    }

    /// Stage an inactive reading with value `false`.
    pub fn release(&self, relative_path: impl Into<String>) {
        self.set(relative_path, Reading::new(false, Some(InputValue::Bool(false))));
    }

    /// Stage an active reading carrying `value`.
    pub fn set_value(&self, relative_path: impl Into<String>, value: impl Into<InputValue>) {
        self.set(relative_path, Reading::active(value));
    }

    /// Stage removal of `relative_path`; it will read as inactive with no value.
    pub fn remove(&self, relative_path: impl Into<String>) {
        self.state.lock().pending.push((relative_path.into(), None));
    }

    /// Take every haptic pulse delivered to the source so far.
    pub fn take_pulses(&self) -> Vec<u32> {
        std::mem::take(&mut self.state.lock().pulses)
    }
}

/// Input source answering from a table of readings keyed by relative path.
#[derive(Debug)]
pub struct TableInputSource {
    name: String,
    feed: InputFeed,
    snapshot: FxHashMap<String, Reading>,
    haptics: bool,
}

impl TableInputSource {
    /// Create an empty table source.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feed: InputFeed::default(),
            snapshot: FxHashMap::default(),
            haptics: false,
        }
    }

    /// Accept haptic pulses (recorded on the feed) instead of ignoring them.
    #[must_use]
    pub fn with_haptics(mut self) -> Self {
        self.haptics = true;
        self
    }

    /// Seed the table with a reading that is visible before the first poll.
    #[must_use]
    pub fn with_reading(mut self, relative_path: impl Into<String>, reading: Reading) -> Self {
        self.snapshot.insert(relative_path.into(), reading);
        self
    }

    /// A write handle sharing this source's staging area.
    #[must_use]
    pub fn feed(&self) -> InputFeed {
        self.feed.clone()
    }

    /// Number of paths with a committed reading.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    /// Whether no path has a committed reading.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

impl InputSource for TableInputSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self) -> Result<(), DeviceError> {
        let pending = std::mem::take(&mut self.feed.state.lock().pending);
        for (path, reading) in pending {
            match reading {
                Some(reading) => {
                    self.snapshot.insert(path, reading);
                }
                None => {
                    self.snapshot.remove(&path);
                }
            }
        }
        Ok(())
    }

    fn query_input_path(&self, relative_path: &str) -> Result<Reading, DeviceError> {
        Ok(self
            .snapshot
            .get(relative_path)
            .cloned()
            .unwrap_or_default())
    }

    fn send_haptic_pulse(&mut self, milliseconds: u32) -> bool {
        if !self.haptics {
            return false;
        }
        self.feed.state.lock().pulses.push(milliseconds);
        true
    }
}
