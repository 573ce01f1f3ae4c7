//! Action maps
//!
//! An action map binds input paths to action paths, optionally through a
//! filter, and evaluates those bindings on demand.
//!
//! # Example
//!
//! ```ignore
//! let mut map = manager.new_action_map();
//! map.bind("/input/keyboard/key/32", "/action/jump");
//! map.bind(
//!     "/input/gamepad/0/axis/1",
//!     Binding::new("/action/forward").through("/filter/min-max", params),
//! );
//! manager.add_action_map("walking", map);
//! ```

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::action::ActionEvent;
use crate::action::description::{self, BindingDescription, Entry};
use crate::error::LoadError;
use crate::filter::SharedFilter;
use crate::input::{InputQuery, Parameters};

/// Target side of a binding: where an input goes and how.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Action path, like `/action/jump`
    pub action_path: String,
    /// Parameters emitted with the action
    pub action_parameters: Option<Parameters>,
    /// Filter path, like `/filter/min-max`
    pub filter_path: Option<String>,
    /// Parameters handed to the filter
    pub filter_parameters: Option<Parameters>,
}

impl Binding {
    /// Bind straight to `action_path`.
    #[must_use]
    pub fn new(action_path: impl Into<String>) -> Self {
        Self {
            action_path: action_path.into(),
            action_parameters: None,
            filter_path: None,
            filter_parameters: None,
        }
    }

    /// Emit `parameters` with the action.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.action_parameters = Some(parameters);
        self
    }

    /// Route the input through the filter at `filter_path`.
    #[must_use]
    pub fn through(mut self, filter_path: impl Into<String>, parameters: Option<Parameters>) -> Self {
        self.filter_path = Some(filter_path.into());
        self.filter_parameters = parameters;
        self
    }
}

impl From<&str> for Binding {
    fn from(action_path: &str) -> Self {
        Self::new(action_path)
    }
}

impl From<String> for Binding {
    fn from(action_path: String) -> Self {
        Self::new(action_path)
    }
}

/// What one [`ActionMap::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Distinct input paths queried
    pub queried: usize,
    /// Candidate events emitted
    pub emitted: usize,
    /// Bindings skipped because their filter is not available to this map
    pub skipped: usize,
    /// Bindings skipped because their source or filter returned an error
    pub failed: usize,
}

/// Merge two optional parameter sets; keys in `over` win.
fn merge_parameters(under: Option<&Parameters>, over: Option<&Parameters>) -> Option<Parameters> {
    match (under, over) {
        (None, None) => None,
        (Some(p), None) | (None, Some(p)) => Some(p.clone()),
        (Some(under), Some(over)) => {
            let mut merged = under.clone();
            merged.extend(over.iter().map(|(k, v)| (k.clone(), v.clone())));
            Some(merged)
        }
    }
}

/// Entries decoded by a background load, plus the error that stopped it
type Loaded = (Vec<Entry>, Option<LoadError>);
type PendingLoad = Receiver<Loaded>;

/// Ordered input → action bindings plus the filters they may use.
#[derive(Default)]
pub struct ActionMap {
    filters: FxHashMap<String, SharedFilter>,
    /// Bindings grouped by input path, both levels in insertion order
    bindings: Vec<(String, SmallVec<[Binding; 2]>)>,
    index: FxHashMap<String, usize>,
    /// Unknown filter paths already warned about
    reported: FxHashSet<String>,
    pending: Option<PendingLoad>,
    load_error: Option<LoadError>,
}

impl ActionMap {
    /// Create a map with no filters and no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map that may use the given filters, typically
    /// [`ActionManager::filters`](crate::action::ActionManager::filters).
    #[must_use]
    pub fn with_filters<'a>(filters: impl IntoIterator<Item = (&'a str, &'a SharedFilter)>) -> Self {
        let mut map = Self::new();
        for (path, filter) in filters {
            map.add_filter(path, SharedFilter::clone(filter));
        }
        map
    }

    /// Make the filter at `filter_path` available to this map's bindings.
    pub fn add_filter(&mut self, filter_path: impl Into<String>, filter: SharedFilter) {
        let filter_path = filter_path.into();
        self.reported.remove(&filter_path);
        self.filters.insert(filter_path, filter);
    }

    /// Whether a filter is available at `filter_path`.
    #[must_use]
    pub fn has_filter(&self, filter_path: &str) -> bool {
        self.filters.contains_key(filter_path)
    }

    /// Append a binding for `input_path`.
    ///
    /// Never replaces: binding the same input twice evaluates both, in order.
    pub fn bind(&mut self, input_path: impl Into<String>, binding: impl Into<Binding>) {
        let input_path = input_path.into();
        let binding = binding.into();

        if let Some(filter_path) = &binding.filter_path
            && !self.filters.contains_key(filter_path)
            && self.reported.insert(filter_path.clone())
        {
            log::warn!(
                "binding {input_path} -> {} uses unknown filter {filter_path}",
                binding.action_path
            );
        }

        match self.index.get(&input_path) {
            Some(&slot) => self.bindings[slot].1.push(binding),
            None => {
                self.index.insert(input_path.clone(), self.bindings.len());
                let mut group = SmallVec::new();
                group.push(binding);
                self.bindings.push((input_path, group));
            }
        }
    }

    /// Remove every binding for `input_path`. Returns how many were removed.
    pub fn unbind(&mut self, input_path: &str) -> usize {
        let Some(slot) = self.index.remove(input_path) else {
            return 0;
        };
        let (_, removed) = self.bindings.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        removed.len()
    }

    /// Remove every binding. Filters stay available.
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.index.clear();
    }

    /// Bindings for `input_path`, in insertion order.
    #[must_use]
    pub fn bindings_for(&self, input_path: &str) -> &[Binding] {
        self.index
            .get(input_path)
            .map(|&slot| self.bindings[slot].1.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate over every `(input_path, binding)` in evaluation order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Binding)> + '_ {
        self.bindings
            .iter()
            .flat_map(|(input, group)| group.iter().map(move |b| (input.as_str(), b)))
    }

    /// Total number of bindings.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.iter().map(|(_, g)| g.len()).sum()
    }

    /// Whether any binding targets `action_path`.
    #[must_use]
    pub fn targets(&self, action_path: &str) -> bool {
        self.bindings().any(|(_, b)| b.action_path == action_path)
    }

    /// Evaluate every binding against `inputs`, handing candidate events to `emit`.
    ///
    /// Each distinct input path is queried exactly once. Bindings whose
    /// source or filter fails, or whose filter is unknown, are skipped and
    /// logged; the rest are unaffected.
    pub fn update(&mut self, inputs: &dyn InputQuery, emit: &mut dyn FnMut(ActionEvent)) -> UpdateReport {
        self.finish_load();

        let Self {
            filters,
            bindings,
            reported,
            ..
        } = self;
        let mut report = UpdateReport::default();

        for (input_path, group) in bindings.iter() {
            report.queried += 1;
            let reading = match inputs.try_query_input_path(input_path) {
                Ok(reading) => reading,
                Err(err) => {
                    log::warn!("skipping bindings for {input_path}: {err}");
                    report.failed += group.len();
                    continue;
                }
            };

            for binding in group {
                let Some(filter_path) = &binding.filter_path else {
                    emit(ActionEvent {
                        action_path: binding.action_path.clone(),
                        active: reading.active,
                        value: reading.value.clone(),
                        action_parameters: binding.action_parameters.clone(),
                        filter_path: None,
                        filter_parameters: None,
                        source: reading.source.clone(),
                    });
                    report.emitted += 1;
                    continue;
                };

                let Some(filter) = filters.get(filter_path) else {
                    if reported.insert(filter_path.clone()) {
                        log::warn!("unknown filter {filter_path} on {input_path}, binding skipped");
                    } else {
                        log::trace!("unknown filter {filter_path} on {input_path}, binding skipped");
                    }
                    report.skipped += 1;
                    continue;
                };

                let filtered = match filter.filter(
                    input_path,
                    reading.reading(),
                    filter_path,
                    binding.filter_parameters.as_ref(),
                    inputs,
                ) {
                    Ok(filtered) => filtered,
                    Err(err) => {
                        log::warn!("filter {filter_path} failed on {input_path}: {err}");
                        report.failed += 1;
                        continue;
                    }
                };

                emit(ActionEvent {
                    action_path: binding.action_path.clone(),
                    active: filtered.active,
                    value: filtered.value,
                    action_parameters: merge_parameters(
                        binding.filter_parameters.as_ref(),
                        binding.action_parameters.as_ref(),
                    ),
                    filter_path: Some(filter_path.clone()),
                    filter_parameters: binding.filter_parameters.clone(),
                    source: reading.source.clone(),
                });
                report.emitted += 1;
            }
        }

        report
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Bind every entry of a decoded description. Returns the number bound.
    pub fn load_data(&mut self, description: &BindingDescription) -> usize {
        for entry in &description.inputs {
            self.apply(Entry::Input(entry.clone()));
        }
        for entry in &description.filters {
            self.apply(Entry::Filter(entry.clone()));
        }
        description.len()
    }

    /// Bind the entries of a JSON document, one at a time.
    ///
    /// # Errors
    ///
    /// Returns the first decoding error; entries before it remain bound.
    pub fn load_json_str(&mut self, json: &str) -> Result<usize, LoadError> {
        let document: serde_json::Value =
            serde_json::from_str(json).map_err(|e| LoadError::Parse(e.to_string()))?;
        description::for_each_entry(&document, |entry| self.apply(entry))
    }

    /// Bind the entries of a RON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not decode; nothing is bound then.
    pub fn load_ron_str(&mut self, text: &str) -> Result<usize, LoadError> {
        let description = BindingDescription::from_ron_str(text)?;
        Ok(self.load_data(&description))
    }

    /// Read a binding file (`.ron` or JSON) and bind its entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded. For JSON,
    /// entries before a malformed one remain bound.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize, LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io(e.to_string()))?;
        let result = if description::is_ron(path) {
            self.load_ron_str(&content)
        } else {
            self.load_json_str(&content)
        };
        if let Err(err) = &result {
            log::error!("failed to load bindings from {}: {err}", path.display());
        }
        result
    }

    /// Read and decode a binding file on a background thread.
    ///
    /// The map keeps evaluating its current bindings meanwhile; the loaded
    /// entries are bound at the start of the first `update` after the load
    /// completes. A failure is logged and kept in [`load_error`](Self::load_error);
    /// as with [`load_file`](Self::load_file), JSON entries before the
    /// malformed one are still bound.
    pub fn load_file_in_background(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        let (sender, receiver) = mpsc::channel();
        self.load_error = None;
        self.pending = Some(receiver);
        thread::spawn(move || {
            // receiver may be gone if the map was dropped
            let _ = sender.send(description::read_entries(&path));
        });
    }

    /// Whether a background load is still outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Block until an outstanding background load has been applied.
    ///
    /// Returns the load error, if the load failed.
    pub fn wait_for_load(&mut self) -> Option<&LoadError> {
        if let Some(receiver) = self.pending.take() {
            let loaded = receiver
                .recv()
                .unwrap_or_else(|_| (Vec::new(), Some(LoadError::Disconnected)));
            self.apply_loaded(loaded);
        }
        self.load_error.as_ref()
    }

    /// Error of the last background load, if it failed.
    #[must_use]
    pub fn load_error(&self) -> Option<&LoadError> {
        self.load_error.as_ref()
    }

    fn finish_load(&mut self) {
        let Some(receiver) = &self.pending else {
            return;
        };
        let loaded = match receiver.try_recv() {
            Ok(loaded) => loaded,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => (Vec::new(), Some(LoadError::Disconnected)),
        };
        self.pending = None;
        self.apply_loaded(loaded);
    }

    fn apply_loaded(&mut self, (entries, error): Loaded) {
        let count = entries.len();
        for entry in entries {
            self.apply(entry);
        }
        log::debug!("background load bound {count} entries");
        if let Some(err) = error {
            log::error!("background binding load failed: {err}");
            self.load_error = Some(err);
        }
    }

    fn apply(&mut self, entry: Entry) {
        match entry {
            Entry::Input(e) => {
                let mut binding = Binding::new(e.destination);
                binding.action_parameters = e.parameters;
                self.bind(e.source, binding);
            }
            Entry::Filter(e) => {
                let mut binding = Binding::new(e.destination).through(e.filter, e.filter_parameters);
                binding.action_parameters = e.action_parameters;
                self.bind(e.source, binding);
            }
        }
    }
}

impl std::fmt::Debug for ActionMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut filters: Vec<_> = self.filters.keys().collect();
        filters.sort();
        f.debug_struct("ActionMap")
            .field("filters", &filters)
            .field("bindings", &self.bindings)
            .field("loading", &self.pending.is_some())
            .finish()
    }
}
