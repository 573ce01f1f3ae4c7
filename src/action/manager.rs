//! Action manager
//!
//! The manager owns every registry (input sources, filters, action maps and
//! action sets), decides which maps are active, and runs the per-poll cycle:
//!
//! 1. poll every input source
//! 2. evaluate the active maps (and the active set) into candidate events
//! 3. arbitrate the candidates into at most one transition per action path
//! 4. hand each transition to the matching listeners and the transition queue
//!
//! Listeners receive `&ActionEvent` only, so they cannot reach back into the
//! manager while a poll is running.
//!
//! # Example
//!
//! ```ignore
//! let mut manager = ActionManager::new();
//! manager.add_input_source("keyboard", keyboard);
//!
//! let mut map = manager.new_action_map();
//! map.bind("/input/keyboard/key/32", "/action/jump");
//! manager.add_action_map("walking", map);
//! manager.activate_action_maps(&["walking"])?;
//!
//! manager.add_action_listener("/action/*", listener(|e: &ActionEvent| {
//!     println!("{} -> {}", e.action_path, e.active);
//! }));
//!
//! loop {
//!     manager.poll();
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::action::{ActionEvent, ActionMap, ActionSet, ActionState, Arbiter, Listener, ListenerRegistry};
use crate::core::{EventQueue, ManagerConfig, PollStats};
use crate::error::InputError;
use crate::filter::{self, Filter, SharedFilter};
use crate::input::{InputQuery, InputReading, InputSource, SourceRef, SourceRegistry};
use crate::path;

/// Top-level orchestrator of input routing.
pub struct ActionManager {
    config: ManagerConfig,
    sources: SourceRegistry,
    /// Registered filters by full path, in registration order
    filters: Vec<(String, SharedFilter)>,
    maps: FxHashMap<String, ActionMap>,
    /// Active map names, in evaluation order
    active_maps: Vec<String>,
    sets: FxHashMap<String, ActionSet>,
    active_set: Option<String>,
    arbiter: Arbiter,
    listeners: ListenerRegistry<ActionEvent>,
    transitions: EventQueue<ActionEvent>,
    stats: PollStats,
}

impl ActionManager {
    /// Create a manager with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Create a manager with custom configuration.
    #[must_use]
    pub fn with_config(config: ManagerConfig) -> Self {
        let mut manager = Self {
            sources: SourceRegistry::new(),
            filters: Vec::new(),
            maps: FxHashMap::default(),
            active_maps: Vec::new(),
            sets: FxHashMap::default(),
            active_set: None,
            arbiter: Arbiter::new(),
            listeners: ListenerRegistry::new(),
            transitions: EventQueue::with_capacity(config.event_capacity),
            stats: PollStats::new(),
            config,
        };

        if manager.config.default_filters {
            for (name, filter) in filter::default_filters() {
                manager.add_shared_filter(name, filter);
            }
        }

        manager
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // ========================================================================
    // Input sources
    // ========================================================================

    /// Mount `source` at `<input_root>/<name>` and return that prefix.
    ///
    /// A source already mounted under the same name is replaced.
    pub fn add_input_source(&mut self, name: &str, source: impl InputSource + 'static) -> String {
        let prefix = path::join(&self.config.input_root, name);
        self.sources.mount(prefix.clone(), Box::new(source));
        prefix
    }

    /// Unmount the source registered under `name`.
    pub fn remove_input_source(&mut self, name: &str) -> Option<Box<dyn InputSource>> {
        let prefix = path::join(&self.config.input_root, name);
        let removed = self.sources.unmount(&prefix);
        if removed.is_some() {
            log::debug!("removed input source {prefix}");
        }
        removed
    }

    /// Iterate over mounted sources in registration order.
    pub fn input_sources(&self) -> impl Iterator<Item = (&SourceRef, &dyn InputSource)> + '_ {
        self.sources.iter()
    }

    /// Query an input by its full path.
    ///
    /// Unmatched paths, and sources that fail, read as inactive with no value.
    #[must_use]
    pub fn query_input_path(&self, full_path: &str) -> InputReading {
        self.sources.query_input_path(full_path)
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Register `filter` at `<filter_root>/<name>` and return that path.
    pub fn add_filter(&mut self, name: &str, filter: impl Filter + 'static) -> String {
        self.add_shared_filter(name, Arc::new(filter))
    }

    /// Register an already shared filter at `<filter_root>/<name>`.
    pub fn add_shared_filter(&mut self, name: &str, filter: SharedFilter) -> String {
        let filter_path = path::join(&self.config.filter_root, name);
        log::debug!("registering filter {filter_path} ({})", filter.name());
        match self.filters.iter_mut().find(|(p, _)| *p == filter_path) {
            Some((_, existing)) => *existing = filter,
            None => self.filters.push((filter_path.clone(), filter)),
        }
        filter_path
    }

    /// Unregister the filter at `filter_path`.
    ///
    /// Maps that were given the filter keep their own handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownFilter`] if nothing is registered there.
    pub fn remove_filter(&mut self, filter_path: &str) -> Result<SharedFilter, InputError> {
        let Some(index) = self.filters.iter().position(|(p, _)| p == filter_path) else {
            log::warn!("cannot remove unknown filter {filter_path}");
            return Err(InputError::UnknownFilter {
                filter_path: filter_path.to_string(),
            });
        };
        Ok(self.filters.remove(index).1)
    }

    /// Iterate over registered filters by full path.
    pub fn filters(&self) -> impl Iterator<Item = (&str, &SharedFilter)> + '_ {
        self.filters.iter().map(|(p, f)| (p.as_str(), f))
    }

    // ========================================================================
    // Action maps
    // ========================================================================

    /// Create an empty map that may use every filter registered so far.
    #[must_use]
    pub fn new_action_map(&self) -> ActionMap {
        ActionMap::with_filters(self.filters())
    }

    /// Register `map` under `name`, replacing any map of that name.
    ///
    /// A replaced map that was active stays active under its new contents.
    pub fn add_action_map(&mut self, name: impl Into<String>, map: ActionMap) {
        let name = name.into();
        log::debug!("adding action map {name} ({} bindings)", map.binding_count());
        self.maps.insert(name, map);
    }

    /// Unregister the map called `name`, deactivating it first.
    pub fn remove_action_map(&mut self, name: &str) -> Option<ActionMap> {
        if self.active_maps.iter().any(|n| n == name) {
            // known and active, cannot fail
            let _ = self.deactivate_action_maps(&[name]);
        }
        self.maps.remove(name)
    }

    /// The map called `name`, for rebinding.
    pub fn action_map_mut(&mut self, name: &str) -> Option<&mut ActionMap> {
        self.maps.get_mut(name)
    }

    /// The map called `name`.
    #[must_use]
    pub fn action_map(&self, name: &str) -> Option<&ActionMap> {
        self.maps.get(name)
    }

    /// Names of every registered map.
    pub fn action_maps(&self) -> impl Iterator<Item = &str> + '_ {
        self.maps.keys().map(String::as_str)
    }

    /// Names of the active maps, in evaluation order.
    #[must_use]
    pub fn active_action_maps(&self) -> &[String] {
        &self.active_maps
    }

    /// Add maps to the active set, after the already active ones.
    ///
    /// Unknown names are logged and skipped; the remaining names still apply.
    ///
    /// # Errors
    ///
    /// Returns the first [`InputError::UnknownActionMap`] encountered.
    pub fn activate_action_maps(&mut self, names: &[&str]) -> Result<(), InputError> {
        let mut result = Ok(());
        for &name in names {
            if !self.maps.contains_key(name) {
                log::warn!("cannot activate unknown action map {name}");
                if result.is_ok() {
                    result = Err(InputError::UnknownActionMap {
                        name: name.to_string(),
                    });
                }
                continue;
            }
            if !self.active_maps.iter().any(|n| n == name) {
                log::debug!("activating action map {name}");
                self.active_maps.push(name.to_string());
            }
        }
        result
    }

    /// Remove maps from the active set.
    ///
    /// Actions bound by a deactivated map lose their state silently, unless a
    /// map that is still active (or the active set) also targets them.
    ///
    /// # Errors
    ///
    /// Returns the first [`InputError::UnknownActionMap`] encountered; other
    /// names still apply.
    pub fn deactivate_action_maps(&mut self, names: &[&str]) -> Result<(), InputError> {
        let mut result = Ok(());
        let mut removed = Vec::new();
        for &name in names {
            if !self.maps.contains_key(name) {
                log::warn!("cannot deactivate unknown action map {name}");
                if result.is_ok() {
                    result = Err(InputError::UnknownActionMap {
                        name: name.to_string(),
                    });
                }
                continue;
            }
            if let Some(index) = self.active_maps.iter().position(|n| n == name) {
                log::debug!("deactivating action map {name}");
                removed.push(self.active_maps.remove(index));
            }
        }

        let orphaned: Vec<String> = self
            .arbiter
            .states()
            .map(|(action_path, _)| action_path)
            .filter(|&action_path| {
                removed
                    .iter()
                    .filter_map(|name| self.maps.get(name))
                    .any(|map| map.targets(action_path))
                    && !self.is_targeted(action_path)
            })
            .map(str::to_string)
            .collect();
        for action_path in orphaned {
            log::trace!("dropping state of {action_path}");
            self.arbiter.forget(&action_path);
        }

        result
    }

    /// Replace the active maps with `names`, discarding every action state.
    ///
    /// No deactivation is dispatched for the discarded states. Unknown names
    /// are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns the first [`InputError::UnknownActionMap`] encountered.
    pub fn switch_to_action_maps(&mut self, names: &[&str]) -> Result<(), InputError> {
        let cleared = self.arbiter.reset();
        log::debug!(
            "switching action maps to {names:?}, dropped {} active actions",
            cleared.len()
        );
        if let Some(set) = self.active_set.as_ref().and_then(|n| self.sets.get_mut(n)) {
            set.reset();
        }
        self.active_maps.clear();
        self.activate_action_maps(names)
    }

    /// Deactivate every map, discarding every action state.
    pub fn clear_active_action_maps(&mut self) {
        // an empty list cannot name an unknown map
        let _ = self.switch_to_action_maps(&[]);
    }

    /// Whether any active map or the active set binds to `action_path`.
    fn is_targeted(&self, action_path: &str) -> bool {
        let by_map = self
            .active_maps
            .iter()
            .filter_map(|name| self.maps.get(name))
            .any(|map| map.targets(action_path));
        let by_set = self
            .active_set
            .as_ref()
            .and_then(|name| self.sets.get(name))
            .is_some_and(|set| set.map().targets(action_path));
        by_map || by_set
    }

    // ========================================================================
    // Action sets
    // ========================================================================

    /// Register `set` under `name`, replacing any set of that name.
    pub fn add_action_set(&mut self, name: impl Into<String>, set: impl Into<ActionSet>) {
        let name = name.into();
        log::debug!("adding action set {name}");
        if self.active_set.as_deref() == Some(name.as_str()) {
            self.clear_action_set();
        }
        self.sets.insert(name, set.into());
    }

    /// Unregister the set called `name`, detaching it first if active.
    pub fn remove_action_set(&mut self, name: &str) -> Option<ActionSet> {
        if self.active_set.as_deref() == Some(name) {
            self.clear_action_set();
        }
        self.sets.remove(name)
    }

    /// The set called `name`.
    pub fn action_set_mut(&mut self, name: &str) -> Option<&mut ActionSet> {
        self.sets.get_mut(name)
    }

    /// Name of the active set, if any.
    #[must_use]
    pub fn active_action_set(&self) -> Option<&str> {
        self.active_set.as_deref()
    }

    /// Make `name` the one active set.
    ///
    /// The previous set is detached as by [`clear_action_set`](Self::clear_action_set).
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownActionSet`] and changes nothing if no set
    /// is called `name`.
    pub fn switch_action_set(&mut self, name: &str) -> Result<(), InputError> {
        if !self.sets.contains_key(name) {
            log::warn!("cannot switch to unknown action set {name}");
            return Err(InputError::UnknownActionSet {
                name: name.to_string(),
            });
        }
        self.clear_action_set();
        if let Some(set) = self.sets.get_mut(name) {
            set.reset();
        }
        log::debug!("switched to action set {name}");
        self.active_set = Some(name.to_string());
        Ok(())
    }

    /// Detach the active set, if any.
    ///
    /// Every action the set held loses its state without a deactivation
    /// being dispatched, unless an active map also targets it.
    pub fn clear_action_set(&mut self) {
        let Some(name) = self.active_set.take() else {
            return;
        };
        let Some(set) = self.sets.get_mut(&name) else {
            return;
        };
        for action_path in set.reset() {
            if !self.is_targeted(&action_path) {
                self.arbiter.forget(&action_path);
            }
        }
        log::debug!("detached action set {name}");
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Register a listener for transitions whose action path matches `pattern`.
    ///
    /// `pattern` is an exact action path or one ending in `/*`, matching any
    /// single final segment. Returns `false` if the handle was already
    /// registered for `pattern`.
    pub fn add_action_listener(&mut self, pattern: impl Into<String>, listener: Listener<ActionEvent>) -> bool {
        self.listeners.add(pattern, listener)
    }

    /// Unregister a listener. Returns `false` if it was not registered for `pattern`.
    pub fn remove_action_listener(&mut self, pattern: &str, listener: &Listener<ActionEvent>) -> bool {
        self.listeners.remove(pattern, listener)
    }

    // ========================================================================
    // Polling
    // ========================================================================

    /// Run one poll cycle and return the number of transitions it produced.
    ///
    /// Must not overlap with itself or with registry changes; listeners are
    /// handed events by reference and cannot call back into the manager.
    pub fn poll(&mut self) -> usize {
        let Self {
            sources,
            maps,
            active_maps,
            sets,
            active_set,
            arbiter,
            listeners,
            transitions,
            stats,
            ..
        } = self;

        let failures = sources.poll_all();
        stats.source_failures += failures.len() as u64;
        let inputs: &SourceRegistry = sources;

        for name in active_maps.iter() {
            let Some(map) = maps.get_mut(name) else {
                continue;
            };
            let report = map.update(inputs, &mut |event| {
                arbiter.offer(event);
            });
            stats.record_update(report);
        }

        if let Some(set) = active_set.as_ref().and_then(|name| sets.get_mut(name)) {
            let (edges, report) = set.update(inputs);
            stats.record_update(report);
            for event in edges {
                arbiter.offer(event);
            }
            // held actions outvote map deactivations like any active binding
            for (action_path, state) in set.active_states() {
                arbiter.offer(state.to_event(action_path));
            }
        }

        let count = arbiter.resolve(|event| {
            log::trace!(
                "{} {}",
                event.action_path,
                if event.active { "activated" } else { "deactivated" }
            );
            listeners.notify(&event.action_path, &event);
            transitions.push(event);
        });
        transitions.swap();
        stats.record_poll(count);
        count
    }

    /// Transitions produced by the most recent poll, in dispatch order.
    pub fn transitions(&self) -> impl Iterator<Item = &ActionEvent> + '_ {
        self.transitions.iter()
    }

    /// Running poll statistics.
    #[must_use]
    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    // ========================================================================
    // Action state
    // ========================================================================

    /// Whether `action_path` is currently active.
    #[must_use]
    pub fn action_is_active(&self, action_path: &str) -> bool {
        self.arbiter.is_active(action_path)
    }

    /// State of `action_path`, present only while it is active.
    #[must_use]
    pub fn action_state(&self, action_path: &str) -> Option<&ActionState> {
        self.arbiter.state(action_path)
    }

    /// Iterate over active actions.
    pub fn active_actions(&self) -> impl Iterator<Item = (&str, &ActionState)> + '_ {
        self.arbiter.states()
    }

    /// Send a haptic pulse through the source currently driving `action_path`.
    ///
    /// Returns `false` if the action is inactive or its source has no haptics.
    pub fn send_haptic_pulse(&mut self, action_path: &str, milliseconds: u32) -> bool {
        let Some(source) = self
            .arbiter
            .state(action_path)
            .and_then(|state| state.input_source.as_ref())
        else {
            log::debug!("no active source behind {action_path} for haptic pulse");
            return false;
        };
        let prefix = source.prefix().to_string();
        self.sources.send_haptic_pulse(&prefix, milliseconds)
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Multi-line summary of every registry and the active actions.
    #[must_use]
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl Default for ActionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Input sources:")?;
        for (source_ref, _) in self.sources.iter() {
            writeln!(f, "  {source_ref}")?;
        }

        writeln!(f, "Filters:")?;
        for (filter_path, filter) in &self.filters {
            writeln!(f, "  {filter_path} ({})", filter.name())?;
        }

        writeln!(f, "Action maps:")?;
        let mut names: Vec<_> = self.maps.keys().collect();
        names.sort();
        for name in names {
            let active = if self.active_maps.contains(name) { " [active]" } else { "" };
            writeln!(f, "  {name}{active}")?;
            for (input_path, binding) in self.maps[name].bindings() {
                match &binding.filter_path {
                    Some(filter_path) => {
                        writeln!(f, "    {input_path} -> {filter_path} -> {}", binding.action_path)?;
                    }
                    None => writeln!(f, "    {input_path} -> {}", binding.action_path)?,
                }
            }
        }

        if !self.sets.is_empty() {
            writeln!(f, "Action sets:")?;
            let mut names: Vec<_> = self.sets.keys().collect();
            names.sort();
            for name in names {
                let active = if self.active_set.as_ref() == Some(name) { " [active]" } else { "" };
                writeln!(f, "  {name}{active}")?;
            }
        }

        writeln!(f, "Active actions:")?;
        let mut active: Vec<_> = self.arbiter.states().collect();
        active.sort_by(|a, b| a.0.cmp(b.0));
        for (action_path, state) in active {
            match &state.input_source {
                Some(source) => writeln!(f, "  {action_path} <- {source}")?,
                None => writeln!(f, "  {action_path}")?,
            }
        }

        write!(f, "{}", self.stats.format_stats())
    }
}

impl fmt::Debug for ActionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionManager")
            .field("config", &self.config)
            .field("sources", &self.sources)
            .field("filters", &self.filters.iter().map(|(p, _)| p).collect::<Vec<_>>())
            .field("maps", &self.maps.keys().collect::<Vec<_>>())
            .field("active_maps", &self.active_maps)
            .field("active_set", &self.active_set)
            .field("active_actions", &self.arbiter.active_count())
            .field("listeners", &self.listeners)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::action::{Binding, listener};
    use crate::error::DeviceError;
    use crate::input::{InputFeed, InputValue, Parameters, Reading, TableInputSource};

    type Log = Arc<Mutex<Vec<(String, bool)>>>;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn setup() -> (ActionManager, InputFeed) {
        init_logging();
        let mut manager = ActionManager::new();
        let source = TableInputSource::new("Table").with_haptics();
        let feed = source.feed();
        manager.add_input_source("table", source);
        (manager, feed)
    }

    fn record(manager: &mut ActionManager, pattern: &str) -> Log {
        let log: Log = Arc::default();
        let sink = Arc::clone(&log);
        manager.add_action_listener(
            pattern,
            listener(move |e: &ActionEvent| sink.lock().push((e.action_path.clone(), e.active))),
        );
        log
    }

    fn params(value: serde_json::Value) -> Parameters {
        value.as_object().cloned().unwrap()
    }

    fn walking(manager: &mut ActionManager) {
        let mut map = manager.new_action_map();
        map.bind("/input/table/space", "/action/jump");
        manager.add_action_map("walking", map);
        manager.activate_action_maps(&["walking"]).unwrap();
    }

    #[test]
    fn test_default_filters_registered() {
        let manager = ActionManager::new();
        let paths: Vec<_> = manager.filters().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            ["/filter/min-max", "/filter/reverse-active", "/filter/add-value", "/filter/target-resolution"]
        );

        let bare = ActionManager::with_config(ManagerConfig::default().with_default_filters(false));
        assert_eq!(bare.filters().count(), 0);
    }

    #[test]
    fn test_unchanged_input_notifies_once() {
        let (mut manager, feed) = setup();
        walking(&mut manager);
        let log = record(&mut manager, "/action/jump");

        feed.press("/space");
        assert_eq!(manager.poll(), 1);
        assert_eq!(manager.poll(), 0);

        assert_eq!(*log.lock(), vec![("/action/jump".to_string(), true)]);
    }

    #[test]
    fn test_held_input_one_edge_each_way() {
        let (mut manager, feed) = setup();
        walking(&mut manager);
        let log = record(&mut manager, "/action/jump");

        feed.press("/space");
        for _ in 0..5 {
            manager.poll();
            assert!(manager.action_is_active("/action/jump"));
        }
        feed.release("/space");
        manager.poll();
        manager.poll();

        assert_eq!(
            *log.lock(),
            vec![("/action/jump".to_string(), true), ("/action/jump".to_string(), false)]
        );
        assert!(manager.action_state("/action/jump").is_none());
    }

    #[test]
    fn test_conflicting_bindings_activation_dominates() {
        let (mut manager, feed) = setup();
        let mut map = manager.new_action_map();
        // the inactive binding is evaluated first
        map.bind("/input/table/b", "/action/jump");
        map.bind("/input/table/a", "/action/jump");
        manager.add_action_map("conflict", map);
        manager.activate_action_maps(&["conflict"]).unwrap();
        let log = record(&mut manager, "/action/jump");

        feed.press("/a");
        feed.release("/b");
        manager.poll();

        assert!(manager.action_is_active("/action/jump"));
        assert_eq!(*log.lock(), vec![("/action/jump".to_string(), true)]);

        // still one binding holding it
        manager.poll();
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_min_max_binding() {
        let (mut manager, feed) = setup();
        let mut map = manager.new_action_map();
        map.bind(
            "/input/table/axis",
            Binding::new("/action/throttle")
                .through("/filter/min-max", Some(params(json!({ "minimum": 0, "maximum": 10 })))),
        );
        manager.add_action_map("driving", map);
        manager.activate_action_maps(&["driving"]).unwrap();

        feed.set_value("/axis", 15.0);
        manager.poll();
        assert!(!manager.action_is_active("/action/throttle"));

        feed.set_value("/axis", 5.0);
        manager.poll();
        let state = manager.action_state("/action/throttle").unwrap();
        assert_eq!(state.value, Some(InputValue::Number(5.0)));
    }

    #[test]
    fn test_wildcard_listener() {
        let (mut manager, feed) = setup();
        let mut map = manager.new_action_map();
        map.bind("/input/table/o", "/action/menu/open");
        map.bind("/input/table/c", "/action/menu/close");
        map.bind("/input/table/p", "/action/play");
        manager.add_action_map("menu", map);
        manager.activate_action_maps(&["menu"]).unwrap();
        let log = record(&mut manager, "/action/menu/*");

        feed.press("/o");
        feed.press("/c");
        feed.press("/p");
        manager.poll();

        let mut seen: Vec<_> = log.lock().iter().map(|(p, _)| p.clone()).collect();
        seen.sort();
        assert_eq!(seen, ["/action/menu/close", "/action/menu/open"]);
    }

    #[test]
    fn test_listener_dedup_and_removal() {
        let (mut manager, feed) = setup();
        walking(&mut manager);
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let handle = listener(move |_: &ActionEvent| *sink.lock() += 1);

        assert!(manager.add_action_listener("/action/jump", Arc::clone(&handle)));
        assert!(!manager.add_action_listener("/action/jump", Arc::clone(&handle)));

        feed.press("/space");
        manager.poll();
        assert_eq!(*count.lock(), 1);

        assert!(manager.remove_action_listener("/action/jump", &handle));
        feed.release("/space");
        manager.poll();
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_switch_maps_drops_state_silently() {
        let (mut manager, feed) = setup();
        walking(&mut manager);
        manager.add_action_map("menu", manager.new_action_map());
        let log = record(&mut manager, "/action/*");

        feed.press("/space");
        manager.poll();
        assert!(manager.action_is_active("/action/jump"));

        manager.switch_to_action_maps(&["menu"]).unwrap();
        assert!(!manager.action_is_active("/action/jump"));
        assert!(manager.action_state("/action/jump").is_none());
        assert_eq!(manager.active_action_maps(), ["menu".to_string()]);

        manager.poll();
        assert_eq!(*log.lock(), vec![("/action/jump".to_string(), true)]);
    }

    #[test]
    fn test_bound_tuple_reaches_listener() {
        let (mut manager, feed) = setup();
        let filter_params = params(json!({ "minimum": 0, "maximum": 1 }));
        let mut map = manager.new_action_map();
        map.bind(
            "/input/table/trigger",
            Binding::new("/action/fire")
                .with_parameters(params(json!({ "weapon": "laser" })))
                .through("/filter/min-max", Some(filter_params.clone())),
        );
        manager.add_action_map("combat", map);
        manager.activate_action_maps(&["combat"]).unwrap();

        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        manager.add_action_listener(
            "/action/fire",
            listener(move |e: &ActionEvent| {
                *sink.lock() = Some((e.action_path.clone(), e.filter_path.clone(), e.filter_parameters.clone()))
            }),
        );

        feed.set_value("/trigger", 0.5);
        manager.poll();

        let (action_path, filter_path, parameters) = seen.lock().clone().unwrap();
        assert_eq!(action_path, "/action/fire");
        assert_eq!(filter_path.as_deref(), Some("/filter/min-max"));
        assert_eq!(parameters, Some(filter_params));

        let event = manager.transitions().next().unwrap();
        assert_eq!(event.action_parameters.as_ref().unwrap()["weapon"], json!("laser"));
        assert_eq!(event.source.as_ref().unwrap().prefix(), "/input/table");
    }

    #[test]
    fn test_unknown_names_are_reported_not_fatal() {
        let (mut manager, _) = setup();
        walking(&mut manager);

        let err = manager.activate_action_maps(&["nope", "walking"]).unwrap_err();
        assert_eq!(err, InputError::UnknownActionMap { name: "nope".to_string() });
        assert_eq!(manager.active_action_maps(), ["walking".to_string()]);

        assert!(manager.switch_action_set("missing").is_err());
        assert!(manager.active_action_set().is_none());
        assert!(manager.remove_filter("/filter/missing").is_err());
    }

    #[test]
    fn test_unknown_filter_binding_is_skipped() {
        let (mut manager, feed) = setup();
        let mut map = manager.new_action_map();
        map.bind("/input/table/x", Binding::new("/action/x").through("/filter/missing", None));
        map.bind("/input/table/x", "/action/y");
        manager.add_action_map("m", map);
        manager.activate_action_maps(&["m"]).unwrap();

        feed.press("/x");
        manager.poll();
        manager.poll();

        assert!(manager.action_is_active("/action/y"));
        assert!(!manager.action_is_active("/action/x"));
        assert_eq!(manager.stats().skipped_bindings, 2);
    }

    #[test]
    fn test_deactivate_keeps_shared_actions() {
        let (mut manager, feed) = setup();
        let mut a = manager.new_action_map();
        a.bind("/input/table/space", "/action/jump");
        a.bind("/input/table/e", "/action/use");
        let mut b = manager.new_action_map();
        b.bind("/input/table/w", "/action/jump");
        manager.add_action_map("a", a);
        manager.add_action_map("b", b);
        manager.activate_action_maps(&["a", "b"]).unwrap();

        feed.press("/space");
        feed.press("/e");
        manager.poll();
        assert_eq!(manager.active_actions().count(), 2);

        manager.deactivate_action_maps(&["a"]).unwrap();
        assert!(manager.action_is_active("/action/jump"));
        assert!(!manager.action_is_active("/action/use"));

        // removing a map deactivates it
        assert!(manager.remove_action_map("b").is_some());
        assert!(manager.active_action_maps().is_empty());
        assert!(!manager.action_is_active("/action/jump"));
    }

    #[test]
    fn test_multiple_maps_evaluated_in_activation_order() {
        let (mut manager, feed) = setup();
        let mut a = manager.new_action_map();
        a.bind("/input/table/axis", "/action/move");
        let mut b = manager.new_action_map();
        b.bind(
            "/input/table/axis",
            Binding::new("/action/move").through("/filter/add-value", Some(params(json!({ "value": 1 })))),
        );
        manager.add_action_map("a", a);
        manager.add_action_map("b", b);
        manager.activate_action_maps(&["b", "a"]).unwrap();

        feed.set_value("/axis", 2.0);
        manager.poll();
        // first candidate wins
        assert_eq!(
            manager.action_state("/action/move").unwrap().value,
            Some(InputValue::Number(3.0))
        );
    }

    #[test]
    fn test_action_set_swap() {
        let (mut manager, feed) = setup();
        let mut walk = manager.new_action_map();
        walk.bind("/input/table/space", "/action/jump");
        let mut swim = manager.new_action_map();
        swim.bind("/input/table/space", "/action/dive");
        manager.add_action_set("walk", walk);
        manager.add_action_set("swim", swim);
        let log = record(&mut manager, "/action/*");

        manager.switch_action_set("walk").unwrap();
        feed.press("/space");
        manager.poll();
        manager.poll();
        assert!(manager.action_is_active("/action/jump"));

        manager.switch_action_set("swim").unwrap();
        assert!(!manager.action_is_active("/action/jump"));
        assert_eq!(manager.active_action_set(), Some("swim"));

        manager.poll();
        assert!(manager.action_is_active("/action/dive"));
        assert_eq!(
            *log.lock(),
            vec![("/action/jump".to_string(), true), ("/action/dive".to_string(), true)]
        );

        feed.release("/space");
        manager.poll();
        assert!(!manager.action_is_active("/action/dive"));
        assert_eq!(log.lock().last(), Some(&("/action/dive".to_string(), false)));
    }

    fn set_and_map_sharing_jump(manager: &mut ActionManager) {
        let mut walk = manager.new_action_map();
        walk.bind("/input/table/space", "/action/jump");
        manager.add_action_set("walk", walk);

        let mut pad = manager.new_action_map();
        pad.bind("/input/table/pad", "/action/jump");
        manager.add_action_map("pad", pad);
        manager.activate_action_maps(&["pad"]).unwrap();
        manager.switch_action_set("walk").unwrap();
    }

    #[test]
    fn test_set_held_action_survives_map_deactivation() {
        let (mut manager, feed) = setup();
        set_and_map_sharing_jump(&mut manager);
        let log = record(&mut manager, "/action/jump");

        feed.press("/space");
        for _ in 0..3 {
            manager.poll();
            assert!(manager.action_is_active("/action/jump"));
        }
        assert_eq!(*log.lock(), vec![("/action/jump".to_string(), true)]);

        feed.release("/space");
        manager.poll();
        manager.poll();
        assert!(!manager.action_is_active("/action/jump"));
        assert_eq!(
            *log.lock(),
            vec![("/action/jump".to_string(), true), ("/action/jump".to_string(), false)]
        );
    }

    #[test]
    fn test_clear_set_keeps_actions_held_by_maps() {
        let (mut manager, feed) = setup();
        set_and_map_sharing_jump(&mut manager);
        let log = record(&mut manager, "/action/jump");

        feed.press("/space");
        feed.press("/pad");
        manager.poll();

        manager.clear_action_set();
        assert!(manager.active_action_set().is_none());
        assert!(manager.action_is_active("/action/jump"));

        manager.poll();
        assert!(manager.action_is_active("/action/jump"));
        assert_eq!(*log.lock(), vec![("/action/jump".to_string(), true)]);
    }

    #[test]
    fn test_haptic_pulse_reaches_driving_source() {
        let (mut manager, feed) = setup();
        walking(&mut manager);

        assert!(!manager.send_haptic_pulse("/action/jump", 40));

        feed.press("/space");
        manager.poll();
        assert!(manager.send_haptic_pulse("/action/jump", 40));
        assert_eq!(feed.take_pulses(), vec![40]);
    }

    #[test]
    fn test_failing_source_does_not_stop_poll() {
        struct Dead;
        impl InputSource for Dead {
            fn poll(&mut self) -> Result<(), DeviceError> {
                Err(DeviceError::new("unplugged"))
            }
            fn query_input_path(&self, _: &str) -> Result<Reading, DeviceError> {
                Err(DeviceError::new("unplugged"))
            }
        }

        let (mut manager, feed) = setup();
        manager.add_input_source("dead", Dead);
        let mut map = manager.new_action_map();
        map.bind("/input/dead/button", "/action/dead");
        map.bind("/input/table/space", "/action/jump");
        manager.add_action_map("m", map);
        manager.activate_action_maps(&["m"]).unwrap();

        feed.press("/space");
        assert_eq!(manager.poll(), 1);
        assert!(manager.action_is_active("/action/jump"));
        assert_eq!(manager.stats().source_failures, 1);
        assert_eq!(manager.stats().failed_bindings, 1);

        let reading = manager.query_input_path("/input/dead/button");
        assert!(!reading.active);
        assert!(manager.remove_input_source("dead").is_some());
        assert_eq!(manager.input_sources().count(), 1);
    }

    #[test]
    fn test_query_input_path() {
        let (mut manager, feed) = setup();
        feed.set_value("/axis", 0.25);
        manager.poll();

        let reading = manager.query_input_path("/input/table/axis");
        assert!(reading.active);
        assert_eq!(reading.value, Some(InputValue::Number(0.25)));
        assert_eq!(reading.source.unwrap().name(), "Table");

        let unmatched = manager.query_input_path("/input/nowhere/x");
        assert!(!unmatched.active);
        assert!(unmatched.source.is_none());
    }

    #[test]
    fn test_transitions_cover_last_poll_only() {
        let (mut manager, feed) = setup();
        walking(&mut manager);

        feed.press("/space");
        manager.poll();
        assert_eq!(manager.transitions().count(), 1);

        manager.poll();
        assert_eq!(manager.transitions().count(), 0);
        assert_eq!(manager.stats().polls, 2);
        assert_eq!(manager.stats().transitions, 1);
    }

    #[test]
    fn test_map_loaded_from_json() {
        let (mut manager, feed) = setup();
        let mut map = manager.new_action_map();
        map.load_json_str(
            r#"{
                "inputs": [ { "source": "/input/table/space", "destination": "/action/jump" } ],
                "filters": [ {
                    "source": "/input/table/shift",
                    "destination": "/action/walk",
                    "filter": "/filter/reverse-active"
                } ]
            }"#,
        )
        .unwrap();
        manager.add_action_map("loaded", map);
        manager.activate_action_maps(&["loaded"]).unwrap();

        feed.press("/space");
        manager.poll();
        assert!(manager.action_is_active("/action/jump"));
        assert!(manager.action_is_active("/action/walk"));
    }

    #[test]
    fn test_describe() {
        let (mut manager, feed) = setup();
        walking(&mut manager);
        feed.press("/space");
        manager.poll();

        let text = manager.describe();
        assert!(text.contains("/input/table (Table)"));
        assert!(text.contains("/filter/min-max (MinMaxFilter)"));
        assert!(text.contains("walking [active]"));
        assert!(text.contains("/input/table/space -> /action/jump"));
        assert!(text.contains("/action/jump <- /input/table (Table)"));
    }
}
