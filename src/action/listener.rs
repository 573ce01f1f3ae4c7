//! Pattern-addressed listener registry
//!
//! One registry type backs every place that hands events to callbacks, the
//! manager and action sets alike. Listeners are reference-counted closures
//! and are identified by pointer: adding the same handle twice under one
//! pattern is a no-op, and removal needs the handle that was added.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::path;

/// A shared callback handle.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Wrap a closure in a [`Listener`] handle.
///
/// Keep the returned handle if the listener should be removable later.
pub fn listener<E, F>(callback: F) -> Listener<E>
where
    F: Fn(&E) + Send + Sync + 'static,
{
    Arc::new(callback)
}

fn same_listener<E>(a: &Listener<E>, b: &Listener<E>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Listeners grouped by pattern, in registration order.
pub struct ListenerRegistry<E> {
    entries: Vec<(String, SmallVec<[Listener<E>; 2]>)>,
}

impl<E> ListenerRegistry<E> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `listener` for `pattern`.
    ///
    /// Returns `false` if that exact handle was already registered for it.
    pub fn add(&mut self, pattern: impl Into<String>, listener: Listener<E>) -> bool {
        let pattern = pattern.into();
        if let Some((_, listeners)) = self.entries.iter_mut().find(|(p, _)| *p == pattern) {
            if listeners.iter().any(|l| same_listener(l, &listener)) {
                return false;
            }
            listeners.push(listener);
            return true;
        }
        let mut listeners = SmallVec::new();
        listeners.push(listener);
        self.entries.push((pattern, listeners));
        true
    }

    /// Unregister `listener` from `pattern`.
    ///
    /// Returns `true` iff the handle was registered for that pattern.
    pub fn remove(&mut self, pattern: &str, listener: &Listener<E>) -> bool {
        let Some(index) = self.entries.iter().position(|(p, _)| p == pattern) else {
            return false;
        };
        let listeners = &mut self.entries[index].1;
        let Some(position) = listeners.iter().position(|l| same_listener(l, listener)) else {
            return false;
        };
        listeners.remove(position);
        if listeners.is_empty() {
            self.entries.remove(index);
        }
        true
    }

    /// Call every listener whose pattern matches `path`.
    ///
    /// Returns how many listeners were called.
    pub fn notify(&self, path: &str, event: &E) -> usize {
        let mut called = 0;
        for (pattern, listeners) in &self.entries {
            if !path::pattern_matches(pattern, path) {
                continue;
            }
            for listener in listeners {
                listener(event);
                called += 1;
            }
        }
        called
    }

    /// Total number of registered (pattern, listener) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, l)| l.len()).sum()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for ListenerRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(p, l)| (p, l.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder() -> (Listener<String>, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (listener(move |e: &String| sink.lock().push(e.clone())), log)
    }

    #[test]
    fn test_add_is_deduplicated_per_pattern() {
        let mut registry = ListenerRegistry::new();
        let (l, log) = recorder();

        assert!(registry.add("/action/jump", Arc::clone(&l)));
        assert!(!registry.add("/action/jump", Arc::clone(&l)));
        assert!(registry.add("/action/*", Arc::clone(&l)));
        assert_eq!(registry.len(), 2);

        registry.notify("/action/jump", &"jump".to_string());
        // once per matching pattern
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn test_distinct_closures_are_distinct_listeners() {
        let mut registry = ListenerRegistry::new();
        let (a, log_a) = recorder();
        let (b, log_b) = recorder();
        registry.add("/action/jump", a);
        registry.add("/action/jump", b);

        assert_eq!(registry.notify("/action/jump", &"x".to_string()), 2);
        assert_eq!(log_a.lock().len(), 1);
        assert_eq!(log_b.lock().len(), 1);
    }

    #[test]
    fn test_wildcard_dispatch() {
        let mut registry = ListenerRegistry::new();
        let (l, log) = recorder();
        registry.add("/action/menu/*", l);

        for path in ["/action/menu/open", "/action/menu/close", "/action/play"] {
            registry.notify(path, &path.to_string());
        }
        assert_eq!(*log.lock(), vec!["/action/menu/open", "/action/menu/close"]);
    }

    #[test]
    fn test_remove() {
        let mut registry = ListenerRegistry::new();
        let (l, log) = recorder();
        let (other, _) = recorder();
        registry.add("/action/jump", Arc::clone(&l));

        assert!(!registry.remove("/action/jump", &other));
        assert!(!registry.remove("/action/run", &l));
        assert!(registry.remove("/action/jump", &l));
        assert!(registry.is_empty());

        registry.notify("/action/jump", &"x".to_string());
        assert!(log.lock().is_empty());
    }
}
