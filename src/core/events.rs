//! Per-poll Event Queue
//!
//! A double-buffered queue: events pushed while a poll runs become readable
//! once the poll swaps the buffers at its end, and stay readable until the
//! next poll finishes. Hosts that prefer pulling over callbacks read action
//! transitions from here.
//!
//! # Example
//!
//! ```ignore
//! manager.poll();
//! for event in manager.transitions() {
//!     if event.action_path == "/action/jump" && event.active {
//!         player.jump();
//!     }
//! }
//! ```

use std::collections::VecDeque;

/// Double-buffered event queue for poll-consistent event processing.
///
/// # Performance
///
/// - Push: O(1) amortized
/// - Iteration: O(n)
/// - Swap: O(1)
#[derive(Debug)]
pub struct EventQueue<E> {
    /// Events being written during the current poll
    pending: VecDeque<E>,
    /// Events from the last completed poll
    processing: VecDeque<E>,
}

impl<E> EventQueue<E> {
    /// Default initial capacity for event queues.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event produced by the running poll.
    ///
    /// Not visible to readers until [`swap`](Self::swap).
    #[inline]
    pub fn push(&mut self, event: E) {
        self.pending.push_back(event);
    }

    /// Publish the pending events and start a fresh pending buffer.
    ///
    /// Events published by the previous swap are discarded.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over published events.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.processing.iter()
    }

    /// Whether there are no published events.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Number of published events.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_queue_push_and_swap() {
        let mut queue = EventQueue::new();

        queue.push("jump");
        assert!(queue.is_empty(), "Events should not be visible before swap");

        queue.swap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), ["jump"]);
    }

    #[test]
    fn test_event_queue_swap_replaces_published() {
        let mut queue = EventQueue::new();

        queue.push(1);
        queue.swap();
        queue.push(2);

        // Only the first poll's event is visible
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), [1]);

        queue.swap();
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), [2]);

        // A poll with no events publishes nothing
        queue.swap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_queue_keeps_push_order() {
        let mut queue = EventQueue::with_capacity(4);

        queue.push("a");
        queue.push("b");
        queue.push("c");
        queue.swap();

        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), ["a", "b", "c"]);
    }
}
