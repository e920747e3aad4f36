//! Named, cancelable delayed events on a virtual clock
//!
//! Nothing here sleeps or spawns threads: the owner moves time forward with
//! [`Scheduler::pop_due`] / [`Scheduler::finish_advance`] and handles each fired
//! event before asking for the next one, so timers armed while handling an
//! event are measured from the instant that event fired.

use std::fmt::Debug;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Timer<K, E> {
    id: K,
    due: Duration,
    /// Arming order, breaks ties between timers due at the same instant
    seq: u64,
    event: E,
}

/// A set of pending timers keyed by name; at most one timer per name
#[derive(Debug, Clone)]
pub struct Scheduler<K, E> {
    now: Duration,
    next_seq: u64,
    timers: Vec<Timer<K, E>>,
}

impl<K, E> Default for Scheduler<K, E> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            timers: Vec::new(),
        }
    }
}

impl<K: Copy + Eq + Debug, E> Scheduler<K, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Fire `event` after `delay`, replacing any pending timer named `id`
    pub fn arm(&mut self, id: K, delay: Duration, event: E) {
        self.cancel(id);
        let seq = self.next_seq;
        self.next_seq += 1;
        tracing::trace!("Arm {:?} in {:?}", id, delay);
        self.timers.push(Timer {
            id,
            due: self.now + delay,
            seq,
            event,
        });
    }

    /// Drop the pending timer named `id`, returns true if there was one
    pub fn cancel(&mut self, id: K) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        before != self.timers.len()
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_armed(&self, id: K) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    /// Time left until the timer named `id` fires
    pub fn remaining(&self, id: K) -> Option<Duration> {
        self.timers
            .iter()
            .find(|timer| timer.id == id)
            .map(|timer| timer.due.saturating_sub(self.now))
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.iter().map(|timer| timer.due).min()
    }

    /// Remove and return the earliest timer due at or before `until`, moving
    /// the clock to its due time. Returns `None` once nothing more is due.
    pub fn pop_due(&mut self, until: Duration) -> Option<(K, E)> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= until)
            .min_by_key(|(_, timer)| (timer.due, timer.seq))
            .map(|(index, _)| index)?;
        let timer = self.timers.remove(index);
        self.now = self.now.max(timer.due);
        Some((timer.id, timer.event))
    }

    /// Move the clock to `until` after every due timer has been popped
    pub fn finish_advance(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn drain(scheduler: &mut Scheduler<&'static str, u32>, until: Duration) -> Vec<u32> {
        let mut fired = Vec::new();
        while let Some((_, event)) = scheduler.pop_due(until) {
            fired.push(event);
        }
        scheduler.finish_advance(until);
        fired
    }

    #[test]
    fn test_fires_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.arm("slow", 30 * MS, 3);
        scheduler.arm("fast", 10 * MS, 1);
        scheduler.arm("mid", 20 * MS, 2);
        assert_eq!(scheduler.next_due(), Some(10 * MS));
        assert_eq!(drain(&mut scheduler, 25 * MS), vec![1, 2]);
        assert_eq!(scheduler.now(), 25 * MS);
        assert_eq!(drain(&mut scheduler, 30 * MS), vec![3]);
    }

    #[test]
    fn test_ties_fire_in_arming_order() {
        let mut scheduler = Scheduler::new();
        scheduler.arm("b", 10 * MS, 1);
        scheduler.arm("a", 10 * MS, 2);
        assert_eq!(drain(&mut scheduler, 10 * MS), vec![1, 2]);
    }

    #[test]
    fn test_rearm_replaces_pending_timer() {
        let mut scheduler = Scheduler::new();
        scheduler.arm("gravity", 10 * MS, 1);
        scheduler.arm("gravity", 50 * MS, 2);
        assert_eq!(drain(&mut scheduler, 40 * MS), Vec::<u32>::new());
        assert_eq!(drain(&mut scheduler, 50 * MS), vec![2]);
        assert!(!scheduler.is_armed("gravity"));
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = Scheduler::new();
        scheduler.arm("a", 10 * MS, 1);
        scheduler.arm("b", 10 * MS, 2);
        assert!(scheduler.cancel("a"));
        assert!(!scheduler.cancel("a"));
        assert_eq!(drain(&mut scheduler, 10 * MS), vec![2]);

        scheduler.arm("a", 10 * MS, 1);
        scheduler.arm("b", 10 * MS, 2);
        scheduler.cancel_all();
        assert_eq!(scheduler.next_due(), None);
    }

    #[test]
    fn test_delay_measured_from_firing_instant() {
        let mut scheduler = Scheduler::new();
        scheduler.arm("tick", 10 * MS, 0);
        // Re-arm from inside the handler, the way a repeating timer does
        let mut fired = Vec::new();
        let until = 35 * MS;
        while let Some((id, n)) = scheduler.pop_due(until) {
            fired.push(scheduler.now());
            scheduler.arm(id, 10 * MS, n + 1);
        }
        scheduler.finish_advance(until);
        assert_eq!(fired, vec![10 * MS, 20 * MS, 30 * MS]);
        assert_eq!(scheduler.remaining("tick"), Some(5 * MS));
    }
}
