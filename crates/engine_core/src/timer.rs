//! Keyed one-shot and repeating timers driven by the frame tick.
//!
//! Every timer lives in a slot identified by a key `S`. Scheduling into an
//! occupied slot replaces the pending entry, so a slot never holds more than
//! one callback. Firing returns the keys; the owner dispatches them, which
//! keeps callbacks free of borrows into the owner's state.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;
use std::time::Duration;

/// Identifier of one scheduled entry. Stale ids are ignored on fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry {
    fire_at: Duration,
    id: TimerId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.id == other.id
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Min-heap on (fire_at, id): earliest first, insertion order breaks ties.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    id: TimerId,
    repeat: Option<Duration>,
}

/// Timer queue owned by a session controller.
#[derive(Debug)]
pub struct Scheduler<S> {
    now: Duration,
    next_id: u64,
    queue: BinaryHeap<Entry>,
    slots: HashMap<S, Slot>,
    keys: HashMap<TimerId, S>,
}

impl<S> Default for Scheduler<S>
where
    S: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Scheduler<S>
where
    S: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            queue: BinaryHeap::new(),
            slots: HashMap::new(),
            keys: HashMap::new(),
        }
    }

    /// Scheduler clock, advanced only by [`Scheduler::advance`].
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Fire `slot` once after `delay`, replacing anything pending in that slot.
    pub fn once(&mut self, slot: S, delay: Duration) -> TimerId {
        self.insert(slot, delay, None)
    }

    /// Fire `slot` every `interval`, replacing anything pending in that slot.
    pub fn repeat(&mut self, slot: S, interval: Duration) -> TimerId {
        self.insert(slot, interval, Some(interval.max(Duration::from_millis(1))))
    }

    /// Drop whatever is pending in `slot`. Returns true if something was cancelled.
    pub fn cancel(&mut self, slot: S) -> bool {
        match self.slots.remove(&slot) {
            Some(old) => {
                self.keys.remove(&old.id);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, slot: S) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Time left until `slot` fires, if it is pending.
    pub fn remaining(&self, slot: S) -> Option<Duration> {
        let id = self.slots.get(&slot)?.id;
        self.queue
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.fire_at.saturating_sub(self.now))
    }

    /// Move the clock forward and return the slots that fired, in fire order.
    /// A repeating slot can appear more than once when `dt` spans several intervals.
    pub fn advance(&mut self, dt: Duration) -> Vec<S> {
        self.now += dt;
        let mut fired = Vec::new();

        while let Some(top) = self.queue.peek() {
            if top.fire_at > self.now {
                break;
            }
            let Some(entry) = self.queue.pop() else { break };
            // Cancelled or replaced entries left behind in the heap.
            let Some(slot) = self.keys.remove(&entry.id) else {
                continue;
            };
            fired.push(slot);

            match self.slots.get(&slot).and_then(|s| s.repeat) {
                Some(interval) => {
                    let id = self.alloc_id();
                    self.slots.insert(slot, Slot { id, repeat: Some(interval) });
                    self.keys.insert(id, slot);
                    self.queue.push(Entry {
                        fire_at: entry.fire_at + interval,
                        id,
                    });
                }
                None => {
                    self.slots.remove(&slot);
                }
            }
        }

        fired
    }

    fn insert(&mut self, slot: S, delay: Duration, repeat: Option<Duration>) -> TimerId {
        self.cancel(slot);
        let id = self.alloc_id();
        self.slots.insert(slot, Slot { id, repeat });
        self.keys.insert(id, slot);
        self.queue.push(Entry {
            fire_at: self.now + delay,
            id,
        });
        id
    }

    fn alloc_id(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Slot {
        A,
        B,
        Tick,
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn once_fires_after_delay_and_clears_slot() {
        let mut timers = Scheduler::new();
        timers.once(Slot::A, ms(500));
        assert!(timers.advance(ms(499)).is_empty());
        assert_eq!(timers.advance(ms(1)), vec![Slot::A]);
        assert!(!timers.is_pending(Slot::A));
        assert!(timers.advance(ms(1000)).is_empty());
    }

    #[test]
    fn rescheduling_a_slot_replaces_the_pending_entry() {
        let mut timers = Scheduler::new();
        timers.once(Slot::A, ms(100));
        timers.advance(ms(50));
        timers.once(Slot::A, ms(100));
        assert!(timers.advance(ms(60)).is_empty());
        assert_eq!(timers.advance(ms(40)), vec![Slot::A]);
    }

    #[test]
    fn cancelled_slot_never_fires() {
        let mut timers = Scheduler::new();
        timers.once(Slot::B, ms(10));
        assert!(timers.cancel(Slot::B));
        assert!(!timers.cancel(Slot::B));
        assert!(timers.advance(ms(100)).is_empty());
    }

    #[test]
    fn fired_slots_come_out_in_time_order() {
        let mut timers = Scheduler::new();
        timers.once(Slot::B, ms(30));
        timers.once(Slot::A, ms(10));
        assert_eq!(timers.advance(ms(40)), vec![Slot::A, Slot::B]);
    }

    #[test]
    fn repeating_slot_catches_up_within_one_advance() {
        let mut timers = Scheduler::new();
        timers.repeat(Slot::Tick, ms(1000));
        assert_eq!(timers.advance(ms(2500)), vec![Slot::Tick, Slot::Tick]);
        assert_eq!(timers.remaining(Slot::Tick), Some(ms(500)));
        assert!(timers.is_pending(Slot::Tick));
    }
}
