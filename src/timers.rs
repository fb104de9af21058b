//! Clocks and a small cancellable timer queue.
//!
//! Timers never call back into anything: the owner pops due entries and acts
//! on them, so a cancelled handle can never fire and no timer outlives the
//! queue that owns it.

use std::cell::Cell;
use std::time::Instant;

pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to. Used by replay and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, t: u64) {
        self.now.set(t);
    }

    pub fn advance(&self, dt: u64) {
        self.now.set(self.now.get() + dt);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired<K> {
    pub kind: K,
    /// The instant the timer was due, not the instant it was popped.
    pub at: u64,
}

#[derive(Debug, Clone)]
struct Entry<K> {
    handle: TimerHandle,
    kind: K,
    due: u64,
    every: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    next_id: u64,
    entries: Vec<Entry<K>>,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<K: Copy> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: u64, kind: K) -> TimerHandle {
        self.push(due, None, kind)
    }

    /// First fires at `first_due`, then every `interval_ms` until cancelled.
    pub fn schedule_repeating(&mut self, first_due: u64, interval_ms: u64, kind: K) -> TimerHandle {
        self.push(first_due, Some(interval_ms.max(1)), kind)
    }

    fn push(&mut self, due: u64, every: Option<u64>, kind: K) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            handle,
            kind,
            due,
            every,
        });
        handle
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn next_due(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.due).min()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pop the earliest timer due before `now` (or at `now` when `inclusive`).
    /// Equal deadlines pop in scheduling order. Repeating timers are re-armed
    /// on their own cadence, skipping any ticks that `now` has already passed,
    /// so a stalled owner sees one tick rather than a burst.
    pub fn pop_due(&mut self, now: u64, inclusive: bool) -> Option<Fired<K>> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| if inclusive { e.due <= now } else { e.due < now })
            .min_by_key(|(_, e)| (e.due, e.handle.0))
            .map(|(i, _)| i)?;

        let entry = &mut self.entries[idx];
        let fired = Fired {
            kind: entry.kind,
            at: entry.due,
        };
        match entry.every {
            Some(every) => {
                // exclusive pops leave a tick due exactly at `now` armed
                let horizon = if inclusive { now } else { now.saturating_sub(1) };
                let missed = horizon.saturating_sub(entry.due) / every;
                entry.due += every * (missed + 1);
            }
            None => {
                self.entries.swap_remove(idx);
            }
        }
        Some(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum K {
        A,
        B,
    }

    #[test]
    fn pops_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule(50, K::B);
        q.schedule(10, K::A);
        assert_eq!(q.next_due(), Some(10));
        assert_eq!(q.pop_due(100, true).map(|f| f.kind), Some(K::A));
        assert_eq!(q.pop_due(100, true).map(|f| (f.kind, f.at)), Some((K::B, 50)));
        assert!(q.pop_due(100, true).is_none());
    }

    #[test]
    fn exclusive_pop_skips_timers_due_now() {
        let mut q = TimerQueue::new();
        q.schedule(10, K::A);
        assert!(q.pop_due(10, false).is_none());
        assert!(q.pop_due(10, true).is_some());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::new();
        let h = q.schedule(10, K::A);
        assert!(q.cancel(h));
        assert!(!q.cancel(h));
        assert!(q.pop_due(1_000, true).is_none());
    }

    #[test]
    fn repeating_timer_rearms_until_cancelled() {
        let mut q = TimerQueue::new();
        let h = q.schedule_repeating(100, 200, K::A);
        let mut ats = Vec::new();
        for now in (100..=700).step_by(100) {
            while let Some(f) = q.pop_due(now, true) {
                ats.push(f.at);
            }
        }
        assert_eq!(ats, vec![100, 300, 500, 700]);
        assert!(q.is_scheduled(h));
        q.cancel(h);
        assert!(q.is_empty());
    }

    #[test]
    fn manual_clock_moves_on_request() {
        let c = ManualClock::new(5);
        c.advance(10);
        assert_eq!(c.now_ms(), 15);
        c.set(3);
        assert_eq!((&c).now_ms(), 3);
    }

    #[test]
    fn monotonic_clock_never_goes_back() {
        let c = MonotonicClock::new();
        let a = c.now_ms();
        let b = c.now_ms();
        assert!(b >= a);
    }

    #[test]
    fn stalled_owner_gets_one_repeat_not_a_burst() {
        let mut q = TimerQueue::new();
        q.schedule_repeating(1_000, 200, K::A);
        let ats: Vec<u64> = std::iter::from_fn(|| q.pop_due(10_000, true).map(|f| f.at)).collect();
        assert_eq!(ats, vec![1_000]);
        assert_eq!(q.next_due(), Some(10_200));
    }

    #[test]
    fn exclusive_pop_keeps_tick_due_at_now() {
        let mut q = TimerQueue::new();
        q.schedule_repeating(1_000, 200, K::A);
        assert_eq!(q.pop_due(1_200, false).map(|f| f.at), Some(1_000));
        assert!(q.pop_due(1_200, false).is_none());
        assert_eq!(q.pop_due(1_200, true).map(|f| f.at), Some(1_200));
    }
}
