//! Single-threaded timer queue.
//!
//! The frame loop feeds elapsed time in with [`Scheduler::advance`] and gets back
//! every event that came due, in firing order. Nothing runs on its own, so tests
//! can drive virtual time directly.

use std::time::Duration;

/// Handle returned when scheduling; pass it to [`Scheduler::cancel`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Timer<E> {
    handle: TimerHandle,
    due: Duration,
    interval: Option<Duration>,
    event: E,
}

/// Cooperative scheduler for one-shot and repeating events
#[derive(Debug)]
pub struct Scheduler<E> {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer<E>>,
}

impl<E: Clone> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            timers: Vec::new(),
        }
    }

    /// Virtual time elapsed since creation
    pub fn now(&self) -> Duration {
        self.now
    }

    fn push(&mut self, delay: Duration, interval: Option<Duration>, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            handle,
            due: self.now + delay,
            interval,
            event,
        });
        handle
    }

    /// Fire `event` once, `delay` from now
    pub fn once(&mut self, delay: Duration, event: E) -> TimerHandle {
        self.push(delay, None, event)
    }

    /// Fire `event` every `interval`, first time one interval from now.
    /// A zero interval is bumped to one millisecond.
    pub fn every(&mut self, interval: Duration, event: E) -> TimerHandle {
        let interval = interval.max(Duration::from_millis(1));
        self.push(interval, Some(interval), event)
    }

    /// Remove a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        self.timers.len() != before
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Move the clock forward by `dt` and collect due events in firing order.
    pub fn advance(&mut self, dt: Duration) -> Vec<E> {
        self.advance_to(self.now + dt)
    }

    /// Move the clock to `now` (never backwards) and collect due events.
    pub fn advance_to(&mut self, now: Duration) -> Vec<E> {
        self.now = self.now.max(now);

        let mut fired = Vec::new();
        loop {
            // earliest due timer, ties broken by scheduling order
            let next = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due <= self.now)
                .min_by_key(|(_, t)| (t.due, t.handle.0))
                .map(|(i, _)| i);

            let Some(index) = next else { break };

            match self.timers[index].interval {
                Some(interval) => {
                    let timer = &mut self.timers[index];
                    timer.due += interval;
                    fired.push(timer.event.clone());
                }
                None => {
                    let timer = self.timers.swap_remove(index);
                    fired.push(timer.event);
                }
            }
        }
        fired
    }
}

impl<E: Clone> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum Tick {
        Theme,
        Leave,
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn repeating_timer_fires_per_interval() {
        let mut s = Scheduler::new();
        s.every(ms(5_000), Tick::Theme);

        assert!(s.advance(ms(4_999)).is_empty());
        assert_eq!(s.advance(ms(1)), vec![Tick::Theme]);
        assert_eq!(s.advance(ms(15_000)).len(), 3);
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn one_shot_fires_once_in_order() {
        let mut s = Scheduler::new();
        s.every(ms(5_000), Tick::Theme);
        s.once(ms(12_000), Tick::Leave);

        let fired = s.advance(ms(20_000));
        assert_eq!(
            fired,
            vec![Tick::Theme, Tick::Theme, Tick::Leave, Tick::Theme, Tick::Theme]
        );
        assert!(s.advance(ms(60_000)).iter().all(|e| *e == Tick::Theme));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut s = Scheduler::new();
        let leave = s.once(ms(100), Tick::Leave);
        assert!(s.cancel(leave));
        assert!(!s.cancel(leave));
        assert!(s.advance(ms(1_000)).is_empty());
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut s: Scheduler<Tick> = Scheduler::new();
        s.advance_to(ms(500));
        s.advance_to(ms(100));
        assert_eq!(s.now(), ms(500));
    }
}
