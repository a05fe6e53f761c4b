//! Named timers polled at tick boundaries and the scatter/chase phase schedule.

use std::time::Duration;

use maze_chase_core::{BehaviorMode, PhaseEntry};

/// Timers the session schedules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Advances the phase schedule.
    ModeSwitch,
    /// Ends the power state.
    PowerExpiry,
    /// Flips the player's mouth animation frame.
    MouthToggle,
}

/// Timer that came due while draining the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FiredTimer {
    /// Timer that fired.
    pub kind: TimerKind,
    /// Simulated instant at which it was due.
    pub deadline: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TimerEntry {
    kind: TimerKind,
    deadline: Duration,
    interval: Option<Duration>,
}

/// Simulated clock with one pending deadline per timer kind.
///
/// The clock only moves when the session advances it; due timers are then
/// drained one at a time in deadline order so handlers can reschedule
/// relative to the instant they were due.
#[derive(Clone, Debug, Default)]
pub struct Timers {
    now: Duration,
    entries: Vec<TimerEntry>,
}

impl Timers {
    /// Current simulated instant.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Moves the clock forward by `dt`.
    pub fn advance_clock(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    /// Schedules a one-shot timer `after` the current instant, replacing any pending one.
    pub fn schedule_once(&mut self, kind: TimerKind, after: Duration) {
        self.schedule_at(kind, self.now.saturating_add(after));
    }

    /// Schedules a one-shot timer at an absolute instant, replacing any pending one.
    pub fn schedule_at(&mut self, kind: TimerKind, deadline: Duration) {
        self.insert(TimerEntry {
            kind,
            deadline,
            interval: None,
        });
    }

    /// Schedules a timer that fires every `interval`. A zero interval cancels it.
    pub fn schedule_repeating(&mut self, kind: TimerKind, interval: Duration) {
        if interval.is_zero() {
            self.cancel(kind);
            return;
        }
        self.insert(TimerEntry {
            kind,
            deadline: self.now.saturating_add(interval),
            interval: Some(interval),
        });
    }

    /// Drops the pending timer of the given kind, if any.
    pub fn cancel(&mut self, kind: TimerKind) {
        self.entries.retain(|entry| entry.kind != kind);
    }

    /// Time left before the given timer fires.
    #[must_use]
    pub fn remaining(&self, kind: TimerKind) -> Option<Duration> {
        self.entries
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.deadline.saturating_sub(self.now))
    }

    /// Removes and returns the earliest timer that is due, rescheduling repeating ones.
    pub fn pop_due(&mut self) -> Option<FiredTimer> {
        let position = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.deadline <= self.now)
            .min_by_key(|(_, entry)| (entry.deadline, entry.kind))
            .map(|(position, _)| position)?;

        let entry = self.entries[position];
        match entry.interval {
            Some(interval) => self.entries[position].deadline = entry.deadline.saturating_add(interval),
            None => {
                let _ = self.entries.remove(position);
            }
        }

        Some(FiredTimer {
            kind: entry.kind,
            deadline: entry.deadline,
        })
    }

    fn insert(&mut self, entry: TimerEntry) {
        self.cancel(entry.kind);
        self.entries.push(entry);
    }
}

/// Ordered scatter/chase alternation shared by every pursuer.
///
/// The schedule only tracks which entry is active. Each firing toggles the
/// mode the caller currently runs in, so a mode forced from outside the
/// schedule still flips on the next deadline. Leaving chase moves on to the
/// next entry; the final entry's chase never ends.
#[derive(Clone, Debug)]
pub struct PhaseSchedule {
    entries: Vec<PhaseEntry>,
    index: usize,
}

impl PhaseSchedule {
    /// Creates a schedule positioned at its first entry.
    #[must_use]
    pub fn new(entries: Vec<PhaseEntry>) -> Self {
        Self { entries, index: 0 }
    }

    /// Mode a fresh session starts in: scatter, or chase when there are no entries.
    #[must_use]
    pub fn initial_mode(&self) -> BehaviorMode {
        if self.entries.is_empty() {
            BehaviorMode::Chase
        } else {
            BehaviorMode::Scatter
        }
    }

    /// Index of the active entry.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// How long `mode` lasts under the active entry, or `None` when it holds forever.
    #[must_use]
    pub fn stage_duration(&self, mode: BehaviorMode) -> Option<Duration> {
        let entry = self.entries.get(self.index)?;
        match mode {
            BehaviorMode::Scatter => Some(entry.scatter()),
            BehaviorMode::Chase if self.index + 1 < self.entries.len() => Some(entry.chase()),
            BehaviorMode::Chase => None,
        }
    }

    /// Toggles away from `current` and returns the new mode with its duration.
    ///
    /// Leaving chase advances to the next entry's scatter; leaving scatter
    /// enters the active entry's chase. Chase under the final entry holds.
    pub fn fire(&mut self, current: BehaviorMode) -> (BehaviorMode, Option<Duration>) {
        let next = match current {
            BehaviorMode::Scatter => BehaviorMode::Chase,
            BehaviorMode::Chase if self.index + 1 < self.entries.len() => {
                self.index += 1;
                BehaviorMode::Scatter
            }
            BehaviorMode::Chase => BehaviorMode::Chase,
        };
        (next, self.stage_duration(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_timers_drain_in_deadline_order() {
        let mut timers = Timers::default();
        timers.schedule_once(TimerKind::PowerExpiry, Duration::from_secs(2));
        timers.schedule_once(TimerKind::ModeSwitch, Duration::from_secs(1));

        timers.advance_clock(Duration::from_secs(3));

        let first = timers.pop_due().expect("mode switch due");
        let second = timers.pop_due().expect("power expiry due");
        assert_eq!(first.kind, TimerKind::ModeSwitch);
        assert_eq!(first.deadline, Duration::from_secs(1));
        assert_eq!(second.kind, TimerKind::PowerExpiry);
        assert!(timers.pop_due().is_none());
    }

    #[test]
    fn repeating_timers_catch_up() {
        let mut timers = Timers::default();
        timers.schedule_repeating(TimerKind::MouthToggle, Duration::from_millis(200));

        timers.advance_clock(Duration::from_millis(650));

        let mut fired = 0;
        while timers.pop_due().is_some() {
            fired += 1;
        }
        assert_eq!(fired, 3);
        assert_eq!(
            timers.remaining(TimerKind::MouthToggle),
            Some(Duration::from_millis(150))
        );
    }

    #[test]
    fn rescheduling_replaces_pending_deadline() {
        let mut timers = Timers::default();
        timers.schedule_once(TimerKind::PowerExpiry, Duration::from_secs(5));
        timers.schedule_once(TimerKind::PowerExpiry, Duration::from_secs(9));

        assert_eq!(
            timers.remaining(TimerKind::PowerExpiry),
            Some(Duration::from_secs(9))
        );
        timers.cancel(TimerKind::PowerExpiry);
        assert_eq!(timers.remaining(TimerKind::PowerExpiry), None);
    }

    #[test]
    fn schedule_alternates_then_holds_chase() {
        let mut schedule = PhaseSchedule::new(vec![PhaseEntry::new(7, 20), PhaseEntry::new(5, 30)]);
        let mode = schedule.initial_mode();
        assert_eq!(mode, BehaviorMode::Scatter);
        assert_eq!(schedule.stage_duration(mode), Some(Duration::from_secs(7)));

        assert_eq!(
            schedule.fire(BehaviorMode::Scatter),
            (BehaviorMode::Chase, Some(Duration::from_secs(20)))
        );
        assert_eq!(
            schedule.fire(BehaviorMode::Chase),
            (BehaviorMode::Scatter, Some(Duration::from_secs(5)))
        );
        assert_eq!(schedule.index(), 1);
        assert_eq!(schedule.fire(BehaviorMode::Scatter), (BehaviorMode::Chase, None));
        assert_eq!(schedule.fire(BehaviorMode::Chase), (BehaviorMode::Chase, None));
    }

    #[test]
    fn forced_scatter_during_chase_flips_back_to_chase() {
        let mut schedule = PhaseSchedule::new(vec![PhaseEntry::new(1, 2), PhaseEntry::new(1, 2)]);
        let _ = schedule.fire(BehaviorMode::Scatter);

        let (mode, duration) = schedule.fire(BehaviorMode::Scatter);

        assert_eq!(mode, BehaviorMode::Chase);
        assert_eq!(duration, Some(Duration::from_secs(2)));
        assert_eq!(schedule.index(), 0);
    }

    #[test]
    fn empty_schedule_chases_forever() {
        let mut schedule = PhaseSchedule::new(Vec::new());
        assert_eq!(schedule.initial_mode(), BehaviorMode::Chase);
        assert_eq!(schedule.stage_duration(BehaviorMode::Chase), None);
        assert_eq!(schedule.fire(BehaviorMode::Scatter), (BehaviorMode::Chase, None));
    }
}
