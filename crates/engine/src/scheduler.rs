// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer and scheduling management

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tether_core::{Event, TimerId};

/// Timer entry
#[derive(Debug, Clone)]
struct Timer {
    fires_at: Instant,
}

/// One-shot timers keyed by id. Setting an existing id rearms it.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: HashMap<TimerId, Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a timer, replacing any timer with the same id
    pub fn set_timer(&mut self, id: TimerId, duration: Duration, now: Instant) {
        let fires_at = now + duration;
        self.timers.insert(id, Timer { fires_at });
    }

    /// Cancel a timer. Returns whether it was armed.
    pub fn cancel_timer(&mut self, id: &str) -> bool {
        self.timers.remove(id).is_some()
    }

    pub fn is_armed(&self, id: &str) -> bool {
        self.timers.contains_key(id)
    }

    /// Remove and return all timers due at `now`, earliest first
    pub fn fired_timers(&mut self, now: Instant) -> Vec<Event> {
        let mut due: Vec<(TimerId, Instant)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.fires_at <= now)
            .map(|(id, timer)| (id.clone(), timer.fires_at))
            .collect();
        due.sort_by_key(|(_, fires_at)| *fires_at);

        for (id, _) in &due {
            self.timers.remove(id);
        }

        due.into_iter()
            .map(|(id, _)| Event::TimerStart { id })
            .collect()
    }

    /// Get the next timer fire time
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|t| t.fires_at).min()
    }

    pub fn has_timers(&self) -> bool {
        !self.timers.is_empty()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
