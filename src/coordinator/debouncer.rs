//! Keystroke debouncer
//!
//! Every input restarts the window; the pending search fires once the input
//! has been quiet for the configured delay.

use std::time::{Duration, Instant};

pub struct InputDebouncer {
    delay: Duration,
    /// Time of the last input, if one is pending
    last_event: Option<Instant>,
}

impl InputDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_event: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record an input, restarting the window
    pub fn trigger(&mut self) {
        self.trigger_at(Instant::now());
    }

    pub fn trigger_at(&mut self, now: Instant) {
        self.last_event = Some(now);
    }

    pub fn has_pending(&self) -> bool {
        self.last_event.is_some()
    }

    /// Check if the window has elapsed since the last input
    pub fn is_ready(&self) -> bool {
        self.is_ready_at(Instant::now())
    }

    pub fn is_ready_at(&self, now: Instant) -> bool {
        match self.last_event {
            Some(last) => now.saturating_duration_since(last) >= self.delay,
            None => false,
        }
    }

    /// Time until the pending input fires (None if nothing is pending)
    pub fn time_until_ready(&self) -> Option<Duration> {
        self.last_event.map(|last| {
            let elapsed = last.elapsed();
            if elapsed >= self.delay {
                Duration::ZERO
            } else {
                self.delay - elapsed
            }
        })
    }

    /// Consume the pending input. Returns false if nothing was pending.
    pub fn flush(&mut self) -> bool {
        self.last_event.take().is_some()
    }

    /// Drop the pending input without firing
    pub fn clear(&mut self) {
        self.last_event = None;
    }
}
