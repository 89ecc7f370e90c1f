use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending,
}

/// Trailing-edge debounce: every `arm` pushes the deadline out, so a burst
/// of events fires once, `delay` after the last one.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn state(&self) -> DebounceState {
        match self.deadline {
            Some(_) => DebounceState::Pending,
            None => DebounceState::Idle,
        }
    }

    /// Return to idle. Returns whether a timer was pending.
    pub fn fire(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

/// Bounded fixed-interval retry for restoring onto late-rendered forms.
///
/// The first check happens at load; up to `max_retries` more follow, one
/// `interval` apart.
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    interval: Duration,
    max_retries: u32,
    attempts: u32,
    deadline: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Next attempt scheduled
    Retry,
    /// Attempts exhausted
    GiveUp,
}

impl RetrySchedule {
    pub fn new(interval: Duration, max_retries: u32) -> Self {
        Self {
            interval,
            max_retries,
            attempts: 0,
            deadline: None,
        }
    }

    /// Count an attempt and clear any pending deadline.
    pub fn begin_attempt(&mut self) -> u32 {
        self.deadline = None;
        self.attempts += 1;
        self.attempts
    }

    /// The current attempt found nothing to work on.
    pub fn miss(&mut self, now: Instant) -> RetryDecision {
        // attempts includes the initial check at load
        if self.attempts > self.max_retries {
            self.deadline = None;
            return RetryDecision::GiveUp;
        }
        self.deadline = Some(now + self.interval);
        RetryDecision::Retry
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
