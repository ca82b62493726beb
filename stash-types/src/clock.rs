//! Monotonic wall-clock source for entity timestamps.
//!
//! Follows the hybrid-logical-clock `tick` rule: take physical time when it
//! has advanced, otherwise bump the last issued value. Every call therefore
//! returns a timestamp strictly greater than the previous one, which keeps
//! `updated_at > created_at` true even when two writes land inside the same
//! clock tick.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Source of `created_at` / `updated_at` values.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Process clock with microsecond precision and strictly increasing output.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl SystemClock {
    /// Creates a clock that has not issued any timestamp yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next timestamp given a physical reading.
    fn advance(&self, wall: DateTime<Utc>) -> DateTime<Utc> {
        // Storage keeps microseconds; drop anything finer so values round-trip.
        let wall = wall.trunc_subsecs(6);
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let next = match *last {
            Some(prev) if wall <= prev => prev + TimeDelta::microseconds(1),
            _ => wall,
        };
        *last = Some(next);
        next
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        self.advance(Utc::now())
    }
}
