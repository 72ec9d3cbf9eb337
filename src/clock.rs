//! Time sources.
//!
//! Timestamps are local wall-clock date-times without an offset, which is
//! also what the ledger file stores.

use chrono::{Duration, Local, NaiveDateTime};
use std::sync::atomic::{AtomicI64, Ordering};

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The host's local time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
///
/// Used by the replay tool and by tests that need exact stay durations.
#[derive(Debug)]
pub struct ManualClock {
    /// Microseconds since the Unix epoch, interpreted as naive local time
    micros: AtomicI64,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            micros: AtomicI64::new(start.and_utc().timestamp_micros()),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        self.micros
            .store(at.and_utc().timestamp_micros(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let step = by.num_microseconds().unwrap_or(i64::MAX);
        self.micros.fetch_add(step, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        let micros = self.micros.load(Ordering::SeqCst);
        chrono::DateTime::from_timestamp_micros(micros)
            .map(|dt| dt.naive_utc())
            .unwrap_or_default()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    #[inline]
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
