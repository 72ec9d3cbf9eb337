//! Analytics - read-only statistics over the ledger.

use std::fmt;

use chrono::Timelike;
use serde::Serialize;
use tracing::warn;

use crate::ledger::LedgerEntry;

/// One-hour window `[start, start + 1)` of the day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PeakHour {
    pub start: u32,
}

impl PeakHour {
    #[inline]
    pub fn end(&self) -> u32 {
        self.start + 1
    }
}

impl fmt::Display for PeakHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end())
    }
}

/// Point-in-time analytics report
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub average_stay_minutes: f64,
    pub peak_hour: PeakHour,
    pub total_entries: usize,
    pub open_entries: usize,
}

impl AnalyticsSnapshot {
    /// Peak hour as `HH:00-HH:00`
    pub fn peak_hour_window(&self) -> String {
        self.peak_hour.to_string()
    }
}

impl fmt::Display for AnalyticsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Average Stay Time: {:.2} minutes", self.average_stay_minutes)?;
        write!(f, "Peak Hour: {}", self.peak_hour)
    }
}

/// Statistics over a borrowed slice of ledger entries.
#[derive(Clone, Copy, Debug)]
pub struct AnalyticsEngine<'a> {
    entries: &'a [LedgerEntry],
}

impl<'a> AnalyticsEngine<'a> {
    pub fn new(entries: &'a [LedgerEntry]) -> Self {
        Self { entries }
    }

    /// Mean stay over closed entries, in minutes.
    ///
    /// Each stay counts in whole minutes (partial minutes dropped). Returns
    /// 0.0 when nothing has checked out yet. Stays that end before they
    /// start are averaged as recorded.
    pub fn average_stay_minutes(&self) -> f64 {
        let negative = self.negative_stays();
        if negative > 0 {
            warn!(negative, "ledger has exits recorded before their entries");
        }

        let (total, closed) = self
            .entries
            .iter()
            .filter_map(LedgerEntry::stay)
            .fold((0i64, 0u32), |(total, n), stay| (total + stay.num_minutes(), n + 1));

        if closed == 0 {
            0.0
        } else {
            total as f64 / closed as f64
        }
    }

    /// Closed entries whose exit is earlier than their entry
    pub fn negative_stays(&self) -> usize {
        self.entries
            .iter()
            .filter_map(LedgerEntry::stay)
            .filter(|stay| *stay < chrono::Duration::zero())
            .count()
    }

    /// Entry counts per hour of day, open entries included
    pub fn hourly_histogram(&self) -> [u32; 24] {
        let mut counts = [0u32; 24];
        for entry in self.entries {
            counts[entry.entered_at.hour() as usize] += 1;
        }
        counts
    }

    /// Busiest arrival hour; ties go to the earlier hour, an empty ledger
    /// reports midnight.
    pub fn peak_hour(&self) -> PeakHour {
        let counts = self.hourly_histogram();
        let mut best = 0usize;
        for (hour, &count) in counts.iter().enumerate() {
            if count > counts[best] {
                best = hour;
            }
        }
        PeakHour { start: best as u32 }
    }

    pub fn snapshot(&self) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            average_stay_minutes: self.average_stay_minutes(),
            peak_hour: self.peak_hour(),
            total_entries: self.entries.len(),
            open_entries: self.entries.iter().filter(|e| e.is_open()).count(),
        }
    }
}
