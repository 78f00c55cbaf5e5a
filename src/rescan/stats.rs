//! Rescan download statistics
//!
//! Aggregate counters live for the lifetime of a scheduler; a `TickReport`
//! describes a single tick.

use std::fmt;
use std::time::Duration;

/// Successful/unsuccessful download totals across every tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadCounters {
    pub successful: u64,
    pub unsuccessful: u64,
}

impl DownloadCounters {
    /// Counts one download outcome; exactly one counter moves
    pub fn record(&mut self, success: bool) {
        if success {
            self.successful += 1;
        } else {
            self.unsuccessful += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.successful + self.unsuccessful
    }
}

impl fmt::Display for DownloadCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "successful downloads {}, unsuccessful downloads {}",
            self.successful, self.unsuccessful
        )
    }
}

/// Outcome of one rescan tick
#[derive(Debug, Clone)]
pub struct TickReport {
    /// Records that decoded successfully
    pub loaded: usize,

    /// Records skipped because they failed to decode
    pub skipped: usize,

    /// Addresses selected for re-download, in rank order
    pub candidates: Vec<String>,

    /// Outcomes from this tick only
    pub tick: DownloadCounters,

    /// Aggregate counters after this tick
    pub totals: DownloadCounters,

    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_moves_one_counter() {
        let mut counters = DownloadCounters::default();
        counters.record(true);
        counters.record(false);
        counters.record(true);

        assert_eq!(counters.successful, 2);
        assert_eq!(counters.unsuccessful, 1);
        assert_eq!(counters.total(), 3);
    }

    #[test]
    fn test_display() {
        let counters = DownloadCounters {
            successful: 9,
            unsuccessful: 0,
        };
        assert_eq!(
            counters.to_string(),
            "successful downloads 9, unsuccessful downloads 0"
        );
    }
}
