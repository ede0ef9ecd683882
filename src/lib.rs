pub mod actogram;
pub mod aggregate;
pub mod bouts;
pub mod circadian;
pub mod config;
pub mod data_loading;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod sleep_state;
pub mod stats;
pub mod viability;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use error::{EngineError, Result};

/// Tube position on a monitor, 1-based.
pub type ChannelId = u8;

pub const CHANNELS_PER_MONITOR: usize = 32;

/// Light phase of the 12:12 photoperiod.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum LightPhase {
    Day,
    Night,
}

impl fmt::Display for LightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightPhase::Day => f.write_str("Day"),
            LightPhase::Night => f.write_str("Night"),
        }
    }
}

/// Canonical, range-restricted monitor recording.
///
/// Rows are strictly increasing in time and spaced by `sampling_interval`.
/// Counts are kept row-major, mirroring the monitor file, and exposed per
/// channel through [`Recording::counts`].
#[derive(Debug, Clone)]
pub struct Recording {
    pub monitor_number: Option<u32>,
    pub sampling_interval: Duration,
    pub timestamps: Vec<NaiveDateTime>,
    rows: Vec<[u32; CHANNELS_PER_MONITOR]>,
}

impl Recording {
    pub(crate) fn new(
        monitor_number: Option<u32>,
        sampling_interval: Duration,
        timestamps: Vec<NaiveDateTime>,
        rows: Vec<[u32; CHANNELS_PER_MONITOR]>,
    ) -> Self {
        debug_assert_eq!(timestamps.len(), rows.len());
        Self {
            monitor_number,
            sampling_interval,
            timestamps,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Sampling interval in whole minutes.
    pub fn interval_minutes(&self) -> i64 {
        self.sampling_interval.num_minutes()
    }

    /// Counts of one channel in time order. Panics on a channel outside 1..=32.
    pub fn counts(&self, channel: ChannelId) -> impl Iterator<Item = u32> + '_ {
        let idx = usize::from(channel) - 1;
        self.rows.iter().map(move |row| row[idx])
    }

    /// Distinct calendar dates covered, in chronological order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.timestamps.iter().map(|ts| ts.date()).collect();
        dates.dedup();
        dates
    }
}
