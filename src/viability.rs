//! Dead channel detection.
//!
//! Two passes: daily totals per channel, then one decision per channel
//! against all of its days. A channel failing the threshold on any day is
//! dead for the whole run.

use crate::{ChannelId, Recording};
use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum Viability {
    Alive,
    Dead,
}

impl fmt::Display for Viability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Viability::Alive => f.write_str("alive"),
            Viability::Dead => f.write_str("dead"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelViability {
    pub channel: ChannelId,
    pub viability: Viability,
    pub daily_totals: BTreeMap<NaiveDate, u64>,
    /// Earliest day whose total fell below the threshold.
    pub first_failing_day: Option<NaiveDate>,
}

impl ChannelViability {
    pub fn min_daily_total(&self) -> Option<u64> {
        self.daily_totals.values().copied().min()
    }

    pub fn is_alive(&self) -> bool {
        self.viability == Viability::Alive
    }
}

#[derive(Debug, Clone)]
pub struct ViabilityReport {
    pub dead_threshold: u64,
    channels: Vec<ChannelViability>,
}

impl ViabilityReport {
    pub fn channels(&self) -> &[ChannelViability] {
        &self.channels
    }

    pub fn get(&self, channel: ChannelId) -> Option<&ChannelViability> {
        self.channels.iter().find(|c| c.channel == channel)
    }

    pub fn alive(&self) -> Vec<ChannelId> {
        self.with(Viability::Alive)
    }

    pub fn dead(&self) -> Vec<ChannelId> {
        self.with(Viability::Dead)
    }

    fn with(&self, viability: Viability) -> Vec<ChannelId> {
        self.channels
            .iter()
            .filter(|c| c.viability == viability)
            .map(|c| c.channel)
            .collect()
    }

    /// Alive members of `channels`, in the given order.
    pub fn alive_among(&self, channels: &[ChannelId]) -> Vec<ChannelId> {
        channels
            .iter()
            .copied()
            .filter(|&c| self.get(c).is_some_and(ChannelViability::is_alive))
            .collect()
    }

    pub fn n_total(&self) -> usize {
        self.channels.len()
    }

    pub fn n_dead(&self) -> usize {
        self.dead().len()
    }

    pub fn n_alive(&self) -> usize {
        self.n_total() - self.n_dead()
    }
}

/// Sum of counts per calendar day for one channel.
pub fn daily_totals(recording: &Recording, channel: ChannelId) -> BTreeMap<NaiveDate, u64> {
    let mut totals = BTreeMap::new();
    for (ts, count) in recording.timestamps.iter().zip(recording.counts(channel)) {
        *totals.entry(ts.date()).or_insert(0) += u64::from(count);
    }
    totals
}

/// Classifies `channels` against `dead_threshold` counts per day.
pub fn classify_viability(
    recording: &Recording,
    channels: &[ChannelId],
    dead_threshold: u64,
) -> ViabilityReport {
    let mut report: Vec<ChannelViability> = channels
        .iter()
        .map(|&channel| {
            let daily_totals = daily_totals(recording, channel);
            let first_failing_day = daily_totals
                .iter()
                .find(|(_, &total)| total < dead_threshold)
                .map(|(day, _)| *day);
            let viability = if first_failing_day.is_some() {
                Viability::Dead
            } else {
                Viability::Alive
            };
            if let Some(day) = first_failing_day {
                debug!(
                    "Channel {} dead: {} counts on {} (threshold {})",
                    channel, daily_totals[&day], day, dead_threshold
                );
            }
            ChannelViability {
                channel,
                viability,
                daily_totals,
                first_failing_day,
            }
        })
        .collect();
    report.sort_by_key(|c| c.channel);

    let report = ViabilityReport {
        dead_threshold,
        channels: report,
    };
    info!(
        "{} of {} channels alive (threshold {} counts/day)",
        report.n_alive(),
        report.n_total(),
        dead_threshold
    );
    report
}
