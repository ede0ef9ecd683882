//! Binned activity profile behind the actogram plots.

use crate::circadian::CircadianClock;
use crate::config::{ChannelSubset, ConditionLayout};
use crate::stats;
use crate::viability::ViabilityReport;
use crate::{ChannelId, Recording};
use chrono::{NaiveDate, NaiveTime, Timelike};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ActogramBin {
    pub date: NaiveDate,
    pub condition: String,
    pub bin_start_minutes: u32,
    pub zt: NaiveTime,
    /// Across channels of counts per minute in the bin.
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

fn subset(
    channels: &[ChannelId],
    viability: &ViabilityReport,
    which: ChannelSubset,
) -> Vec<ChannelId> {
    match which {
        ChannelSubset::All => channels.to_vec(),
        ChannelSubset::Alive => viability.alive_among(channels),
        ChannelSubset::Dead => {
            let alive = viability.alive_among(channels);
            channels
                .iter()
                .copied()
                .filter(|c| !alive.contains(c))
                .collect()
        }
    }
}

/// Per date and `bin_minutes` wide bin, the mean and median activity rate
/// across the selected channels of each condition. Only bins holding
/// samples are listed, in chronological order.
pub fn actogram(
    recording: &Recording,
    viability: &ViabilityReport,
    layout: &ConditionLayout,
    clock: &CircadianClock,
    which: ChannelSubset,
    bin_minutes: u32,
) -> Vec<ActogramBin> {
    let bin_minutes = bin_minutes.max(1);
    let interval = recording.interval_minutes().max(1) as f64;
    let keys: Vec<(NaiveDate, u32)> = recording
        .timestamps
        .iter()
        .map(|ts| {
            let minute = ts.time().num_seconds_from_midnight() / 60;
            (ts.date(), minute / bin_minutes * bin_minutes)
        })
        .collect();

    let mut rows = Vec::new();
    for (condition, channels) in layout.groups() {
        let selected = subset(channels, viability, which);
        // bin -> per channel (count sum, samples)
        let mut bins: BTreeMap<(NaiveDate, u32), Vec<(u64, u64)>> = BTreeMap::new();
        for (idx, &channel) in selected.iter().enumerate() {
            for (key, count) in keys.iter().zip(recording.counts(channel)) {
                let acc = bins
                    .entry(*key)
                    .or_insert_with(|| vec![(0, 0); selected.len()]);
                acc[idx].0 += u64::from(count);
                acc[idx].1 += 1;
            }
        }

        for ((date, start), acc) in bins {
            let rates: Vec<f64> = acc
                .iter()
                .filter(|(_, n)| *n > 0)
                .map(|(sum, n)| *sum as f64 / (*n as f64 * interval))
                .collect();
            rows.push(ActogramBin {
                date,
                condition: condition.to_string(),
                bin_start_minutes: start,
                zt: clock.zt_of_minute(start).zt,
                mean: stats::mean(rates.iter().copied()),
                median: stats::median(&rates),
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, recording, recording_every};
    use crate::viability::classify_viability;

    fn clock() -> CircadianClock {
        CircadianClock::new(NaiveTime::from_hms_opt(6, 0, 0).unwrap())
    }

    #[test]
    fn bins_average_rates_across_selected_channels() {
        let rec = recording(
            at("2024-02-23", "06:00:00"),
            &[vec![100; 10], vec![50; 10], vec![0; 10]],
        );
        let viability = classify_viability(&rec, &[1, 2, 3], 100);
        let layout = ConditionLayout::new(&["wt=3".parse().unwrap()]).unwrap();

        let alive = actogram(&rec, &viability, &layout, &clock(), ChannelSubset::Alive, 5);
        assert_eq!(alive.len(), 2);
        assert_eq!(alive[0].bin_start_minutes, 360);
        assert_eq!(alive[1].bin_start_minutes, 365);
        assert_eq!(alive[0].mean, Some(75.0));
        assert_eq!(alive[0].median, Some(75.0));
        assert_eq!(alive[1].zt, NaiveTime::from_hms_opt(0, 5, 0).unwrap());

        let all = actogram(&rec, &viability, &layout, &clock(), ChannelSubset::All, 10);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].mean, Some(50.0));
        assert_eq!(all[0].median, Some(50.0));

        let dead = actogram(&rec, &viability, &layout, &clock(), ChannelSubset::Dead, 5);
        assert_eq!(dead[0].mean, Some(0.0));
    }

    #[test]
    fn rates_are_per_minute_at_coarser_sampling() {
        // 5 minute rows, 30 counts each: 6 counts per minute
        let rec = recording_every(at("2024-02-23", "06:00:00"), 5, &[vec![30; 4]]);
        let viability = classify_viability(&rec, &[1], 0);
        let layout = ConditionLayout::new(&["wt=1".parse().unwrap()]).unwrap();

        let bins = actogram(&rec, &viability, &layout, &clock(), ChannelSubset::Alive, 10);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].bin_start_minutes, 360);
        assert_eq!(bins[1].bin_start_minutes, 370);
        assert_eq!(bins[0].mean, Some(6.0));
        assert_eq!(bins[1].median, Some(6.0));
    }

    #[test]
    fn empty_subset_yields_no_bins() {
        let rec = recording(at("2024-02-23", "06:00:00"), &[vec![500; 10]]);
        let viability = classify_viability(&rec, &[1], 100);
        let layout = ConditionLayout::new(&["wt=1".parse().unwrap()]).unwrap();
        assert!(actogram(&rec, &viability, &layout, &clock(), ChannelSubset::Dead, 5).is_empty());
    }
}
