use crate::pipeline::CancelFlag;
use crate::stats::Summary;
use crate::{ChannelId, Recording, Result};
use chrono::{Duration, NaiveDateTime};
use log::debug;
use serde::Serialize;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize)]
pub enum SleepState {
    Awake,
    Asleep,
}

impl SleepState {
    /// 1 for asleep, 0 for awake.
    pub fn value(self) -> u8 {
        match self {
            SleepState::Awake => 0,
            SleepState::Asleep => 1,
        }
    }
}

/// Sleep state sequence of one alive channel, aligned with
/// [`SleepStates::timestamps`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStates {
    pub channel: ChannelId,
    pub states: Vec<SleepState>,
}

#[derive(Debug, Clone)]
pub struct SleepStates {
    pub timestamps: Vec<NaiveDateTime>,
    pub interval: Duration,
    pub window: usize,
    channels: Vec<ChannelStates>,
}

impl SleepStates {
    pub fn channels(&self) -> &[ChannelStates] {
        &self.channels
    }

    pub fn get(&self, channel: ChannelId) -> Option<&[SleepState]> {
        self.channels
            .iter()
            .find(|c| c.channel == channel)
            .map(|c| c.states.as_slice())
    }

    /// Per-sample mean and SEM of the sleep value across the listed
    /// channels. Channels without states (dead or unknown) are skipped.
    pub fn cross_channel(&self, channels: &[ChannelId]) -> Vec<Summary> {
        let series: Vec<&[SleepState]> = channels.iter().filter_map(|&c| self.get(c)).collect();
        (0..self.timestamps.len())
            .map(|i| Summary::new(series.iter().map(|states| f64::from(states[i].value()))))
            .collect()
    }
}

/// Trailing-window inactivity rule: a sample is asleep when the counts of
/// the last `window` samples, itself included, sum to zero. The first
/// samples use whatever shorter window is available.
pub fn classify_counts<I>(counts: I, window: usize) -> Vec<SleepState>
where
    I: IntoIterator<Item = u32>,
{
    let counts: Vec<u32> = counts.into_iter().collect();
    let mut running: u64 = 0;
    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            running += u64::from(count);
            if i >= window {
                running -= u64::from(counts[i - window]);
            }
            if running == 0 {
                SleepState::Asleep
            } else {
                SleepState::Awake
            }
        })
        .collect()
}

/// Classifies every alive channel. Channels are independent; the cancel
/// flag is checked between them.
pub fn classify(
    recording: &Recording,
    alive: &[ChannelId],
    window: usize,
    cancel: &CancelFlag,
) -> Result<SleepStates> {
    let mut channels = Vec::with_capacity(alive.len());
    for &channel in alive {
        cancel.check()?;
        let states = classify_counts(recording.counts(channel), window);
        let asleep = states.iter().filter(|s| **s == SleepState::Asleep).count();
        debug!(
            "Channel {}: {} of {} samples asleep",
            channel,
            asleep,
            states.len()
        );
        channels.push(ChannelStates { channel, states });
    }
    channels.sort_by_key(|c| c.channel);

    Ok(SleepStates {
        timestamps: recording.timestamps.clone(),
        interval: recording.sampling_interval,
        window,
        channels,
    })
}
