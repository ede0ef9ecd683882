use crate::circadian::{CircadianClock, ZeitgeberTime};
use crate::config::BoutKind;
use crate::pipeline::CancelFlag;
use crate::sleep_state::{SleepState, SleepStates};
use crate::{ChannelId, LightPhase, Result};
use chrono::{Duration, NaiveDateTime};
use log::debug;

/// A maximal run of one sleep state on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bout {
    pub channel: ChannelId,
    pub state: SleepState,
    pub start: NaiveDateTime,
    pub duration: Duration,
    /// Zeitgeber time and light phase at `start`.
    pub zt_start: ZeitgeberTime,
}

impl Bout {
    pub fn phase(&self) -> LightPhase {
        self.zt_start.phase
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start + self.duration
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration.num_seconds() as f64 / 60.0
    }
}

/// Run-length encodes one channel's state sequence.
///
/// A bout is closed at every state change with the duration up to the
/// changing sample. When at least one change exists, the last run is closed
/// one interval after the final sample. A sequence without any change
/// yields no bouts.
pub fn segment_channel(
    channel: ChannelId,
    timestamps: &[NaiveDateTime],
    states: &[SleepState],
    interval: Duration,
    clock: &CircadianClock,
) -> Vec<Bout> {
    let n = timestamps.len().min(states.len());
    let mut bouts = Vec::new();
    if n == 0 {
        return bouts;
    }

    let mut start = 0;
    let close = |from: usize, end: NaiveDateTime, bouts: &mut Vec<Bout>| {
        bouts.push(Bout {
            channel,
            state: states[from],
            start: timestamps[from],
            duration: end - timestamps[from],
            zt_start: clock.map(timestamps[from]),
        });
    };

    for i in 1..n {
        if states[i] != states[i - 1] {
            close(start, timestamps[i], &mut bouts);
            start = i;
        }
    }
    if !bouts.is_empty() {
        close(start, timestamps[n - 1] + interval, &mut bouts);
    }

    bouts
}

/// Segments every classified channel, in channel order.
pub fn segment_all(
    states: &SleepStates,
    clock: &CircadianClock,
    cancel: &CancelFlag,
) -> Result<Vec<Bout>> {
    let mut bouts = Vec::new();
    for channel in states.channels() {
        cancel.check()?;
        let found = segment_channel(
            channel.channel,
            &states.timestamps,
            &channel.states,
            states.interval,
            clock,
        );
        debug!("Channel {}: {} bouts", channel.channel, found.len());
        bouts.extend(found);
    }
    Ok(bouts)
}

/// Downstream bout selection: one state and a minimum duration.
#[derive(Debug, Clone, Copy)]
pub struct BoutFilter {
    pub kind: BoutKind,
    pub min_duration: Duration,
}

impl BoutFilter {
    pub fn new(kind: BoutKind, min_minutes: i64) -> Self {
        Self {
            kind,
            min_duration: Duration::minutes(min_minutes),
        }
    }

    pub fn accepts(&self, bout: &Bout) -> bool {
        bout.state == self.kind.state() && bout.duration >= self.min_duration
    }

    pub fn apply<'a>(&self, bouts: &'a [Bout]) -> Vec<&'a Bout> {
        bouts.iter().filter(|b| self.accepts(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sleep_state::{classify, classify_counts};
    use crate::test_support::{at, recording_every};
    use chrono::NaiveTime;
    use crate::sleep_state::SleepState::{Asleep as S, Awake as A};

    fn clock() -> CircadianClock {
        CircadianClock::new(NaiveTime::from_hms_opt(6, 0, 0).unwrap())
    }

    fn minutes(start: NaiveDateTime, n: usize) -> Vec<NaiveDateTime> {
        (0..n).map(|i| start + Duration::minutes(i as i64)).collect()
    }

    fn expand(bouts: &[Bout], interval: Duration) -> Vec<SleepState> {
        bouts
            .iter()
            .flat_map(|b| {
                let n = (b.duration.num_seconds() / interval.num_seconds()) as usize;
                std::iter::repeat(b.state).take(n)
            })
            .collect()
    }

    #[test]
    fn isolated_count_splits_two_sleep_bouts() {
        let states = classify_counts([0, 0, 0, 0, 0, 5, 0, 0, 0, 0, 0], 5);
        let ts = minutes(at("2024-02-23", "10:00:00"), states.len());
        let bouts = segment_channel(1, &ts, &states, Duration::minutes(1), &clock());

        let summary: Vec<_> = bouts
            .iter()
            .map(|b| (b.state, b.duration.num_minutes()))
            .collect();
        assert_eq!(summary, vec![(S, 5), (A, 5), (S, 1)]);
        assert_eq!(bouts[1].start, at("2024-02-23", "10:05:00"));
        assert_eq!(bouts[2].end(), at("2024-02-23", "10:11:00"));
    }

    #[test]
    fn bouts_reconstruct_states_and_alternate() {
        let states = vec![A, A, S, S, S, A, S, S, A, A, A, S];
        let ts = minutes(at("2024-02-23", "05:55:00"), states.len());
        let bouts = segment_channel(4, &ts, &states, Duration::minutes(1), &clock());

        assert_eq!(expand(&bouts, Duration::minutes(1)), states);
        for pair in bouts.windows(2) {
            assert_ne!(pair[0].state, pair[1].state);
            assert_eq!(pair[0].end(), pair[1].start);
        }
        assert!(bouts.iter().all(|b| b.duration >= Duration::minutes(1)));
    }

    #[test]
    fn final_bout_closes_one_interval_late_at_five_minutes() {
        let rec = recording_every(at("2024-02-23", "10:00:00"), 5, &[vec![0, 3, 0, 0]]);
        let states = classify(&rec, &[1], 1, &CancelFlag::new()).unwrap();
        let bouts = segment_all(&states, &clock(), &CancelFlag::new()).unwrap();

        let summary: Vec<_> = bouts
            .iter()
            .map(|b| (b.state, b.duration.num_minutes()))
            .collect();
        assert_eq!(summary, vec![(S, 5), (A, 5), (S, 10)]);
        assert_eq!(bouts[2].end(), at("2024-02-23", "10:20:00"));
        assert_eq!(expand(&bouts, Duration::minutes(5)), states.get(1).unwrap());
    }

    #[test]
    fn constant_channel_has_no_bouts() {
        let states = vec![S; 20];
        let ts = minutes(at("2024-02-23", "10:00:00"), 20);
        assert!(segment_channel(1, &ts, &states, Duration::minutes(1), &clock()).is_empty());
        assert!(segment_channel(1, &[], &[], Duration::minutes(1), &clock()).is_empty());
    }

    #[test]
    fn bout_start_carries_zeitgeber_phase() {
        let states = vec![A, S, S];
        let ts = minutes(at("2024-02-23", "17:59:00"), 3);
        let bouts = segment_channel(1, &ts, &states, Duration::minutes(1), &clock());
        assert_eq!(bouts[0].phase(), LightPhase::Day);
        assert_eq!(bouts[1].phase(), LightPhase::Night);
        assert_eq!(bouts[1].zt_start.zt, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn filter_selects_kind_and_minimum_length() {
        let states = classify_counts([0, 0, 0, 0, 0, 5, 0, 0, 0, 0, 0], 5);
        let ts = minutes(at("2024-02-23", "10:00:00"), states.len());
        let bouts = segment_channel(1, &ts, &states, Duration::minutes(1), &clock());

        let sleep = BoutFilter::new(BoutKind::Sleep, 5).apply(&bouts);
        assert_eq!(sleep.len(), 1);
        assert_eq!(sleep[0].duration, Duration::minutes(5));

        let activity = BoutFilter::new(BoutKind::Activity, 0).apply(&bouts);
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].state, A);
    }
}
