//! Group-by tables over activity counts, sleep states and bouts.
//!
//! Every table is a plain `Vec` of rows in output order: conditions in
//! layout order, dates chronologically, channels numerically, Day before
//! Night. Statistics that cannot be computed stay `None`.

use crate::bouts::Bout;
use crate::circadian::CircadianClock;
use crate::config::ConditionLayout;
use crate::sleep_state::SleepStates;
use crate::stats::{self, Summary};
use crate::viability::ViabilityReport;
use crate::{ChannelId, LightPhase, Recording};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;

const LIGHT_PHASES: [LightPhase; 2] = [LightPhase::Day, LightPhase::Night];

/// Minutes in one 12 hour light phase.
const MINUTES_PER_PHASE: f64 = 720.0;

/// Part of the day a condition summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PhaseScope {
    All,
    Day,
    Night,
}

impl PhaseScope {
    pub const EVERY: [PhaseScope; 3] = [PhaseScope::All, PhaseScope::Day, PhaseScope::Night];

    pub fn includes(self, phase: LightPhase) -> bool {
        match self {
            PhaseScope::All => true,
            PhaseScope::Day => phase == LightPhase::Day,
            PhaseScope::Night => phase == LightPhase::Night,
        }
    }
}

impl fmt::Display for PhaseScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseScope::All => f.write_str("All"),
            PhaseScope::Day => f.write_str("Day"),
            PhaseScope::Night => f.write_str("Night"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStatus {
    Ok,
    /// No alive channel contributed to the row.
    InsufficientData,
}

impl fmt::Display for DataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataStatus::Ok => f.write_str("OK"),
            DataStatus::InsufficientData => f.write_str("INSUFFICIENT_DATA"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionActivity {
    pub condition: String,
    pub scope: PhaseScope,
    /// Across alive channels of each channel's mean daily count in `scope`.
    pub summary: Summary,
    pub n_alive: usize,
    pub n_dead: usize,
    pub n_total: usize,
    pub status: DataStatus,
}

/// Daily count totals of one channel restricted to `scope`. Dates without
/// any sample in scope are absent.
fn scoped_daily_totals(
    recording: &Recording,
    channel: ChannelId,
    clock: &CircadianClock,
    scope: PhaseScope,
) -> BTreeMap<NaiveDate, u64> {
    let mut totals = BTreeMap::new();
    for (ts, count) in recording.timestamps.iter().zip(recording.counts(channel)) {
        if scope.includes(clock.phase(*ts)) {
            *totals.entry(ts.date()).or_insert(0) += u64::from(count);
        }
    }
    totals
}

/// Per-condition daily activity summary for the whole day, Day and Night.
pub fn condition_activity(
    recording: &Recording,
    viability: &ViabilityReport,
    layout: &ConditionLayout,
    clock: &CircadianClock,
) -> Vec<ConditionActivity> {
    let mut rows = Vec::new();
    for (condition, channels) in layout.groups() {
        let alive = viability.alive_among(channels);
        let n_total = channels.len();
        let n_alive = alive.len();
        if n_alive == 0 {
            warn!("Condition {}: every channel is dead", condition);
        }

        for scope in PhaseScope::EVERY {
            let per_channel = alive.iter().filter_map(|&channel| {
                let totals = scoped_daily_totals(recording, channel, clock, scope);
                stats::mean(totals.values().map(|&t| t as f64))
            });
            let summary = Summary::new(per_channel);
            let status = if summary.has_data() {
                DataStatus::Ok
            } else {
                if n_alive > 0 {
                    debug!("Condition {}: no {} samples", condition, scope);
                }
                DataStatus::InsufficientData
            };
            rows.push(ConditionActivity {
                condition: condition.to_string(),
                scope,
                summary,
                n_alive,
                n_dead: n_total - n_alive,
                n_total,
                status,
            });
        }
    }
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDayActivity {
    pub date: NaiveDate,
    pub channel: ChannelId,
    pub condition: String,
    /// Over the channel's samples on `date`.
    pub summary: Summary,
}

/// Per-day, per-channel statistics of raw counts for alive channels.
pub fn channel_day_activity(
    recording: &Recording,
    viability: &ViabilityReport,
    layout: &ConditionLayout,
) -> Vec<ChannelDayActivity> {
    let mut rows = Vec::new();
    for (condition, channels) in layout.groups() {
        for channel in viability.alive_among(channels) {
            let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
            for (ts, count) in recording.timestamps.iter().zip(recording.counts(channel)) {
                by_date.entry(ts.date()).or_default().push(f64::from(count));
            }
            rows.extend(by_date.into_iter().map(|(date, counts)| ChannelDayActivity {
                date,
                channel,
                condition: condition.to_string(),
                summary: Summary::new(counts),
            }));
        }
    }
    rows.sort_by_key(|r| (r.date, r.channel));
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub condition: String,
    /// Across alive channels of their total count on `date`.
    pub summary: Summary,
}

/// Locomotor activity by day: daily totals summarized across alive channels.
pub fn daily_activity(
    recording: &Recording,
    viability: &ViabilityReport,
    layout: &ConditionLayout,
) -> Vec<DailyActivity> {
    let dates = recording.dates();
    let mut rows = Vec::new();
    for (condition, channels) in layout.groups() {
        let alive: Vec<_> = viability
            .alive_among(channels)
            .into_iter()
            .filter_map(|c| viability.get(c))
            .collect();
        for &date in &dates {
            let totals = alive
                .iter()
                .filter_map(|c| c.daily_totals.get(&date))
                .map(|&t| t as f64);
            rows.push(DailyActivity {
                date,
                condition: condition.to_string(),
                summary: Summary::new(totals),
            });
        }
    }
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndividualSleep {
    pub channel: ChannelId,
    pub condition: String,
    pub phase: LightPhase,
    /// Fraction of samples asleep in `phase` over the whole range.
    pub mean_sleep: Option<f64>,
}

pub fn individual_sleep(
    states: &SleepStates,
    layout: &ConditionLayout,
    clock: &CircadianClock,
) -> Vec<IndividualSleep> {
    let phases: Vec<LightPhase> = states.timestamps.iter().map(|ts| clock.phase(*ts)).collect();
    let mut rows = Vec::new();
    for channel in states.channels() {
        let Some(condition) = layout.condition_of(channel.channel) else {
            continue;
        };
        for phase in LIGHT_PHASES {
            let values = channel
                .states
                .iter()
                .zip(&phases)
                .filter(|(_, p)| **p == phase)
                .map(|(s, _)| f64::from(s.value()));
            rows.push(IndividualSleep {
                channel: channel.channel,
                condition: condition.to_string(),
                phase,
                mean_sleep: stats::mean(values),
            });
        }
    }
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndividualSleepSummary {
    pub channel: ChannelId,
    pub condition: String,
    pub day_sleep_per_30min: Option<f64>,
    pub night_sleep_per_30min: Option<f64>,
    pub total_sleep_hours_per_day: Option<f64>,
}

/// Wide per-channel view of [`individual_sleep`] in minutes and hours.
pub fn individual_sleep_summary(rows: &[IndividualSleep]) -> Vec<IndividualSleepSummary> {
    let mut by_channel: BTreeMap<ChannelId, (String, Option<f64>, Option<f64>)> = BTreeMap::new();
    for row in rows {
        let entry = by_channel
            .entry(row.channel)
            .or_insert_with(|| (row.condition.clone(), None, None));
        match row.phase {
            LightPhase::Day => entry.1 = row.mean_sleep,
            LightPhase::Night => entry.2 = row.mean_sleep,
        }
    }

    by_channel
        .into_iter()
        .map(|(channel, (condition, day, night))| IndividualSleepSummary {
            channel,
            condition,
            day_sleep_per_30min: day.map(|f| f * 30.0),
            night_sleep_per_30min: night.map(|f| f * 30.0),
            total_sleep_hours_per_day: day
                .zip(night)
                .map(|(d, n)| (d + n) * MINUTES_PER_PHASE / 60.0),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSleep {
    pub condition: String,
    pub phase: LightPhase,
    pub summary: Summary,
}

pub fn sleep_by_condition(rows: &[IndividualSleep], layout: &ConditionLayout) -> Vec<ConditionSleep> {
    let mut out = Vec::new();
    for (condition, _) in layout.groups() {
        for phase in LIGHT_PHASES {
            let values = rows
                .iter()
                .filter(|r| r.condition == condition && r.phase == phase)
                .filter_map(|r| r.mean_sleep);
            out.push(ConditionSleep {
                condition: condition.to_string(),
                phase,
                summary: Summary::new(values),
            });
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct SleepTimepoint {
    pub timestamp: NaiveDateTime,
    pub condition: String,
    /// Across the condition's alive channels at `timestamp`.
    pub summary: Summary,
}

/// Per-sample sleep value summarized across each condition's alive channels.
pub fn sleep_timeline(states: &SleepStates, layout: &ConditionLayout) -> Vec<SleepTimepoint> {
    let mut rows = Vec::new();
    for (condition, channels) in layout.groups() {
        let summaries = states.cross_channel(channels);
        rows.extend(
            states
                .timestamps
                .iter()
                .zip(summaries)
                .map(|(ts, summary)| SleepTimepoint {
                    timestamp: *ts,
                    condition: condition.to_string(),
                    summary,
                }),
        );
    }
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileBin {
    pub condition: String,
    /// Clock minute of day where the bin starts.
    pub bin_start_minutes: u32,
    pub zt: NaiveTime,
    /// Across channels of each channel's sleep fraction in the bin, all days
    /// pooled.
    pub summary: Summary,
}

/// Average sleep profile: fixed-width bins of the day, ordered by ZT.
pub fn sleep_profile(
    states: &SleepStates,
    layout: &ConditionLayout,
    clock: &CircadianClock,
    bin_minutes: u32,
) -> Vec<ProfileBin> {
    let bin_minutes = bin_minutes.max(1);
    let n_bins = (1440 + bin_minutes - 1) / bin_minutes;
    let bin_of: Vec<usize> = states
        .timestamps
        .iter()
        .map(|ts| ((ts.time().num_seconds_from_midnight() / 60) / bin_minutes) as usize)
        .collect();

    let mut order: Vec<u32> = (0..n_bins).collect();
    order.sort_by_key(|&b| clock.zt_of_minute(b * bin_minutes).minutes());

    let mut rows = Vec::new();
    for (condition, channels) in layout.groups() {
        // per channel: (asleep samples, samples) per bin
        let per_channel: Vec<Vec<(u64, u64)>> = channels
            .iter()
            .filter_map(|&c| states.get(c))
            .map(|channel_states| {
                let mut acc = vec![(0u64, 0u64); n_bins as usize];
                for (state, &bin) in channel_states.iter().zip(&bin_of) {
                    acc[bin].0 += u64::from(state.value());
                    acc[bin].1 += 1;
                }
                acc
            })
            .collect();

        for &bin in &order {
            let fractions = per_channel.iter().filter_map(|acc| {
                let (asleep, n) = acc[bin as usize];
                (n > 0).then(|| asleep as f64 / n as f64)
            });
            let start = bin * bin_minutes;
            rows.push(ProfileBin {
                condition: condition.to_string(),
                bin_start_minutes: start,
                zt: clock.zt_of_minute(start).zt,
                summary: Summary::new(fractions),
            });
        }
        debug!("Condition {}: {} profile bins", condition, n_bins);
    }
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoutRecord {
    pub condition: String,
    pub bout: Bout,
}

/// Flat bout table, channel order then time order.
pub fn bout_table(bouts: &[&Bout], layout: &ConditionLayout) -> Vec<BoutRecord> {
    let mut rows: Vec<BoutRecord> = bouts
        .iter()
        .filter_map(|b| {
            layout.condition_of(b.channel).map(|condition| BoutRecord {
                condition: condition.to_string(),
                bout: (*b).clone(),
            })
        })
        .collect();
    rows.sort_by_key(|r| (r.bout.channel, r.bout.start));
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyBoutStats {
    pub channel: ChannelId,
    pub condition: String,
    pub date: NaiveDate,
    pub phase: LightPhase,
    pub bout_count: usize,
    pub total_minutes: f64,
    pub mean_minutes: f64,
}

/// Bouts grouped by (channel, start date, light phase of start).
pub fn bouts_by_day(bouts: &[&Bout], layout: &ConditionLayout) -> Vec<DailyBoutStats> {
    let mut groups: BTreeMap<(ChannelId, NaiveDate, LightPhase), Vec<f64>> = BTreeMap::new();
    for bout in bouts {
        groups
            .entry((bout.channel, bout.start.date(), bout.phase()))
            .or_default()
            .push(bout.duration_minutes());
    }

    groups
        .into_iter()
        .filter_map(|((channel, date, phase), durations)| {
            let condition = layout.condition_of(channel)?;
            let total_minutes: f64 = durations.iter().sum();
            Some(DailyBoutStats {
                channel,
                condition: condition.to_string(),
                date,
                phase,
                bout_count: durations.len(),
                total_minutes,
                mean_minutes: total_minutes / durations.len() as f64,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBoutStats {
    pub channel: ChannelId,
    pub condition: String,
    pub phase: LightPhase,
    pub days: usize,
    pub mean_bout_count: f64,
    pub mean_bout_minutes: f64,
}

/// Per-day bout statistics averaged over the days each channel has bouts.
pub fn bouts_by_channel(daily: &[DailyBoutStats]) -> Vec<ChannelBoutStats> {
    let mut groups: BTreeMap<(ChannelId, LightPhase), Vec<&DailyBoutStats>> = BTreeMap::new();
    for row in daily {
        groups.entry((row.channel, row.phase)).or_default().push(row);
    }

    groups
        .into_iter()
        .filter_map(|((channel, phase), days)| {
            let first = days.first()?;
            let n = days.len() as f64;
            Some(ChannelBoutStats {
                channel,
                condition: first.condition.clone(),
                phase,
                days: days.len(),
                mean_bout_count: days.iter().map(|d| d.bout_count as f64).sum::<f64>() / n,
                mean_bout_minutes: days.iter().map(|d| d.mean_minutes).sum::<f64>() / n,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionBoutSummary {
    pub condition: String,
    pub phase: LightPhase,
    pub bout_count: Summary,
    pub bout_minutes: Summary,
}

/// Across channels of each condition, per light phase.
pub fn bouts_by_condition(
    per_channel: &[ChannelBoutStats],
    layout: &ConditionLayout,
) -> Vec<ConditionBoutSummary> {
    let mut rows = Vec::new();
    for (condition, _) in layout.groups() {
        for phase in LIGHT_PHASES {
            let members: Vec<_> = per_channel
                .iter()
                .filter(|c| c.condition == condition && c.phase == phase)
                .collect();
            rows.push(ConditionBoutSummary {
                condition: condition.to_string(),
                phase,
                bout_count: Summary::new(members.iter().map(|c| c.mean_bout_count)),
                bout_minutes: Summary::new(members.iter().map(|c| c.mean_bout_minutes)),
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bouts::segment_channel;
    use crate::config::ConditionSpec;
    use crate::pipeline::CancelFlag;
    use crate::sleep_state::{classify, SleepState};
    use crate::test_support::{at, recording};
    use crate::viability::classify_viability;
    use chrono::Duration;

    fn clock() -> CircadianClock {
        CircadianClock::new(NaiveTime::from_hms_opt(6, 0, 0).unwrap())
    }

    fn layout(conditions: &[&str]) -> ConditionLayout {
        let conditions: Vec<ConditionSpec> =
            conditions.iter().map(|s| s.parse().unwrap()).collect();
        ConditionLayout::new(&conditions).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn condition_activity_per_scope() {
        // 05:58 and 05:59 are Night, 06:00 and 06:01 Day
        let rec = recording(
            at("2024-02-23", "05:58:00"),
            &[vec![1, 2, 3, 4], vec![2, 2, 2, 2]],
        );
        let viability = classify_viability(&rec, &[1, 2], 0);
        let rows = condition_activity(&rec, &viability, &layout(&["wt=2"]), &clock());

        assert_eq!(rows.len(), 3);
        let all = &rows[0];
        assert_eq!(all.scope, PhaseScope::All);
        assert_eq!(all.summary.mean, Some(9.0));
        assert!((all.summary.sd.unwrap() - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!((all.n_alive, all.n_dead, all.n_total), (2, 0, 2));
        assert_eq!(rows[1].summary.mean, Some(5.5));
        assert_eq!(rows[2].summary.mean, Some(3.5));
        assert_eq!(all.status, DataStatus::Ok);
    }

    #[test]
    fn all_dead_condition_is_flagged_not_divided() {
        let rec = recording(at("2024-02-23", "10:00:00"), &[vec![1; 4], vec![1; 4]]);
        let viability = classify_viability(&rec, &[1, 2], 100);
        let rows = condition_activity(&rec, &viability, &layout(&["wt=2"]), &clock());
        for row in &rows {
            assert_eq!(row.status, DataStatus::InsufficientData);
            assert_eq!(row.summary.mean, None);
            assert_eq!(row.summary.sem, None);
            assert_eq!((row.n_alive, row.n_dead), (0, 2));
        }
        assert_eq!(rows[0].status.to_string(), "INSUFFICIENT_DATA");
    }

    #[test]
    fn scope_without_samples_is_insufficient() {
        // 08:00 to 10:00 is all Day
        let rec = recording(
            at("2024-02-23", "08:00:00"),
            &[vec![1; 121], vec![2; 121]],
        );
        let viability = classify_viability(&rec, &[1, 2], 0);
        let rows = condition_activity(&rec, &viability, &layout(&["wt=2"]), &clock());

        assert_eq!(rows[1].scope, PhaseScope::Day);
        assert_eq!(rows[1].status, DataStatus::Ok);
        let night = &rows[2];
        assert_eq!(night.scope, PhaseScope::Night);
        assert_eq!(night.summary.n, 0);
        assert_eq!(night.summary.mean, None);
        assert_eq!(night.n_alive, 2);
        assert_eq!(night.status, DataStatus::InsufficientData);
    }

    #[test]
    fn activity_tables_sort_by_date_then_channel() {
        let mut ch = vec![0u32; 4];
        ch[0] = 4;
        let rec = recording(at("2024-02-23", "23:58:00"), &[ch.clone(), vec![1; 4], ch]);
        let viability = classify_viability(&rec, &[1, 2, 3], 0);
        let l = layout(&["wt=2", "mut=1"]);

        let rows = channel_day_activity(&rec, &viability, &l);
        let keys: Vec<_> = rows.iter().map(|r| (r.date, r.channel)).collect();
        assert_eq!(
            keys,
            vec![
                (date("2024-02-23"), 1),
                (date("2024-02-23"), 2),
                (date("2024-02-23"), 3),
                (date("2024-02-24"), 1),
                (date("2024-02-24"), 2),
                (date("2024-02-24"), 3),
            ]
        );
        assert_eq!(rows[0].summary.sum, 4.0);
        assert_eq!(rows[0].summary.mean, Some(2.0));
        assert_eq!(rows[2].condition, "mut");

        let daily = daily_activity(&rec, &viability, &l);
        assert_eq!(daily.len(), 4);
        assert_eq!(daily[0].condition, "wt");
        assert_eq!(daily[0].summary.mean, Some(3.0));
        assert_eq!(daily[1].summary.mean, Some(1.0));
        assert_eq!(daily[2].condition, "mut");
        assert_eq!(daily[2].summary.sd, None);
    }

    #[test]
    fn individual_sleep_by_phase() {
        // two Night samples then two Day samples
        let rec = recording(
            at("2024-02-23", "05:58:00"),
            &[vec![0, 0, 1, 0], vec![1, 1, 1, 1]],
        );
        let l = layout(&["wt=2"]);
        let states = classify(&rec, &[1, 2], 1, &CancelFlag::default()).unwrap();
        let rows = individual_sleep(&states, &l, &clock());

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].phase, LightPhase::Day);
        assert_eq!(rows[0].mean_sleep, Some(0.5));
        assert_eq!(rows[1].mean_sleep, Some(1.0));
        assert_eq!(rows[2].mean_sleep, Some(0.0));

        let summary = individual_sleep_summary(&rows);
        assert_eq!(summary[0].day_sleep_per_30min, Some(15.0));
        assert_eq!(summary[0].night_sleep_per_30min, Some(30.0));
        assert_eq!(summary[0].total_sleep_hours_per_day, Some(18.0));

        let timeline = sleep_timeline(&states, &l);
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline[0].summary.mean, Some(0.5));
        assert_eq!(timeline[2].summary.mean, Some(0.0));
        assert_eq!(timeline[2].summary.n, 2);

        let by_condition = sleep_by_condition(&rows, &l);
        assert_eq!(by_condition.len(), 2);
        assert_eq!(by_condition[0].summary.mean, Some(0.25));
        assert_eq!(by_condition[1].summary.n, 2);
    }

    #[test]
    fn profile_bins_follow_zt_and_report_empty_bins() {
        let mut active_then_still = vec![1u32; 30];
        active_then_still.extend(vec![0; 30]);
        let rec = recording(
            at("2024-02-23", "06:00:00"),
            &[vec![0; 60], active_then_still],
        );
        let states = classify(&rec, &[1, 2], 1, &CancelFlag::default()).unwrap();
        let rows = sleep_profile(&states, &layout(&["wt=2"]), &clock(), 30);

        assert_eq!(rows.len(), 48);
        assert_eq!(rows[0].bin_start_minutes, 360);
        assert_eq!(rows[0].zt, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(rows[0].summary.mean, Some(0.5));
        assert_eq!(rows[1].summary.mean, Some(1.0));
        assert_eq!(rows[1].summary.sem, Some(0.0));
        assert_eq!(rows[2].summary.mean, None);
        assert_eq!(rows[47].bin_start_minutes, 330);
        for pair in rows.windows(2) {
            assert!(pair[0].zt < pair[1].zt);
        }
    }

    fn bout(channel: ChannelId, start: NaiveDateTime, minutes: i64) -> Bout {
        Bout {
            channel,
            state: SleepState::Asleep,
            start,
            duration: Duration::minutes(minutes),
            zt_start: clock().map(start),
        }
    }

    #[test]
    fn bout_aggregation_levels() {
        let bouts = vec![
            bout(10, at("2024-02-23", "08:00:00"), 10),
            bout(10, at("2024-02-23", "09:00:00"), 20),
            bout(10, at("2024-02-24", "08:00:00"), 30),
            bout(10, at("2024-02-24", "20:00:00"), 60),
            bout(2, at("2024-02-23", "08:00:00"), 5),
        ];
        let refs: Vec<&Bout> = bouts.iter().collect();
        let l = layout(&["wt=16"]);

        let daily = bouts_by_day(&refs, &l);
        assert_eq!(daily.len(), 4);
        assert_eq!(daily[0].channel, 2);
        let first = &daily[1];
        assert_eq!((first.channel, first.date, first.phase), (10, date("2024-02-23"), LightPhase::Day));
        assert_eq!(first.bout_count, 2);
        assert_eq!(first.total_minutes, 30.0);
        assert_eq!(first.mean_minutes, 15.0);

        let per_channel = bouts_by_channel(&daily);
        let ch10_day = per_channel
            .iter()
            .find(|c| c.channel == 10 && c.phase == LightPhase::Day)
            .unwrap();
        assert_eq!(ch10_day.days, 2);
        assert_eq!(ch10_day.mean_bout_count, 1.5);
        assert_eq!(ch10_day.mean_bout_minutes, 22.5);

        let summary = bouts_by_condition(&per_channel, &l);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].bout_count.n, 2);
        assert_eq!(summary[0].bout_count.mean, Some(1.25));
        assert_eq!(summary[1].bout_minutes.n, 1);
        assert_eq!(summary[1].bout_minutes.sem, None);

        let table = bout_table(&refs, &l);
        assert_eq!(table[0].bout.channel, 2);
        assert_eq!(table[1].bout.start, at("2024-02-23", "08:00:00"));
    }

    #[test]
    fn bout_table_skips_unassigned_channels() {
        let states = vec![SleepState::Awake, SleepState::Asleep];
        let ts = vec![at("2024-02-23", "10:00:00"), at("2024-02-23", "10:01:00")];
        let bouts = segment_channel(5, &ts, &states, Duration::minutes(1), &clock());
        let refs: Vec<&Bout> = bouts.iter().collect();
        assert!(bout_table(&refs, &layout(&["wt=4"])).is_empty());
    }
}
