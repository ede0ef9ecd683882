//! One analysis run: recording and parameters in, every derived table out.

use crate::actogram::{actogram, ActogramBin};
use crate::aggregate::{
    self, BoutRecord, ChannelBoutStats, ChannelDayActivity, ConditionActivity,
    ConditionBoutSummary, ConditionSleep, DailyActivity, DailyBoutStats, IndividualSleep,
    IndividualSleepSummary, ProfileBin, SleepTimepoint,
};
use crate::bouts::{segment_all, Bout, BoutFilter};
use crate::circadian::CircadianClock;
use crate::config::{AnalysisParams, ConditionLayout};
use crate::sleep_state::{classify, SleepStates};
use crate::viability::{classify_viability, ViabilityReport};
use crate::{EngineError, Recording, Result};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop request, checked between channels.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(EngineError::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub params: AnalysisParams,
    pub layout: ConditionLayout,
    pub viability: ViabilityReport,
    pub sleep_states: SleepStates,
    /// Every bout of every alive channel, before filtering.
    pub bouts: Vec<Bout>,
    /// Bouts that passed the bout filter.
    pub bout_table: Vec<BoutRecord>,
    pub bouts_by_day: Vec<DailyBoutStats>,
    pub bouts_by_channel: Vec<ChannelBoutStats>,
    pub bouts_by_condition: Vec<ConditionBoutSummary>,
    pub condition_activity: Vec<ConditionActivity>,
    pub channel_day_activity: Vec<ChannelDayActivity>,
    pub daily_activity: Vec<DailyActivity>,
    pub individual_sleep: Vec<IndividualSleep>,
    pub individual_sleep_summary: Vec<IndividualSleepSummary>,
    pub sleep_by_condition: Vec<ConditionSleep>,
    pub sleep_timeline: Vec<SleepTimepoint>,
    pub sleep_profile: Vec<ProfileBin>,
    pub actogram: Vec<ActogramBin>,
}

/// Runs the whole chain. Parameters are validated before any data is
/// touched; `cancel` aborts between channels with [`EngineError::Interrupted`].
pub fn run(recording: &Recording, params: &AnalysisParams, cancel: &CancelFlag) -> Result<AnalysisReport> {
    params.validate()?;
    if recording.interval_minutes() != params.sampling_interval_minutes {
        return Err(EngineError::config(format!(
            "recording is sampled every {} minutes but the analysis expects {}",
            recording.interval_minutes(),
            params.sampling_interval_minutes
        )));
    }
    if recording.is_empty() {
        return Err(EngineError::InsufficientData(format!(
            "no samples between {} and {}",
            params.date_range.start, params.date_range.end
        )));
    }

    let layout = params.layout()?;
    let clock = CircadianClock::new(params.light_onset);
    info!("Lights on at {}, ZT0", clock.light_onset());

    let viability = classify_viability(recording, &layout.channels(), params.dead_threshold as u64);
    let alive = viability.alive();
    if alive.is_empty() {
        warn!("No alive channels, sleep and bout tables will be empty");
    }

    let window = params.sleep_window();
    info!("Classifying sleep with a {} sample window", window);
    let sleep_states = classify(recording, &alive, window, cancel)?;

    let bouts = segment_all(&sleep_states, &clock, cancel)?;
    let filter = BoutFilter::new(params.bout_kind, params.min_bout_length_minutes);
    let selected = filter.apply(&bouts);
    info!(
        "{} bouts found, {} {:?} bouts of at least {} minutes kept",
        bouts.len(),
        selected.len(),
        params.bout_kind,
        params.min_bout_length_minutes
    );

    let bout_table = aggregate::bout_table(&selected, &layout);
    let bouts_by_day = aggregate::bouts_by_day(&selected, &layout);
    let bouts_by_channel = aggregate::bouts_by_channel(&bouts_by_day);
    let bouts_by_condition = aggregate::bouts_by_condition(&bouts_by_channel, &layout);

    let individual_sleep = aggregate::individual_sleep(&sleep_states, &layout, &clock);
    let individual_sleep_summary = aggregate::individual_sleep_summary(&individual_sleep);
    let sleep_by_condition = aggregate::sleep_by_condition(&individual_sleep, &layout);
    let sleep_timeline = aggregate::sleep_timeline(&sleep_states, &layout);
    let sleep_profile = aggregate::sleep_profile(
        &sleep_states,
        &layout,
        &clock,
        params.bin_size_minutes as u32,
    );

    Ok(AnalysisReport {
        condition_activity: aggregate::condition_activity(recording, &viability, &layout, &clock),
        channel_day_activity: aggregate::channel_day_activity(recording, &viability, &layout),
        daily_activity: aggregate::daily_activity(recording, &viability, &layout),
        actogram: actogram(
            recording,
            &viability,
            &layout,
            &clock,
            params.actogram_channels,
            params.actogram_bin_minutes as u32,
        ),
        params: params.clone(),
        layout,
        viability,
        sleep_states,
        bouts,
        bout_table,
        bouts_by_day,
        bouts_by_channel,
        bouts_by_condition,
        individual_sleep,
        individual_sleep_summary,
        sleep_by_condition,
        sleep_timeline,
        sleep_profile,
    })
}
