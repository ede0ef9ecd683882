use crate::sleep_state::SleepState;
use crate::{ChannelId, EngineError, Result, CHANNELS_PER_MONITOR};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Inactivity span that counts as sleep.
pub const SLEEP_INACTIVITY_MINUTES: i64 = 5;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Which bouts survive the bout filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BoutKind {
    Sleep,
    Activity,
}

impl BoutKind {
    pub fn state(self) -> SleepState {
        match self {
            BoutKind::Sleep => SleepState::Asleep,
            BoutKind::Activity => SleepState::Awake,
        }
    }
}

/// Channel subset plotted in the actogram table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChannelSubset {
    Alive,
    Dead,
    All,
}

/// Inclusive calendar range; `end` covers the whole day up to 23:59:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        let date = ts.date();
        date >= self.start && date <= self.end
    }
}

/// One experimental group and how many consecutive channels it occupies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSpec {
    pub name: String,
    pub channel_count: usize,
}

impl FromStr for ConditionSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, count) = s
            .rsplit_once('=')
            .ok_or_else(|| format!("Invalid condition: {}. Use NAME=CHANNELS, e.g. wt=16", s))?;
        let channel_count = count
            .trim()
            .parse()
            .map_err(|_| format!("Invalid channel count in condition: {}", s))?;
        Ok(ConditionSpec {
            name: name.trim().to_string(),
            channel_count,
        })
    }
}

/// Channel to condition assignment, channels handed out from 1 upwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionLayout {
    groups: Vec<(String, Vec<ChannelId>)>,
}

impl ConditionLayout {
    pub fn new(conditions: &[ConditionSpec]) -> Result<Self> {
        validate_conditions(conditions)?;
        let mut next: ChannelId = 1;
        let groups = conditions
            .iter()
            .map(|spec| {
                let channels: Vec<ChannelId> = (next..).take(spec.channel_count).collect();
                next += spec.channel_count as ChannelId;
                (spec.name.clone(), channels)
            })
            .collect();
        Ok(Self { groups })
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[ChannelId])> {
        self.groups
            .iter()
            .map(|(name, channels)| (name.as_str(), channels.as_slice()))
    }

    pub fn condition_of(&self, channel: ChannelId) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, channels)| channels.contains(&channel))
            .map(|(name, _)| name.as_str())
    }

    pub fn channels(&self) -> Vec<ChannelId> {
        self.groups
            .iter()
            .flat_map(|(_, channels)| channels.iter().copied())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, channels)| channels.len()).sum()
    }
}

fn validate_conditions(conditions: &[ConditionSpec]) -> Result<()> {
    if conditions.is_empty() {
        return Err(EngineError::config("at least one condition is required"));
    }
    let mut seen = HashSet::new();
    for spec in conditions {
        if spec.name.trim().is_empty() {
            return Err(EngineError::config("condition names must not be empty"));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(EngineError::config(format!(
                "duplicate condition name: {}",
                spec.name
            )));
        }
        if spec.channel_count == 0 {
            return Err(EngineError::config(format!(
                "condition {} must have at least one channel",
                spec.name
            )));
        }
    }
    let total: usize = conditions.iter().map(|c| c.channel_count).sum();
    if total > CHANNELS_PER_MONITOR {
        return Err(EngineError::config(format!(
            "conditions use {} channels but a monitor has {}",
            total, CHANNELS_PER_MONITOR
        )));
    }
    Ok(())
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_clock_time(s: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| format!("Invalid time of day: {}. Use HH:MM", s))
}

fn de_clock_time<'de, D>(deserializer: D) -> std::result::Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_clock_time(&s).map_err(serde::de::Error::custom)
}

fn ser_clock_time<S>(time: &NaiveTime, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&time.format("%H:%M").to_string())
}

fn default_bout_kind() -> BoutKind {
    BoutKind::Sleep
}

fn default_actogram_bin() -> i64 {
    5
}

fn default_actogram_channels() -> ChannelSubset {
    ChannelSubset::Alive
}

/// Everything one analysis run depends on. Changing any field invalidates
/// every derived table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    pub date_range: DateRange,
    pub sampling_interval_minutes: i64,
    pub dead_threshold: i64,
    #[serde(deserialize_with = "de_clock_time", serialize_with = "ser_clock_time")]
    pub light_onset: NaiveTime,
    pub bin_size_minutes: i64,
    pub min_bout_length_minutes: i64,
    #[serde(default = "default_bout_kind")]
    pub bout_kind: BoutKind,
    pub conditions: Vec<ConditionSpec>,
    #[serde(default)]
    pub sleep_window_samples: Option<usize>,
    #[serde(default = "default_actogram_bin")]
    pub actogram_bin_minutes: i64,
    #[serde(default = "default_actogram_channels")]
    pub actogram_channels: ChannelSubset,
}

impl AnalysisParams {
    /// Loads a JSON parameter document. The result is not yet validated.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            EngineError::config(format!("cannot read parameters {}: {}", path.display(), e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.date_range.end < self.date_range.start {
            return Err(EngineError::config(format!(
                "date range ends ({}) before it starts ({})",
                self.date_range.end, self.date_range.start
            )));
        }
        if !(1..=60).contains(&self.sampling_interval_minutes) {
            return Err(EngineError::config(format!(
                "sampling interval must be 1 to 60 minutes, got {}",
                self.sampling_interval_minutes
            )));
        }
        if self.dead_threshold < 0 {
            return Err(EngineError::config(format!(
                "dead threshold must not be negative, got {}",
                self.dead_threshold
            )));
        }
        check_bin("bin size", self.bin_size_minutes)?;
        check_bin("actogram bin size", self.actogram_bin_minutes)?;
        if self.min_bout_length_minutes < 0 {
            return Err(EngineError::config(format!(
                "minimum bout length must not be negative, got {}",
                self.min_bout_length_minutes
            )));
        }
        if self.sleep_window_samples == Some(0) {
            return Err(EngineError::config("sleep window must span at least one sample"));
        }
        validate_conditions(&self.conditions)
    }

    pub fn layout(&self) -> Result<ConditionLayout> {
        ConditionLayout::new(&self.conditions)
    }

    /// Trailing window length in samples: an explicit override, otherwise
    /// enough samples to cover five minutes of inactivity.
    pub fn sleep_window(&self) -> usize {
        self.sleep_window_samples.unwrap_or_else(|| {
            let interval = self.sampling_interval_minutes.max(1);
            let samples = (SLEEP_INACTIVITY_MINUTES + interval - 1) / interval;
            samples.max(1) as usize
        })
    }
}

fn check_bin(what: &str, minutes: i64) -> Result<()> {
    if minutes <= 0 || minutes > MINUTES_PER_DAY {
        return Err(EngineError::config(format!(
            "{} must be between 1 and {} minutes, got {}",
            what, MINUTES_PER_DAY, minutes
        )));
    }
    Ok(())
}

/// Derive circadian sleep statistics from a DAM activity monitor file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Tab-delimited DAM monitor file
    #[arg(help = "Tab-delimited DAM monitor file")]
    pub input_path: PathBuf,

    /// JSON analysis parameters; when given, the analysis flags below are ignored
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Directory receiving the CSV tables
    #[arg(long, default_value = "results")]
    pub output_dir: PathBuf,

    /// First analysed date (format: YYYY-MM-DD), defaults to the first date in the file
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last analysed date, inclusive (format: YYYY-MM-DD), defaults to the last date in the file
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Monitor sampling interval in minutes
    #[arg(long, default_value = "1", allow_negative_numbers = true)]
    pub sampling_interval: i64,

    /// Daily count below which a channel is considered dead
    #[arg(long, default_value = "100", allow_negative_numbers = true)]
    pub dead_threshold: i64,

    /// Lights-on time of day (format: HH:MM), ZT0
    #[arg(long, default_value = "06:00", value_parser = parse_clock_time)]
    pub light_onset: NaiveTime,

    /// Width of the average sleep profile bins in minutes
    #[arg(long, default_value = "30", allow_negative_numbers = true)]
    pub bin_size: i64,

    /// Bouts shorter than this many minutes are dropped from bout summaries
    #[arg(long, default_value = "5", allow_negative_numbers = true)]
    pub min_bout_length: i64,

    /// Summarize sleep bouts or activity bouts
    #[arg(long, value_enum, default_value_t = BoutKind::Sleep)]
    pub bouts: BoutKind,

    /// Condition as NAME=CHANNELS, repeated in channel order (e.g. --condition wt=16 --condition mut=16)
    #[arg(long = "condition", default_value = "Condition 1=32")]
    pub conditions: Vec<ConditionSpec>,

    /// Override the sleep window length in samples (default spans five minutes)
    #[arg(long)]
    pub sleep_window: Option<usize>,

    /// Width of the actogram bins in minutes
    #[arg(long, default_value = "5", allow_negative_numbers = true)]
    pub actogram_bin: i64,

    /// Channels included in the actogram table
    #[arg(long, value_enum, default_value_t = ChannelSubset::Alive)]
    pub actogram_channels: ChannelSubset,
}

impl Args {
    /// Builds parameters from the flags, filling missing dates from `recorded`.
    pub fn analysis_params(&self, recorded: Option<DateRange>) -> Result<AnalysisParams> {
        let start = self.start_date.or(recorded.map(|r| r.start));
        let end = self.end_date.or(recorded.map(|r| r.end));
        let (Some(start), Some(end)) = (start, end) else {
            return Err(EngineError::config(
                "no date range given and the monitor file has no rows",
            ));
        };
        Ok(AnalysisParams {
            date_range: DateRange::new(start, end),
            sampling_interval_minutes: self.sampling_interval,
            dead_threshold: self.dead_threshold,
            light_onset: self.light_onset,
            bin_size_minutes: self.bin_size,
            min_bout_length_minutes: self.min_bout_length,
            bout_kind: self.bouts,
            conditions: self.conditions.clone(),
            sleep_window_samples: self.sleep_window,
            actogram_bin_minutes: self.actogram_bin,
            actogram_channels: self.actogram_channels,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn params() -> AnalysisParams {
        AnalysisParams {
            date_range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 2, 23).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 25).unwrap(),
            ),
            sampling_interval_minutes: 1,
            dead_threshold: 100,
            light_onset: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            bin_size_minutes: 30,
            min_bout_length_minutes: 5,
            bout_kind: BoutKind::Sleep,
            conditions: vec![ConditionSpec {
                name: "wt".to_string(),
                channel_count: 32,
            }],
            sleep_window_samples: None,
            actogram_bin_minutes: 5,
            actogram_channels: ChannelSubset::Alive,
        }
    }

    fn assert_config_error(params: &AnalysisParams) {
        assert!(matches!(
            params.validate(),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn default_params_are_valid() {
        params().validate().unwrap();
    }

    #[test]
    fn rejects_negative_dead_threshold() {
        let mut p = params();
        p.dead_threshold = -1;
        assert_config_error(&p);
    }

    #[test]
    fn rejects_non_positive_bin_size() {
        let mut p = params();
        p.bin_size_minutes = 0;
        assert_config_error(&p);
    }

    #[test]
    fn rejects_reversed_date_range() {
        let mut p = params();
        p.date_range = DateRange::new(p.date_range.end, p.date_range.start);
        assert_config_error(&p);
    }

    #[test]
    fn rejects_conditions_exceeding_monitor() {
        let mut p = params();
        p.conditions = vec![
            ConditionSpec {
                name: "wt".into(),
                channel_count: 20,
            },
            ConditionSpec {
                name: "mut".into(),
                channel_count: 13,
            },
        ];
        assert_config_error(&p);
    }

    #[test]
    fn layout_assigns_channels_consecutively() {
        let layout = ConditionLayout::new(&[
            "wt=3".parse().unwrap(),
            "mut=2".parse().unwrap(),
        ])
        .unwrap();
        assert_eq!(layout.condition_of(1), Some("wt"));
        assert_eq!(layout.condition_of(3), Some("wt"));
        assert_eq!(layout.condition_of(4), Some("mut"));
        assert_eq!(layout.condition_of(6), None);
        assert_eq!(layout.channels(), vec![1, 2, 3, 4, 5]);
        assert_eq!(layout.total(), 5);
    }

    #[test]
    fn condition_spec_parses_names_with_spaces() {
        let spec: ConditionSpec = "Condition 1=32".parse().unwrap();
        assert_eq!(spec.name, "Condition 1");
        assert_eq!(spec.channel_count, 32);
        assert!("wt".parse::<ConditionSpec>().is_err());
    }

    #[test]
    fn sleep_window_spans_five_minutes() {
        let mut p = params();
        assert_eq!(p.sleep_window(), 5);
        p.sampling_interval_minutes = 2;
        assert_eq!(p.sleep_window(), 3);
        p.sampling_interval_minutes = 30;
        assert_eq!(p.sleep_window(), 1);
        p.sleep_window_samples = Some(7);
        assert_eq!(p.sleep_window(), 7);
    }

    #[test]
    fn params_round_trip_through_json() {
        let p = params();
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"light_onset\":\"06:00\""));
        let back: AnalysisParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn clock_time_accepts_seconds() {
        assert_eq!(
            parse_clock_time("08:30:15").unwrap(),
            NaiveTime::from_hms_opt(8, 30, 15).unwrap()
        );
        assert!(parse_clock_time("8h").is_err());
    }
}
