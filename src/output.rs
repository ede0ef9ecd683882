use crate::aggregate::{
    BoutRecord, ChannelBoutStats, ChannelDayActivity, ConditionActivity, ConditionBoutSummary,
    ConditionSleep, DailyActivity, DailyBoutStats, IndividualSleep, IndividualSleepSummary,
    ProfileBin, SleepTimepoint,
};
use crate::actogram::ActogramBin;
use crate::config::ConditionLayout;
use crate::pipeline::AnalysisReport;
use crate::viability::{Viability, ViabilityReport};
use crate::{ChannelId, Result};
use chrono::{NaiveDate, NaiveTime};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Text for a statistic that could not be computed.
pub const MISSING: &str = "N/A";

/// A row of one flat output table.
pub trait CsvRow {
    fn header() -> &'static [&'static str];
    fn fields(&self) -> Vec<String>;
}

fn num(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

fn date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn time(t: NaiveTime) -> String {
    t.format("%H:%M:%S").to_string()
}

pub fn write_table<R: CsvRow, W: Write>(writer: W, rows: &[R]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(R::header())?;
    for row in rows {
        writer.write_record(row.fields())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv<R: CsvRow>(path: &Path, rows: &[R]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_table(file, rows)
}

#[derive(Debug, Clone)]
pub struct ViabilityRow {
    pub channel: ChannelId,
    pub condition: String,
    pub status: Viability,
    pub min_daily_total: Option<u64>,
}

pub fn viability_rows(viability: &ViabilityReport, layout: &ConditionLayout) -> Vec<ViabilityRow> {
    viability
        .channels()
        .iter()
        .filter_map(|c| {
            Some(ViabilityRow {
                channel: c.channel,
                condition: layout.condition_of(c.channel)?.to_string(),
                status: c.viability,
                min_daily_total: c.min_daily_total(),
            })
        })
        .collect()
}

impl CsvRow for ViabilityRow {
    fn header() -> &'static [&'static str] {
        &["channel", "condition", "status", "min_daily_total"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.channel.to_string(),
            self.condition.clone(),
            self.status.to_string(),
            self.min_daily_total
                .map_or_else(|| MISSING.to_string(), |t| t.to_string()),
        ]
    }
}

impl CsvRow for ConditionActivity {
    fn header() -> &'static [&'static str] {
        &[
            "condition",
            "day_or_night",
            "mean",
            "SD",
            "SEM",
            "n_alive",
            "n_dead",
            "n_total",
            "status",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.condition.clone(),
            self.scope.to_string(),
            num(self.summary.mean),
            num(self.summary.sd),
            num(self.summary.sem),
            self.n_alive.to_string(),
            self.n_dead.to_string(),
            self.n_total.to_string(),
            self.status.to_string(),
        ]
    }
}

impl CsvRow for ChannelDayActivity {
    fn header() -> &'static [&'static str] {
        &["date", "channel", "mean", "sum", "SD", "SEM"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            date(self.date),
            self.channel.to_string(),
            num(self.summary.mean),
            self.summary.sum.to_string(),
            num(self.summary.sd),
            num(self.summary.sem),
        ]
    }
}

impl CsvRow for DailyActivity {
    fn header() -> &'static [&'static str] {
        &["date", "condition", "mean", "sum", "SD", "SEM", "n"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            date(self.date),
            self.condition.clone(),
            num(self.summary.mean),
            self.summary.sum.to_string(),
            num(self.summary.sd),
            num(self.summary.sem),
            self.summary.n.to_string(),
        ]
    }
}

impl CsvRow for ProfileBin {
    fn header() -> &'static [&'static str] {
        &["bin_start_minutes", "zt_time", "condition", "mean", "SEM"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.bin_start_minutes.to_string(),
            time(self.zt),
            self.condition.clone(),
            num(self.summary.mean),
            num(self.summary.sem),
        ]
    }
}

impl CsvRow for IndividualSleep {
    fn header() -> &'static [&'static str] {
        &["channel", "condition", "day_or_night", "mean_sleep_per_individual"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.channel.to_string(),
            self.condition.clone(),
            self.phase.to_string(),
            num(self.mean_sleep),
        ]
    }
}

impl CsvRow for IndividualSleepSummary {
    fn header() -> &'static [&'static str] {
        &[
            "channel",
            "condition",
            "day_sleep_per_30min",
            "night_sleep_per_30min",
            "total_sleep_hours_per_day",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.channel.to_string(),
            self.condition.clone(),
            num(self.day_sleep_per_30min),
            num(self.night_sleep_per_30min),
            num(self.total_sleep_hours_per_day),
        ]
    }
}

impl CsvRow for ConditionSleep {
    fn header() -> &'static [&'static str] {
        &["condition", "day_or_night", "mean", "SD", "SEM", "n"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.condition.clone(),
            self.phase.to_string(),
            num(self.summary.mean),
            num(self.summary.sd),
            num(self.summary.sem),
            self.summary.n.to_string(),
        ]
    }
}

impl CsvRow for SleepTimepoint {
    fn header() -> &'static [&'static str] {
        &["date", "time", "condition", "mean", "SEM", "n"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            date(self.timestamp.date()),
            time(self.timestamp.time()),
            self.condition.clone(),
            num(self.summary.mean),
            num(self.summary.sem),
            self.summary.n.to_string(),
        ]
    }
}

impl CsvRow for BoutRecord {
    fn header() -> &'static [&'static str] {
        &[
            "channel",
            "condition",
            "date",
            "start_time",
            "zt_start",
            "day_or_night",
            "state_value",
            "duration_minutes",
        ]
    }

    fn fields(&self) -> Vec<String> {
        let bout = &self.bout;
        vec![
            bout.channel.to_string(),
            self.condition.clone(),
            date(bout.start.date()),
            time(bout.start.time()),
            time(bout.zt_start.zt),
            bout.phase().to_string(),
            bout.state.value().to_string(),
            bout.duration_minutes().to_string(),
        ]
    }
}

impl CsvRow for DailyBoutStats {
    fn header() -> &'static [&'static str] {
        &[
            "channel",
            "condition",
            "date",
            "day_or_night",
            "bout_count",
            "total_minutes",
            "mean_minutes",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.channel.to_string(),
            self.condition.clone(),
            date(self.date),
            self.phase.to_string(),
            self.bout_count.to_string(),
            self.total_minutes.to_string(),
            self.mean_minutes.to_string(),
        ]
    }
}

impl CsvRow for ChannelBoutStats {
    fn header() -> &'static [&'static str] {
        &[
            "channel",
            "condition",
            "day_or_night",
            "days",
            "mean_bout_count",
            "mean_bout_minutes",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.channel.to_string(),
            self.condition.clone(),
            self.phase.to_string(),
            self.days.to_string(),
            self.mean_bout_count.to_string(),
            self.mean_bout_minutes.to_string(),
        ]
    }
}

impl CsvRow for ConditionBoutSummary {
    fn header() -> &'static [&'static str] {
        &[
            "condition",
            "day_or_night",
            "bout_count_mean",
            "bout_count_SD",
            "bout_count_SEM",
            "bout_minutes_mean",
            "bout_minutes_SD",
            "bout_minutes_SEM",
            "n",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.condition.clone(),
            self.phase.to_string(),
            num(self.bout_count.mean),
            num(self.bout_count.sd),
            num(self.bout_count.sem),
            num(self.bout_minutes.mean),
            num(self.bout_minutes.sd),
            num(self.bout_minutes.sem),
            self.bout_count.n.to_string(),
        ]
    }
}

impl CsvRow for ActogramBin {
    fn header() -> &'static [&'static str] {
        &[
            "date",
            "condition",
            "bin_start_minutes",
            "zt_time",
            "mean",
            "median",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            date(self.date),
            self.condition.clone(),
            self.bin_start_minutes.to_string(),
            time(self.zt),
            num(self.mean),
            num(self.median),
        ]
    }
}

/// Writes every table of `report` as `<prefix>_<table>.csv` under `dir`,
/// creating it if needed. Returns the written paths.
pub fn write_report(dir: &Path, prefix: &str, report: &AnalysisReport) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    let mut path_for = |name: &str| -> PathBuf {
        let path = dir.join(format!("{}_{}.csv", prefix, name));
        info!("Writing {}", path.display());
        written.push(path.clone());
        path
    };

    write_csv(
        &path_for("viability"),
        &viability_rows(&report.viability, &report.layout),
    )?;
    write_csv(&path_for("condition_summary"), &report.condition_activity)?;
    write_csv(&path_for("channel_daily_activity"), &report.channel_day_activity)?;
    write_csv(&path_for("daily_activity"), &report.daily_activity)?;
    write_csv(&path_for("sleep_profile"), &report.sleep_profile)?;
    write_csv(&path_for("individual_sleep"), &report.individual_sleep)?;
    write_csv(
        &path_for("individual_sleep_summary"),
        &report.individual_sleep_summary,
    )?;
    write_csv(&path_for("sleep_by_condition"), &report.sleep_by_condition)?;
    write_csv(&path_for("sleep_timeline"), &report.sleep_timeline)?;
    write_csv(&path_for("bouts"), &report.bout_table)?;
    write_csv(&path_for("bouts_by_day"), &report.bouts_by_day)?;
    write_csv(&path_for("bouts_by_channel"), &report.bouts_by_channel)?;
    write_csv(&path_for("bout_summary"), &report.bouts_by_condition)?;
    write_csv(&path_for("actogram"), &report.actogram)?;

    Ok(written)
}
