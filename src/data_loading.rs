use crate::config::DateRange;
use crate::{EngineError, Recording, Result, CHANNELS_PER_MONITOR};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// DAM export date and time formats, e.g. `23 Feb 24` and `11:03:00`.
const DATE_FORMAT: &str = "%d %b %y";
const TIME_FORMAT: &str = "%H:%M:%S";

/// One parsed line of a DAM monitor file.
#[derive(Debug, Clone)]
pub struct MonitorRow {
    pub line: usize,
    pub timestamp: NaiveDateTime,
    pub monitor_number: u32,
    pub light_sensor: i64,
    pub counts: [u32; CHANNELS_PER_MONITOR],
}

fn field<'a>(record: &'a csv::StringRecord, idx: usize, line: usize) -> Result<&'a str> {
    record
        .get(idx)
        .ok_or_else(|| EngineError::malformed(line, format!("missing field {}", idx + 1)))
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str, line: usize) -> Result<T> {
    value
        .parse()
        .map_err(|_| EngineError::malformed(line, format!("{} is not a valid number: {:?}", what, value)))
}

fn parse_row(record: &csv::StringRecord, line: usize) -> Result<MonitorRow> {
    // Leading metadata is 9 fields, or 10 when the export keeps its spare column.
    let leading = match record.len().checked_sub(CHANNELS_PER_MONITOR) {
        Some(n @ (9 | 10)) => n,
        _ => {
            return Err(EngineError::malformed(
                line,
                format!(
                    "expected {} or {} fields, found {}",
                    9 + CHANNELS_PER_MONITOR,
                    10 + CHANNELS_PER_MONITOR,
                    record.len()
                ),
            ))
        }
    };
    let offset = leading - 9;

    let date_str = field(record, 1, line)?;
    let time_str = field(record, 2, line)?;
    let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT)
        .map_err(|e| EngineError::malformed(line, format!("bad date {:?}: {}", date_str, e)))?;
    let time = NaiveTime::parse_from_str(time_str, TIME_FORMAT)
        .map_err(|e| EngineError::malformed(line, format!("bad time {:?}: {}", time_str, e)))?;

    let mut counts = [0u32; CHANNELS_PER_MONITOR];
    for (channel, count) in counts.iter_mut().enumerate() {
        let value = field(record, leading + channel, line)?;
        *count = parse_number(value, &format!("count for channel {}", channel + 1), line)?;
    }

    Ok(MonitorRow {
        line,
        timestamp: NaiveDateTime::new(date, time),
        monitor_number: parse_number(field(record, 5 + offset, line)?, "monitor number", line)?,
        light_sensor: parse_number(field(record, 8 + offset, line)?, "light sensor", line)?,
        counts,
    })
}

/// Parses every row of a tab-delimited DAM monitor export. Any unparsable
/// row aborts the read.
pub fn read_monitor_rows<R: Read>(reader: R) -> Result<Vec<MonitorRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true) // row width is checked per record
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for result in rdr.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 1);
        rows.push(parse_row(&record, line)?);
    }

    debug!("Parsed {} monitor rows", rows.len());
    Ok(rows)
}

pub fn read_monitor_file(path: &Path) -> Result<Vec<MonitorRow>> {
    info!("Reading monitor file {}", path.display());
    let file = File::open(path)?;
    read_monitor_rows(BufReader::new(file))
}

/// Calendar span of the rows, if any.
pub fn recorded_range(rows: &[MonitorRow]) -> Option<DateRange> {
    let first = rows.first()?.timestamp.date();
    let last = rows.last()?.timestamp.date();
    Some(DateRange::new(first, last))
}

/// Smallest positive spacing between consecutive rows.
pub fn detect_interval(rows: &[MonitorRow]) -> Option<Duration> {
    rows.windows(2)
        .map(|pair| pair[1].timestamp - pair[0].timestamp)
        .filter(|d| *d > Duration::zero())
        .min()
}

/// Builds the canonical recording: rows must be strictly increasing, rows
/// outside `range` are dropped, and the kept rows must be spaced exactly
/// `interval_minutes` apart.
pub fn normalize(rows: &[MonitorRow], range: DateRange, interval_minutes: i64) -> Result<Recording> {
    for pair in rows.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(EngineError::malformed(
                pair[1].line,
                format!(
                    "timestamp {} does not follow {}",
                    pair[1].timestamp, pair[0].timestamp
                ),
            ));
        }
    }

    let interval = Duration::minutes(interval_minutes);
    let kept: Vec<&MonitorRow> = rows.iter().filter(|r| range.contains(r.timestamp)).collect();

    for pair in kept.windows(2) {
        let step = pair[1].timestamp - pair[0].timestamp;
        if step != interval {
            return Err(EngineError::malformed(
                pair[1].line,
                format!(
                    "expected {} minute spacing but {} follows {}",
                    interval_minutes, pair[1].timestamp, pair[0].timestamp
                ),
            ));
        }
    }

    info!(
        "Kept {} of {} rows between {} and {}",
        kept.len(),
        rows.len(),
        range.start,
        range.end
    );

    let monitor_number = kept.first().map(|r| r.monitor_number);
    Ok(Recording::new(
        monitor_number,
        interval,
        kept.iter().map(|r| r.timestamp).collect(),
        kept.iter().map(|r| r.counts).collect(),
    ))
}
