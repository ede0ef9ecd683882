//! Zeitgeber time mapping.
//!
//! ZT0 is lights-on; the photoperiod is a fixed 12 hours of light followed by
//! 12 hours of dark, so every clock time maps to exactly one ZT in
//! `[0, 24h)` and one [`LightPhase`].

use crate::LightPhase;
use chrono::{NaiveDateTime, NaiveTime, Timelike};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
const PHOTOPERIOD_SECONDS: i64 = 12 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeitgeberTime {
    /// Time since lights-on, wrapped to a time of day.
    pub zt: NaiveTime,
    pub phase: LightPhase,
}

impl ZeitgeberTime {
    pub fn minutes(&self) -> u32 {
        self.zt.num_seconds_from_midnight() / 60
    }
}

/// Light schedule anchored at a configurable lights-on time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircadianClock {
    light_onset: NaiveTime,
}

impl CircadianClock {
    pub fn new(light_onset: NaiveTime) -> Self {
        Self { light_onset }
    }

    pub fn light_onset(&self) -> NaiveTime {
        self.light_onset
    }

    pub fn map_time(&self, time_of_day: NaiveTime) -> ZeitgeberTime {
        let since_onset = i64::from(time_of_day.num_seconds_from_midnight())
            - i64::from(self.light_onset.num_seconds_from_midnight());
        let zt_seconds = since_onset.rem_euclid(SECONDS_PER_DAY);
        let phase = if zt_seconds < PHOTOPERIOD_SECONDS {
            LightPhase::Day
        } else {
            LightPhase::Night
        };
        ZeitgeberTime {
            // rem_euclid keeps this inside one day
            zt: NaiveTime::from_num_seconds_from_midnight_opt(zt_seconds as u32, 0)
                .unwrap_or(NaiveTime::MIN),
            phase,
        }
    }

    pub fn map(&self, ts: NaiveDateTime) -> ZeitgeberTime {
        self.map_time(ts.time())
    }

    pub fn phase(&self, ts: NaiveDateTime) -> LightPhase {
        self.map(ts).phase
    }

    /// ZT of a clock minute-of-day, used to label profile bins.
    pub fn zt_of_minute(&self, minute_of_day: u32) -> ZeitgeberTime {
        let time = NaiveTime::from_num_seconds_from_midnight_opt((minute_of_day % 1440) * 60, 0)
            .unwrap_or(NaiveTime::MIN);
        self.map_time(time)
    }
}
