//! MS-DOS date and time fields.

use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, Timelike};

/// Packed DOS timestamp. Two-second resolution, local time, 1980..=2107.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    const MIN_YEAR: i32 = 1980;
    const MAX_YEAR: i32 = 2107;

    /// Convert a file timestamp, in the local time zone.
    pub fn from_system_time(time: SystemTime) -> Self {
        let local: DateTime<Local> = time.into();
        Self::from_naive(local.naive_local())
    }

    /// Pack a wall-clock time, clamping it into the representable range.
    pub fn from_naive(dt: NaiveDateTime) -> Self {
        let dt = if dt.year() < Self::MIN_YEAR {
            Self::bound(Self::MIN_YEAR, 1, 1, 0, 0, 0).unwrap_or(dt)
        } else if dt.year() > Self::MAX_YEAR {
            Self::bound(Self::MAX_YEAR, 12, 31, 23, 59, 58).unwrap_or(dt)
        } else {
            dt
        };

        let year = (dt.year() - Self::MIN_YEAR).clamp(0, 127) as u16;
        let date = (year << 9) | ((dt.month() as u16) << 5) | dt.day() as u16;
        let time =
            ((dt.hour() as u16) << 11) | ((dt.minute() as u16) << 5) | (dt.second() as u16 / 2);

        Self { time, date }
    }

    fn bound(year: i32, month: u32, day: u32, h: u32, m: u32, s: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(h, m, s)
    }
}
