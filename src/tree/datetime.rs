use std::fmt;

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::{Error, Result};

const NANOS_PER_SECOND: u32 = 1_000_000_000;
const MAX_OFFSET_MINUTES: i16 = 24 * 60 - 1;

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub(crate) fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Proleptic Gregorian calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalDate {
    year: u16,
    month: u8,
    day: u8,
}

impl LocalDate {
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self> {
        if year > 9999 {
            return Err(Error::invalid_value(format!("year {year} out of range")));
        }
        if !(1..=12).contains(&month) {
            return Err(Error::invalid_value(format!("month {month} out of range")));
        }
        if day == 0 || day > days_in_month(year, month) {
            return Err(Error::invalid_value(format!(
                "day {day} out of range for {year:04}-{month:02}"
            )));
        }
        Ok(Self { year, month, day })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn from_chrono(date: NaiveDate) -> Result<Self> {
        let year = u16::try_from(date.year())
            .map_err(|_| Error::invalid_value(format!("year {} out of range", date.year())))?;
        Self::new(year, date.month() as u8, date.day() as u8)
    }

    pub fn to_chrono(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }
}

impl fmt::Display for LocalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Wall-clock time with nanosecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalTime {
    hour: u8,
    minute: u8,
    second: u8,
    nanosecond: u32,
}

impl LocalTime {
    pub fn new(hour: u8, minute: u8, second: u8, nanosecond: u32) -> Result<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(Error::invalid_value(format!(
                "time {hour:02}:{minute:02}:{second:02} out of range"
            )));
        }
        if nanosecond >= NANOS_PER_SECOND {
            return Err(Error::invalid_value(format!(
                "nanosecond {nanosecond} out of range"
            )));
        }
        Ok(Self {
            hour,
            minute,
            second,
            nanosecond,
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    /// Full sub-second part, `0..1_000_000_000`.
    pub fn nanosecond(&self) -> u32 {
        self.nanosecond
    }

    pub fn from_chrono(time: NaiveTime) -> Result<Self> {
        Self::new(
            time.hour() as u8,
            time.minute() as u8,
            time.second() as u8,
            time.nanosecond(),
        )
    }

    pub fn to_chrono(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_nano_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
            self.nanosecond,
        )
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        let nanos = self.nanosecond;
        if nanos == 0 {
            Ok(())
        } else if nanos % 1_000_000 == 0 {
            write!(f, ".{:03}", nanos / 1_000_000)
        } else if nanos % 1_000 == 0 {
            write!(f, ".{:06}", nanos / 1_000)
        } else {
            write!(f, ".{nanos:09}")
        }
    }
}

/// Fixed UTC offset in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOffset {
    minutes: i16,
}

impl TimeOffset {
    pub const UTC: TimeOffset = TimeOffset { minutes: 0 };

    pub fn from_minutes(minutes: i16) -> Result<Self> {
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
            return Err(Error::invalid_value(format!(
                "offset of {minutes} minutes out of range"
            )));
        }
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> i16 {
        self.minutes
    }

    pub fn from_chrono(offset: FixedOffset) -> Result<Self> {
        let seconds = offset.local_minus_utc();
        if seconds % 60 != 0 {
            return Err(Error::invalid_value(
                "cannot represent a timezone offset with seconds",
            ));
        }
        Self::from_minutes((seconds / 60) as i16)
    }

    pub fn to_chrono(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(i32::from(self.minutes) * 60)
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes == 0 {
            return write!(f, "Z");
        }
        let sign = if self.minutes < 0 { '-' } else { '+' };
        let abs = self.minutes.unsigned_abs();
        write!(f, "{sign}{:02}:{:02}", abs / 60, abs % 60)
    }
}

/// Date and time, optionally pinned to a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    pub date: LocalDate,
    pub time: LocalTime,
    pub offset: Option<TimeOffset>,
}

impl DateTime {
    pub fn local(date: LocalDate, time: LocalTime) -> Self {
        Self {
            date,
            time,
            offset: None,
        }
    }

    pub fn with_offset(date: LocalDate, time: LocalTime, offset: TimeOffset) -> Self {
        Self {
            date,
            time,
            offset: Some(offset),
        }
    }

    pub fn from_naive(value: NaiveDateTime) -> Result<Self> {
        Ok(Self::local(
            LocalDate::from_chrono(value.date())?,
            LocalTime::from_chrono(value.time())?,
        ))
    }

    /// Local wall-clock part, ignoring any offset.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        Some(NaiveDateTime::new(
            self.date.to_chrono()?,
            self.time.to_chrono()?,
        ))
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}", self.date, self.time)?;
        if let Some(offset) = self.offset {
            write!(f, "{offset}")?;
        }
        Ok(())
    }
}
