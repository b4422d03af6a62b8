//! Inclusive calendar date ranges and the window they may fall in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format accepted from URL parameters and request bodies.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised while building or checking a [`DateRange`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateRangeError {
    #[error("start date {start} is after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("invalid {field} date '{value}': expected YYYY-MM-DD")]
    Unparseable { field: &'static str, value: String },

    #[error("range {start}..={end} is outside the supported window {earliest}..={latest}")]
    OutOfBounds {
        start: NaiveDate,
        end: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },
}

pub(crate) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Inclusive `[start, end]` pair of calendar dates.
///
/// The only way to obtain one is through [`DateRange::new`] (or a parser
/// that calls it), so `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = DateRangeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one day.
    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Parse optional `start`/`end` strings, falling back to `fallback` for
    /// whichever side is missing or blank.
    pub fn parse(
        start: Option<&str>,
        end: Option<&str>,
        fallback: &DateRange,
    ) -> Result<Self, DateRangeError> {
        let start = parse_side("start", start)?.unwrap_or(fallback.start);
        let end = parse_side("end", end)?.unwrap_or(fallback.end);
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days in the range, both endpoints included.
    pub fn num_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Every calendar day in the range, in increasing order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.num_days())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

fn parse_side(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, DateRangeError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(Some)
            .map_err(|_| DateRangeError::Unparseable {
                field,
                value: value.to_string(),
            }),
    }
}

/// Supported window for generated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBounds {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl Default for DateBounds {
    fn default() -> Self {
        Self {
            earliest: ymd(2024, 1, 1),
            latest: ymd(2025, 5, 31),
        }
    }
}

impl DateBounds {
    pub fn new(earliest: NaiveDate, latest: NaiveDate) -> Result<Self, DateRangeError> {
        DateRange::new(earliest, latest)?;
        Ok(Self { earliest, latest })
    }

    /// The full window as a range; used when the caller supplies no dates.
    pub fn full_range(&self) -> DateRange {
        DateRange {
            start: self.earliest.min(self.latest),
            end: self.latest.max(self.earliest),
        }
    }

    pub fn check(&self, range: &DateRange) -> Result<(), DateRangeError> {
        if range.start < self.earliest || range.end > self.latest {
            return Err(DateRangeError::OutOfBounds {
                start: range.start,
                end: range.end,
                earliest: self.earliest,
                latest: self.latest,
            });
        }
        Ok(())
    }
}
