//! Candidacy creation ranges and monthly reporting periods.

use super::ReportDomainError;
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Half-open range `[start, end)` over candidacy creation timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    /// Creates a range from explicit bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ReportDomainError::EmptyDateRange`] when `start` is not
    /// before `end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ReportDomainError> {
        if start >= end {
            return Err(ReportDomainError::EmptyDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a range covering whole days from `first` through `last`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportDomainError::EmptyDateRange`] when `last` precedes
    /// `first`, or when `last` is the final representable date.
    pub fn from_days(first: NaiveDate, last: NaiveDate) -> Result<Self, ReportDomainError> {
        let start = first.and_time(NaiveTime::MIN);
        let end = last
            .succ_opt()
            .map(|day| day.and_time(NaiveTime::MIN))
            .ok_or(ReportDomainError::EmptyDateRange { start, end: start })?;
        Self::new(start, end)
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Returns whether `instant` falls inside the range.
    #[must_use]
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Returns the overlap of two ranges, if any.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        Self::new(start, end).ok()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A calendar month used to batch historical reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReportingPeriod {
    first_day: NaiveDate,
}

impl ReportingPeriod {
    /// Returns the month containing `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first_day: date.with_day(1).unwrap_or(date),
        }
    }

    /// Splits `range` into the calendar months it touches, each clipped to
    /// the range.
    #[must_use]
    pub fn monthly(range: &DateRange) -> Vec<(Self, DateRange)> {
        let mut periods = Vec::new();
        let mut period = Self::containing(range.start().date());
        while period.start() < range.end() {
            if let Some(clipped) = period.range().and_then(|whole| whole.intersect(range)) {
                periods.push((period, clipped));
            }
            let Some(next) = period.next() else {
                break;
            };
            period = next;
        }
        periods
    }

    /// First instant of the month.
    #[must_use]
    pub fn start(&self) -> NaiveDateTime {
        self.first_day.and_time(NaiveTime::MIN)
    }

    /// The whole month as a range.
    #[must_use]
    pub fn range(&self) -> Option<DateRange> {
        let end = self.next()?.start();
        DateRange::new(self.start(), end).ok()
    }

    /// Directory label, `YYYY-MM`.
    #[must_use]
    pub fn label(&self) -> String {
        self.first_day.format("%Y-%m").to_string()
    }

    fn next(&self) -> Option<Self> {
        self.first_day
            .checked_add_months(Months::new(1))
            .map(|first_day| Self { first_day })
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
