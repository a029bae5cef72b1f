//! Monthly feed periods and inclusive period ranges.
//!
//! EDGAR publishes one XBRL RSS feed per calendar month. A [`PeriodRange`]
//! walks every month between two `(year, month)` pairs, both ends included,
//! by converting each pair to an absolute month index so that ranges cross
//! year boundaries without special cases.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A calendar month identifying one monthly feed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[display("{year}-{month:02}")]
pub struct Period {
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1 through 12
    pub month: u32,
}

impl Period {
    /// Create a period from a year and a 1-indexed month.
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Absolute month index, `12 * year + month - 1`.
    pub const fn index(&self) -> i64 {
        month_index(self.year, self.month as i64)
    }

    /// Period for an absolute month index.
    pub const fn from_index(index: i64) -> Self {
        Self {
            year: index.div_euclid(12) as i32,
            month: (index.rem_euclid(12) + 1) as u32,
        }
    }
}

const fn month_index(year: i32, month: i64) -> i64 {
    12 * year as i64 + month - 1
}

/// Inclusive range of monthly periods.
///
/// Months are not validated: a month outside `1..=12` shifts the range
/// arithmetically, so `(2016, 13)` denotes January 2017.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    first: i64,
    last: i64,
}

impl PeriodRange {
    /// Range from `(from_year, from_month)` to `(to_year, to_month)`, inclusive.
    ///
    /// # Example
    /// ```
    /// use edgar_rss::period::{Period, PeriodRange};
    ///
    /// let periods: Vec<Period> = PeriodRange::new(2016, 2017, 11, 2).iter().collect();
    /// assert_eq!(periods.len(), 4);
    /// assert_eq!(periods[0], Period::new(2016, 11));
    /// assert_eq!(periods[3], Period::new(2017, 2));
    /// ```
    pub const fn new(from_year: i32, to_year: i32, from_month: i32, to_month: i32) -> Self {
        Self {
            first: month_index(from_year, from_month as i64),
            last: month_index(to_year, to_month as i64),
        }
    }

    /// First period of the range.
    pub const fn first(&self) -> Period {
        Period::from_index(self.first)
    }

    /// Last period of the range.
    pub const fn last(&self) -> Period {
        Period::from_index(self.last)
    }

    /// Number of periods in the range; zero when the start is after the end.
    pub const fn len(&self) -> usize {
        if self.last < self.first {
            0
        } else {
            (self.last - self.first + 1) as usize
        }
    }

    /// Returns true if the range contains no periods.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the periods in chronological order. The range itself is not
    /// consumed, so it can be iterated again.
    pub const fn iter(&self) -> PeriodIter {
        PeriodIter {
            next: self.first,
            last: self.last,
        }
    }
}

impl IntoIterator for PeriodRange {
    type Item = Period;
    type IntoIter = PeriodIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &PeriodRange {
    type Item = Period;
    type IntoIter = PeriodIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the periods of a [`PeriodRange`].
#[derive(Debug, Clone)]
pub struct PeriodIter {
    next: i64,
    last: i64,
}

impl Iterator for PeriodIter {
    type Item = Period;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.last {
            return None;
        }
        let period = Period::from_index(self.next);
        self.next += 1;
        Some(period)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next > self.last {
            0
        } else {
            (self.last - self.next + 1) as usize
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PeriodIter {}

impl std::iter::FusedIterator for PeriodIter {}
