//! Calendar months used as the period axis of monthly reports.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Label format for months in reports, e.g. `"Nov 2023"`.
pub const MONTH_FORMAT: &str = "%b %Y";

/// A calendar month. Ordering is chronological.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
pub struct YearMonth {
  pub year:  i32,
  /// 1-based month number.
  pub month: u32,
}

impl YearMonth {
  /// Returns `None` when `month` is outside `1..=12`.
  pub fn new(year: i32, month: u32) -> Option<Self> {
    NaiveDate::from_ymd_opt(year, month, 1).map(Self::from_date)
  }

  /// The month containing `date`.
  pub fn from_date(date: NaiveDate) -> Self {
    Self { year: date.year(), month: date.month() }
  }

  pub fn first_day(self) -> NaiveDate {
    NaiveDate::from_ymd_opt(self.year, self.month, 1)
      .unwrap_or(NaiveDate::MIN)
  }

  /// The following calendar month; December rolls over into January.
  pub fn succ(self) -> Self {
    self
      .first_day()
      .checked_add_months(Months::new(1))
      .map(Self::from_date)
      .unwrap_or(self)
  }

  pub fn label(self) -> String {
    self.first_day().format(MONTH_FORMAT).to_string()
  }

  /// Every month from `first` through `last`, inclusive. Empty if
  /// `first > last`.
  pub fn range(first: Self, last: Self) -> Vec<Self> {
    let mut months = Vec::new();
    let mut current = first;
    while current <= last {
      months.push(current);
      let next = current.succ();
      if next == current {
        break;
      }
      current = next;
    }
    months
  }
}

impl fmt::Display for YearMonth {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.label())
  }
}
