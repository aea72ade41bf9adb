//! Month spans and zero-filled category × month grids.
//!
//! Grouped queries only return (category, month) pairs that had sales. A
//! [`MonthGrid`] starts as a fully zeroed table over every category and every
//! month in the span, then the sparse rows are overlaid by key lookup, so the
//! result is always rectangular.

use std::collections::{BTreeMap, HashMap};

use sales_core::{month::YearMonth, rate::Conversion, store::GroupTotals};

use crate::model::MonthlySeries;

/// Every calendar month from the earliest through the latest month present
/// in `rows`, inclusive. Empty when no row carries a month.
pub fn month_span(rows: &[GroupTotals]) -> Vec<YearMonth> {
  let mut months = rows.iter().filter_map(|row| row.month);
  let Some(first) = months.next() else {
    return Vec::new();
  };
  let (first, last) = months.fold((first, first), |(lo, hi), m| {
    (lo.min(m), hi.max(m))
  });
  YearMonth::range(first, last)
}

/// A category × month table of raw (unconverted) sums.
#[derive(Debug, Clone)]
pub struct MonthGrid {
  months: Vec<YearMonth>,
  index:  HashMap<YearMonth, usize>,
  cells:  BTreeMap<String, Vec<f64>>,
}

impl MonthGrid {
  /// A zeroed grid with one row per category and one column per month.
  pub fn new<I, C>(months: Vec<YearMonth>, categories: I) -> Self
  where
    I: IntoIterator<Item = C>,
    C: Into<String>,
  {
    let index = months.iter().enumerate().map(|(i, m)| (*m, i)).collect();
    let width = months.len();
    let cells = categories
      .into_iter()
      .map(|c| (c.into(), vec![0.0; width]))
      .collect();
    Self { months, index, cells }
  }

  /// Add `amount` to a cell. A category not seen before gets its own zeroed
  /// row; a month outside the span is ignored.
  pub fn add(&mut self, category: &str, month: YearMonth, amount: f64) {
    let Some(&col) = self.index.get(&month) else {
      tracing::warn!(%month, category, "grouped row outside month span");
      return;
    };
    let width = self.months.len();
    let row = self
      .cells
      .entry(category.to_owned())
      .or_insert_with(|| vec![0.0; width]);
    row[col] += amount;
  }

  pub fn months(&self) -> &[YearMonth] { &self.months }

  /// Convert every cell once and label the columns.
  pub fn into_series(self, conversion: &Conversion) -> MonthlySeries {
    MonthlySeries {
      months: self.months.iter().map(|m| m.label()).collect(),
      series: self
        .cells
        .into_iter()
        .map(|(category, row)| {
          (category, row.into_iter().map(|v| conversion.apply(v)).collect())
        })
        .collect(),
    }
  }
}
