//! Report query parameters and their validated forms.
//!
//! A [`ReportQuery`] arrives as loosely-typed input (sort fields are plain
//! strings). It is validated into a [`SaleFilter`], a [`Sort`], and a
//! [`Page`] before any store query runs, so an unknown field is rejected
//! with [`Error::Query`] instead of being silently ignored.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

// ─── Raw parameters ──────────────────────────────────────────────────────────

/// The shared parameter set accepted by every report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportQuery {
  /// First day included (from `00:00:00` UTC).
  pub start:    Option<NaiveDate>,
  /// Last day included (through `23:59:59` UTC).
  pub end:      Option<NaiveDate>,
  /// Exact purchaser identifier.
  pub customer: Option<String>,
  /// Substring matched against plugin name, edition, and customer.
  pub search:   Option<String>,
  /// Field name to order by, e.g. `dateSold` or `grossAmount`.
  pub order_by: Option<String>,
  /// `asc` or `desc`.
  pub sort_by:  Option<String>,
  pub offset:   Option<u64>,
  pub limit:    Option<u64>,
}

impl ReportQuery {
  /// The validated row filter. Empty strings are treated as absent.
  pub fn filter(&self) -> Result<SaleFilter> {
    if let (Some(start), Some(end)) = (self.start, self.end)
      && start > end
    {
      return Err(Error::Query(format!(
        "start date {start} is after end date {end}"
      )));
    }

    Ok(SaleFilter {
      sold_from:  self.start.map(start_of_day),
      sold_until: self.end.map(end_of_day),
      customer:   non_empty(&self.customer),
      search:     non_empty(&self.search),
    })
  }

  /// Ordering for raw sale listings; defaults to newest first.
  pub fn sale_sort(&self) -> Result<Sort<SaleField>> {
    self.sort(SaleField::DateSold)
  }

  /// Ordering for the per-customer listing; defaults to highest gross first.
  pub fn customer_sort(&self) -> Result<Sort<CustomerField>> {
    self.sort(CustomerField::GrossAmount)
  }

  pub fn page(&self) -> Page {
    Page { offset: self.offset, limit: self.limit }
  }

  fn sort<F>(&self, default_field: F) -> Result<Sort<F>>
  where
    F: FromStr,
  {
    let field = match non_empty(&self.order_by) {
      Some(name) => F::from_str(&name)
        .map_err(|_| Error::Query(format!("cannot order by {name:?}")))?,
      None => default_field,
    };
    let order = match non_empty(&self.sort_by) {
      Some(dir) => SortOrder::from_str(&dir)
        .map_err(|_| Error::Query(format!("unknown sort direction {dir:?}")))?,
      None => SortOrder::Desc,
    };
    Ok(Sort { field, order })
  }
}

fn non_empty(value: &Option<String>) -> Option<String> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
  date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
  let last_second =
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
  date.and_time(last_second).and_utc()
}

// ─── Validated parts ─────────────────────────────────────────────────────────

/// Row filter applied identically by every report before grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilter {
  pub sold_from:  Option<DateTime<Utc>>,
  pub sold_until: Option<DateTime<Utc>>,
  pub customer:   Option<String>,
  pub search:     Option<String>,
}

impl SaleFilter {
  /// The same filter without the exact-customer condition.
  pub fn without_customer(&self) -> Self {
    Self { customer: None, ..self.clone() }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

/// Columns a sale listing can be ordered by.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString,
  AsRefStr, Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SaleField {
  SaleId,
  PluginId,
  /// The joined plugin name.
  Name,
  Edition,
  Renewal,
  GrossAmount,
  NetAmount,
  #[strum(to_string = "customer", serialize = "email")]
  Customer,
  DateSold,
}

/// Columns the per-customer listing can be ordered by.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString,
  AsRefStr, Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum CustomerField {
  Customer,
  Count,
  GrossAmount,
  NetAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
  pub field: F,
  pub order: SortOrder,
}

/// Offset/limit pagination; `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
  pub offset: Option<u64>,
  pub limit:  Option<u64>,
}

impl Page {
  pub const ALL: Page = Page { offset: None, limit: None };
}
