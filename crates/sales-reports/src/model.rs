//! Report shapes returned to callers. All amounts are already converted into
//! the reporting currency and rounded to cents.

use std::collections::BTreeMap;

use sales_core::{
  rate::Conversion,
  sale::{LICENSES, RENEWALS},
  store::GroupTotals,
};
use serde::{Deserialize, Serialize};

/// Gross and net sums over every matching sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
  pub gross_amount: f64,
  pub net_amount:   f64,
}

impl Totals {
  /// Sum the rows and convert once. An empty slice yields zeros.
  pub fn from_rows(rows: &[GroupTotals], conversion: &Conversion) -> Self {
    let (gross, net) = rows.iter().fold((0.0, 0.0), |(g, n), row| {
      (g + row.gross_amount, n + row.net_amount)
    });
    Self {
      gross_amount: conversion.apply(gross),
      net_amount:   conversion.apply(net),
    }
  }
}

/// Gross sums split by the renewal flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LicenseRenewalTotals {
  pub licenses: f64,
  pub renewals: f64,
}

impl LicenseRenewalTotals {
  pub fn from_rows(rows: &[GroupTotals], conversion: &Conversion) -> Self {
    let (licenses, renewals) =
      rows.iter().fold((0.0, 0.0), |(l, r), row| match row.renewal {
        Some(true) => (l, r + row.gross_amount),
        _ => (l + row.gross_amount, r),
      });
    Self {
      licenses: conversion.apply(licenses),
      renewals: conversion.apply(renewals),
    }
  }

  /// The same figures keyed by category label.
  pub fn as_map(&self) -> BTreeMap<String, f64> {
    BTreeMap::from([
      (LICENSES.to_owned(), self.licenses),
      (RENEWALS.to_owned(), self.renewals),
    ])
  }
}

/// One calendar month that had at least one sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
  pub year:         i32,
  pub month:        u32,
  pub count:        u64,
  pub gross_amount: f64,
  pub net_amount:   f64,
}

/// A dense category × month table; every row has one cell per entry of
/// `months`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
  /// Month labels, e.g. `"Nov 2023"`, gap-free and ascending.
  pub months: Vec<String>,
  pub series: BTreeMap<String, Vec<f64>>,
}

/// A page of listing rows together with the unpaginated row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing<T> {
  pub count: u64,
  pub data:  Vec<T>,
}

/// Every dashboard figure computed under a single exchange rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
  pub exchange_rate:                  f64,
  pub totals:                         Totals,
  pub plugin_totals:                  BTreeMap<String, f64>,
  pub license_renewal_totals:         LicenseRenewalTotals,
  pub months:                         Vec<String>,
  pub monthly_plugin_totals:          BTreeMap<String, Vec<f64>>,
  pub monthly_license_renewal_totals: BTreeMap<String, Vec<f64>>,
}
