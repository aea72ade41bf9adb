//! [`ReportEngine`]: report entry points over a sale store, a plugin
//! directory, and an exchange-rate provider.

use std::collections::BTreeMap;

use sales_core::{
  Error, Result,
  plugin::PluginDirectory,
  query::{ReportQuery, SaleFilter},
  rate::{Conversion, ExchangeRateProvider},
  sale::{LICENSES, RENEWALS, SaleRow, category_for},
  store::{CustomerTotals, GroupTotals, Grouping, SaleStore},
};

use crate::{
  grid::{MonthGrid, month_span},
  model::{
    LicenseRenewalTotals, Listing, MonthlySeries, MonthlyTotal, Summary,
    Totals,
  },
};

/// Computes every report from three collaborators.
///
/// Each call validates its [`ReportQuery`] first, fetches the exchange rate
/// once, then runs its store queries. The engine holds no state of its own.
#[derive(Debug, Clone)]
pub struct ReportEngine<S, D, R> {
  store:   S,
  plugins: D,
  rates:   R,
}

impl<S, D, R> ReportEngine<S, D, R>
where
  S: SaleStore,
  D: PluginDirectory,
  R: ExchangeRateProvider,
{
  pub fn new(store: S, plugins: D, rates: R) -> Self {
    Self { store, plugins, rates }
  }

  pub fn store(&self) -> &S { &self.store }

  // ── Totals ────────────────────────────────────────────────────────────────

  /// Gross and net sums; zero-valued when nothing matches.
  pub async fn totals(&self, query: &ReportQuery) -> Result<Totals> {
    let filter = query.filter()?;
    let conversion = self.conversion().await?;
    let rows = self.aggregate(&filter, Grouping::Total).await?;
    Ok(Totals::from_rows(&rows, &conversion))
  }

  /// Gross sum per plugin name, including every directory plugin without
  /// sales (as `0`).
  pub async fn plugin_totals(
    &self,
    query: &ReportQuery,
  ) -> Result<BTreeMap<String, f64>> {
    let filter = query.filter()?;
    let conversion = self.conversion().await?;
    let names = self.plugin_names().await?;
    let rows = self.aggregate(&filter, Grouping::Plugin).await?;
    Ok(plugin_totals(names, &rows, &conversion))
  }

  pub async fn license_renewal_totals(
    &self,
    query: &ReportQuery,
  ) -> Result<LicenseRenewalTotals> {
    let filter = query.filter()?;
    let conversion = self.conversion().await?;
    let rows = self.aggregate(&filter, Grouping::Renewal).await?;
    Ok(LicenseRenewalTotals::from_rows(&rows, &conversion))
  }

  // ── Time series ───────────────────────────────────────────────────────────

  /// Gap-free month labels from the first through the last month with a
  /// matching sale. Empty when nothing matches.
  pub async fn months(&self, query: &ReportQuery) -> Result<Vec<String>> {
    let filter = query.filter()?;
    let rows = self.aggregate(&filter, Grouping::Month).await?;
    Ok(month_span(&rows).into_iter().map(|m| m.label()).collect())
  }

  /// Sums per calendar month, only for months with at least one sale.
  pub async fn monthly_totals(
    &self,
    query: &ReportQuery,
  ) -> Result<Vec<MonthlyTotal>> {
    let filter = query.filter()?;
    let conversion = self.conversion().await?;
    let rows = self.aggregate(&filter, Grouping::Month).await?;

    Ok(
      rows
        .into_iter()
        .filter_map(|row| {
          let month = row.month?;
          Some(MonthlyTotal {
            year:         month.year,
            month:        month.month,
            count:        row.count,
            gross_amount: conversion.apply(row.gross_amount),
            net_amount:   conversion.apply(row.net_amount),
          })
        })
        .collect(),
    )
  }

  /// Gross sums per plugin per month, zero-filled over every directory
  /// plugin and every month in the span.
  pub async fn monthly_plugin_totals(
    &self,
    query: &ReportQuery,
  ) -> Result<MonthlySeries> {
    let filter = query.filter()?;
    let conversion = self.conversion().await?;
    let names = self.plugin_names().await?;
    let rows = self.aggregate(&filter, Grouping::MonthAndPlugin).await?;
    Ok(plugin_grid(names, &rows).into_series(&conversion))
  }

  /// Gross sums per license/renewal category per month, zero-filled.
  pub async fn monthly_license_renewal_totals(
    &self,
    query: &ReportQuery,
  ) -> Result<MonthlySeries> {
    let filter = query.filter()?;
    let conversion = self.conversion().await?;
    let rows = self.aggregate(&filter, Grouping::MonthAndRenewal).await?;
    Ok(license_renewal_grid(&rows).into_series(&conversion))
  }

  // ── Listings ──────────────────────────────────────────────────────────────

  /// Sorted, paginated, searchable sales joined with their plugin name.
  pub async fn sales_data(&self, query: &ReportQuery) -> Result<Vec<SaleRow>> {
    let filter = query.filter()?;
    let sort = query.sale_sort()?;
    let conversion = self.conversion().await?;

    let mut rows = self
      .store
      .list_sales(&filter, sort, query.page())
      .await
      .map_err(Error::store)?;
    for row in &mut rows {
      row.sale.gross_amount = conversion.apply(row.sale.gross_amount);
      row.sale.net_amount = conversion.apply(row.sale.net_amount);
    }
    Ok(rows)
  }

  pub async fn sales_count(&self, query: &ReportQuery) -> Result<u64> {
    let filter = query.filter()?;
    self.store.count_sales(&filter).await.map_err(Error::store)
  }

  /// `sales_data` and `sales_count` for the same query.
  pub async fn sales(&self, query: &ReportQuery) -> Result<Listing<SaleRow>> {
    let data = self.sales_data(query).await?;
    let count = self.sales_count(query).await?;
    Ok(Listing { count, data })
  }

  /// Per-customer sums. The exact-customer filter does not apply here; a
  /// search term must also match the customer identifier.
  pub async fn customers_data(
    &self,
    query: &ReportQuery,
  ) -> Result<Vec<CustomerTotals>> {
    let filter = query.filter()?.without_customer();
    let sort = query.customer_sort()?;
    let conversion = self.conversion().await?;

    let mut rows = self
      .store
      .list_customers(&filter, sort, query.page())
      .await
      .map_err(Error::store)?;
    for row in &mut rows {
      row.gross_amount = conversion.apply(row.gross_amount);
      row.net_amount = conversion.apply(row.net_amount);
    }
    Ok(rows)
  }

  pub async fn customers_count(&self, query: &ReportQuery) -> Result<u64> {
    let filter = query.filter()?.without_customer();
    self.store.count_customers(&filter).await.map_err(Error::store)
  }

  pub async fn customers(
    &self,
    query: &ReportQuery,
  ) -> Result<Listing<CustomerTotals>> {
    let data = self.customers_data(query).await?;
    let count = self.customers_count(query).await?;
    Ok(Listing { count, data })
  }

  // ── Dashboard ─────────────────────────────────────────────────────────────

  /// Every dashboard figure under a single exchange-rate fetch.
  pub async fn summary(&self, query: &ReportQuery) -> Result<Summary> {
    let filter = query.filter()?;
    let conversion = self.conversion().await?;
    let names = self.plugin_names().await?;

    let total = self.aggregate(&filter, Grouping::Total).await?;
    let by_plugin = self.aggregate(&filter, Grouping::Plugin).await?;
    let by_renewal = self.aggregate(&filter, Grouping::Renewal).await?;
    let by_month_plugin =
      self.aggregate(&filter, Grouping::MonthAndPlugin).await?;
    let by_month_renewal =
      self.aggregate(&filter, Grouping::MonthAndRenewal).await?;

    let plugin_series =
      plugin_grid(names.clone(), &by_month_plugin).into_series(&conversion);
    let renewal_series =
      license_renewal_grid(&by_month_renewal).into_series(&conversion);

    Ok(Summary {
      exchange_rate: conversion.rate(),
      totals: Totals::from_rows(&total, &conversion),
      plugin_totals: plugin_totals(names, &by_plugin, &conversion),
      license_renewal_totals: LicenseRenewalTotals::from_rows(
        &by_renewal,
        &conversion,
      ),
      months: renewal_series.months,
      monthly_plugin_totals: plugin_series.series,
      monthly_license_renewal_totals: renewal_series.series,
    })
  }

  // ── Collaborators ─────────────────────────────────────────────────────────

  async fn conversion(&self) -> Result<Conversion> {
    Conversion::current(&self.rates).await
  }

  async fn plugin_names(&self) -> Result<Vec<String>> {
    self.plugins.plugin_names().await.map_err(Error::store)
  }

  async fn aggregate(
    &self,
    filter: &SaleFilter,
    grouping: Grouping,
  ) -> Result<Vec<GroupTotals>> {
    self.store.aggregate(filter, grouping).await.map_err(Error::store)
  }
}

// ─── Builders ────────────────────────────────────────────────────────────────

/// Display name for a plugin-grouped row.
///
/// Plugins missing from the directory are labelled `plugin <id>`. A directory
/// plugin that is literally named that way shares the label, and the two
/// rows are summed into one entry.
fn plugin_label(row: &GroupTotals) -> String {
  match (&row.plugin_name, row.plugin_id) {
    (Some(name), _) => name.clone(),
    (None, Some(id)) => format!("plugin {id}"),
    (None, None) => "unknown plugin".to_owned(),
  }
}

fn plugin_totals(
  names: Vec<String>,
  rows: &[GroupTotals],
  conversion: &Conversion,
) -> BTreeMap<String, f64> {
  let mut raw: BTreeMap<String, f64> =
    names.into_iter().map(|name| (name, 0.0)).collect();
  for row in rows {
    *raw.entry(plugin_label(row)).or_insert(0.0) += row.gross_amount;
  }
  raw
    .into_iter()
    .map(|(name, amount)| (name, conversion.apply(amount)))
    .collect()
}

fn plugin_grid(names: Vec<String>, rows: &[GroupTotals]) -> MonthGrid {
  let mut grid = MonthGrid::new(month_span(rows), names);
  for row in rows {
    if let Some(month) = row.month {
      grid.add(&plugin_label(row), month, row.gross_amount);
    }
  }
  grid
}

fn license_renewal_grid(rows: &[GroupTotals]) -> MonthGrid {
  let mut grid = MonthGrid::new(month_span(rows), [LICENSES, RENEWALS]);
  for row in rows {
    if let Some(month) = row.month {
      let category = category_for(row.renewal.unwrap_or(false));
      grid.add(category, month, row.gross_amount);
    }
  }
  grid
}
