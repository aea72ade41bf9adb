//! The `SaleStore` trait and its grouped-aggregate types.
//!
//! The trait is implemented by storage backends (e.g. `sales-store-sqlite`).
//! Ingestion writes through it; the report engine only reads.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  month::YearMonth,
  query::{CustomerField, Page, SaleField, SaleFilter, Sort},
  sale::{Sale, SaleRow, UpsertOutcome},
};

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// The dimensions a grouped aggregate query can be keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
  /// A single row over every matching sale.
  Total,
  Customer,
  Plugin,
  Renewal,
  Month,
  MonthAndPlugin,
  MonthAndRenewal,
}

impl Grouping {
  pub fn by_month(self) -> bool {
    matches!(self, Self::Month | Self::MonthAndPlugin | Self::MonthAndRenewal)
  }
}

/// One row of a grouped aggregate. Only the key fields selected by the
/// [`Grouping`] are populated. Sums are rounded to cents by the store and
/// are still in the source currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotals {
  pub customer:     Option<String>,
  pub plugin_id:    Option<i64>,
  /// Joined plugin name; `None` when grouped by plugin but the plugin is
  /// unknown to the directory.
  pub plugin_name:  Option<String>,
  pub renewal:      Option<bool>,
  pub month:        Option<YearMonth>,
  pub count:        u64,
  pub gross_amount: f64,
  pub net_amount:   f64,
}

/// Per-customer sums for the customer listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerTotals {
  pub customer:     String,
  pub count:        u64,
  pub gross_amount: f64,
  pub net_amount:   f64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the persisted collection of sales.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SaleStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert `sale`, or update the row with the same `sale_id`. No other row
  /// is touched.
  fn upsert(
    &self,
    sale: Sale,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Total number of stored sales, unfiltered.
  fn count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Retrieve a sale by its remote id. Returns `None` if not found.
  fn get(
    &self,
    sale_id: i64,
  ) -> impl Future<Output = Result<Option<Sale>, Self::Error>> + Send + '_;

  /// Filtered, sorted, paginated sales joined with their plugin name.
  fn list_sales<'a>(
    &'a self,
    filter: &'a SaleFilter,
    sort: Sort<SaleField>,
    page: Page,
  ) -> impl Future<Output = Result<Vec<SaleRow>, Self::Error>> + Send + 'a;

  /// Number of sales matching `filter`, ignoring pagination.
  fn count_sales<'a>(
    &'a self,
    filter: &'a SaleFilter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Grouped sums over sales matching `filter`. Month groupings are
  /// returned in chronological order. [`Grouping::Total`] always yields
  /// exactly one row, zero-valued when nothing matches.
  fn aggregate<'a>(
    &'a self,
    filter: &'a SaleFilter,
    grouping: Grouping,
  ) -> impl Future<Output = Result<Vec<GroupTotals>, Self::Error>> + Send + 'a;

  /// Sales grouped by customer. A search term additionally has to match the
  /// customer identifier itself.
  fn list_customers<'a>(
    &'a self,
    filter: &'a SaleFilter,
    sort: Sort<CustomerField>,
    page: Page,
  ) -> impl Future<Output = Result<Vec<CustomerTotals>, Self::Error>> + Send + 'a;

  /// Number of customer groups [`SaleStore::list_customers`] would return
  /// without pagination.
  fn count_customers<'a>(
    &'a self,
    filter: &'a SaleFilter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}
