//! Aggregation engine for plugin sales reports.
//!
//! [`ReportEngine`] turns the grouped sums exposed by a
//! [`SaleStore`](sales_core::store::SaleStore) into report shapes: totals,
//! per-plugin and per-customer breakdowns, and dense month-by-category grids.
//! Every monetary figure leaves the engine converted exactly once by the
//! current exchange rate.

mod engine;
mod grid;
pub mod model;

pub use engine::ReportEngine;
pub use grid::{MonthGrid, month_span};
pub use model::{
  LicenseRenewalTotals, Listing, MonthlySeries, MonthlyTotal, Summary, Totals,
};

#[cfg(test)]
mod tests;
