//! Report tests against an in-memory `SqliteStore`.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sales_core::{
  Error,
  plugin::{Plugin, PluginDirectory},
  query::ReportQuery,
  rate::FixedRate,
  sale::Sale,
  store::SaleStore,
};
use sales_store_sqlite::SqliteStore;

use crate::ReportEngine;

type Engine = ReportEngine<SqliteStore, SqliteStore, FixedRate>;

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
}

fn sale(
  id: i64,
  plugin_id: i64,
  renewal: bool,
  gross: f64,
  net: f64,
  when: DateTime<Utc>,
) -> Sale {
  Sale {
    sale_id: id,
    plugin_id,
    edition: "Standard".into(),
    renewal,
    gross_amount: gross,
    net_amount: net,
    customer: format!("buyer{id}@example.com"),
    date_sold: when,
  }
}

async fn store_with(plugins: &[(i64, &str)], sales: Vec<Sale>) -> SqliteStore {
  let store = SqliteStore::open_in_memory().await.unwrap();
  for (plugin_id, name) in plugins {
    store
      .register_plugin(Plugin { plugin_id: *plugin_id, name: (*name).into() })
      .await
      .unwrap();
  }
  for s in sales {
    store.upsert(s).await.unwrap();
  }
  store
}

fn engine(store: SqliteStore, rate: f64) -> Engine {
  ReportEngine::new(store.clone(), store, FixedRate(rate))
}

/// Plugin A has a license sale and a renewal sale in Jan 2024; plugin B has
/// none.
async fn two_sale_engine(rate: f64) -> Engine {
  let store = store_with(&[(1, "A"), (2, "B")], vec![
    sale(1, 1, false, 100.0, 90.0, at(2024, 1, 5)),
    sale(2, 1, true, 50.0, 45.0, at(2024, 1, 20)),
  ])
  .await;
  engine(store, rate)
}

fn all() -> ReportQuery { ReportQuery::default() }

// ─── Totals ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn totals_sum_gross_and_net() {
  let e = two_sale_engine(1.0).await;
  let totals = e.totals(&all()).await.unwrap();
  assert_eq!(totals.gross_amount, 150.0);
  assert_eq!(totals.net_amount, 135.0);
}

#[tokio::test]
async fn license_renewal_split() {
  let e = two_sale_engine(1.0).await;
  let split = e.license_renewal_totals(&all()).await.unwrap();
  assert_eq!(split.licenses, 100.0);
  assert_eq!(split.renewals, 50.0);
}

#[tokio::test]
async fn plugin_totals_include_plugins_without_sales() {
  let e = two_sale_engine(1.0).await;
  let totals = e.plugin_totals(&all()).await.unwrap();
  assert_eq!(totals.len(), 2);
  assert_eq!(totals["A"], 150.0);
  assert_eq!(totals["B"], 0.0);
}

#[tokio::test]
async fn empty_store_reports_zeros() {
  let e = engine(store_with(&[(1, "A")], vec![]).await, 1.0);
  let totals = e.totals(&all()).await.unwrap();
  assert_eq!(totals.gross_amount, 0.0);
  assert_eq!(totals.net_amount, 0.0);
  assert!(e.months(&all()).await.unwrap().is_empty());
  assert!(e.monthly_totals(&all()).await.unwrap().is_empty());

  let grid = e.monthly_plugin_totals(&all()).await.unwrap();
  assert!(grid.months.is_empty());
  assert!(grid.series["A"].is_empty());
}

#[tokio::test]
async fn unknown_plugin_gets_its_own_row() {
  let e = engine(
    store_with(&[(1, "A")], vec![
      sale(1, 1, false, 10.0, 9.0, at(2024, 3, 1)),
      sale(2, 7, false, 5.0, 4.0, at(2024, 3, 2)),
    ])
    .await,
    1.0,
  );
  let totals = e.plugin_totals(&all()).await.unwrap();
  assert_eq!(totals["A"], 10.0);
  assert_eq!(totals["plugin 7"], 5.0);
}

#[tokio::test]
async fn unknown_plugin_label_shared_with_a_directory_name_is_summed() {
  let e = engine(
    store_with(&[(3, "plugin 7")], vec![
      sale(1, 3, false, 10.0, 9.0, at(2024, 3, 1)),
      sale(2, 7, false, 5.0, 4.0, at(2024, 3, 2)),
    ])
    .await,
    1.0,
  );
  let totals = e.plugin_totals(&all()).await.unwrap();
  assert_eq!(totals.len(), 1);
  assert_eq!(totals["plugin 7"], 15.0);
}

// ─── Time series ─────────────────────────────────────────────────────────────

async fn spanning_engine() -> Engine {
  let store = store_with(&[(1, "A"), (2, "B")], vec![
    sale(1, 1, false, 10.0, 9.0, at(2023, 11, 10)),
    sale(2, 2, true, 20.0, 18.0, at(2024, 2, 2)),
    sale(3, 1, false, 5.0, 4.5, at(2024, 2, 27)),
  ])
  .await;
  engine(store, 1.0)
}

#[tokio::test]
async fn months_are_gap_free_across_years() {
  let e = spanning_engine().await;
  assert_eq!(e.months(&all()).await.unwrap(), [
    "Nov 2023", "Dec 2023", "Jan 2024", "Feb 2024"
  ]);
}

#[tokio::test]
async fn monthly_totals_skip_empty_months() {
  let e = spanning_engine().await;
  let rows = e.monthly_totals(&all()).await.unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!((rows[0].year, rows[0].month, rows[0].count), (2023, 11, 1));
  assert_eq!((rows[1].year, rows[1].month, rows[1].count), (2024, 2, 2));
  assert_eq!(rows[1].gross_amount, 25.0);
  assert_eq!(rows[1].net_amount, 22.5);
}

#[tokio::test]
async fn monthly_plugin_grid_is_rectangular_and_zero_filled() {
  let e = spanning_engine().await;
  let grid = e.monthly_plugin_totals(&all()).await.unwrap();
  assert_eq!(grid.months.len(), 4);
  assert_eq!(grid.series["A"], [10.0, 0.0, 0.0, 5.0]);
  assert_eq!(grid.series["B"], [0.0, 0.0, 0.0, 20.0]);
}

#[tokio::test]
async fn monthly_license_renewal_grid_has_both_categories() {
  let e = spanning_engine().await;
  let grid = e.monthly_license_renewal_totals(&all()).await.unwrap();
  assert_eq!(grid.series.len(), 2);
  assert_eq!(grid.series["licenses"], [10.0, 0.0, 0.0, 5.0]);
  assert_eq!(grid.series["renewals"], [0.0, 0.0, 0.0, 20.0]);
}

#[tokio::test]
async fn date_range_narrows_the_span() {
  let e = spanning_engine().await;
  let query = ReportQuery {
    start: NaiveDate::from_ymd_opt(2024, 1, 1),
    end: NaiveDate::from_ymd_opt(2024, 2, 27),
    ..all()
  };
  assert_eq!(e.months(&query).await.unwrap(), ["Feb 2024"]);
  assert_eq!(e.totals(&query).await.unwrap().gross_amount, 25.0);
}

// ─── Conversion ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn rate_is_applied_exactly_once() {
  let e = two_sale_engine(2.0).await;
  assert_eq!(e.totals(&all()).await.unwrap().gross_amount, 300.0);
  assert_eq!(e.plugin_totals(&all()).await.unwrap()["A"], 300.0);

  let rows = e.sales_data(&all()).await.unwrap();
  let gross: f64 = rows.iter().map(|r| r.sale.gross_amount).sum();
  assert_eq!(gross, 300.0);

  let customers = e.customers_data(&all()).await.unwrap();
  let gross: f64 = customers.iter().map(|c| c.gross_amount).sum();
  assert_eq!(gross, 300.0);
}

#[tokio::test]
async fn invalid_rate_is_an_exchange_rate_error() {
  let e = two_sale_engine(-1.0).await;
  assert!(matches!(e.totals(&all()).await, Err(Error::ExchangeRate(_))));
}

// ─── Listings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sales_count_matches_unpaginated_data() {
  let e = spanning_engine().await;
  let query = ReportQuery { search: Some("buyer2@".into()), ..all() };
  let data = e.sales_data(&query).await.unwrap();
  assert_eq!(data.len(), 1);
  assert_eq!(e.sales_count(&query).await.unwrap(), data.len() as u64);
  assert_eq!(data[0].name.as_deref(), Some("B"));
}

#[tokio::test]
async fn sales_listing_paginates_with_full_count() {
  let e = spanning_engine().await;
  let query = ReportQuery { limit: Some(1), offset: Some(1), ..all() };
  let listing = e.sales(&query).await.unwrap();
  assert_eq!(listing.count, 3);
  assert_eq!(listing.data.len(), 1);
  // Default order is newest first, so the second row is sale 2.
  assert_eq!(listing.data[0].sale.sale_id, 2);
}

#[tokio::test]
async fn customers_listing_counts_groups() {
  let store = store_with(&[(1, "A")], vec![
    Sale {
      customer: "same@example.com".into(),
      ..sale(1, 1, false, 10.0, 9.0, at(2024, 1, 1))
    },
    Sale {
      customer: "same@example.com".into(),
      ..sale(2, 1, false, 15.0, 13.0, at(2024, 1, 2))
    },
    sale(3, 1, false, 40.0, 36.0, at(2024, 1, 3)),
  ])
  .await;
  let e = engine(store, 1.0);

  let listing = e.customers(&all()).await.unwrap();
  assert_eq!(listing.count, 2);
  // Highest gross first by default.
  assert_eq!(listing.data[0].customer, "buyer3@example.com");
  assert_eq!(listing.data[1].customer, "same@example.com");
  assert_eq!(listing.data[1].count, 2);
  assert_eq!(listing.data[1].gross_amount, 25.0);
}

#[tokio::test]
async fn unknown_sort_field_is_a_query_error() {
  let e = two_sale_engine(1.0).await;
  let query = ReportQuery { order_by: Some("nonsense".into()), ..all() };
  assert!(matches!(e.sales_data(&query).await, Err(Error::Query(_))));
}

#[tokio::test]
async fn reversed_dates_are_a_query_error() {
  let e = two_sale_engine(1.0).await;
  let query = ReportQuery {
    start: NaiveDate::from_ymd_opt(2024, 2, 1),
    end: NaiveDate::from_ymd_opt(2024, 1, 1),
    ..all()
  };
  assert!(matches!(e.totals(&query).await, Err(Error::Query(_))));
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn summary_agrees_with_individual_reports() {
  let e = spanning_engine().await;
  let summary = e.summary(&all()).await.unwrap();

  assert_eq!(summary.exchange_rate, 1.0);
  assert_eq!(summary.totals, e.totals(&all()).await.unwrap());
  assert_eq!(summary.plugin_totals, e.plugin_totals(&all()).await.unwrap());
  assert_eq!(summary.months, e.months(&all()).await.unwrap());
  assert_eq!(
    summary.monthly_plugin_totals,
    e.monthly_plugin_totals(&all()).await.unwrap().series
  );
  assert_eq!(
    summary.license_renewal_totals,
    e.license_renewal_totals(&all()).await.unwrap()
  );

  let json = serde_json::to_value(&summary).unwrap();
  assert!(json.get("monthlyLicenseRenewalTotals").is_some());
}
