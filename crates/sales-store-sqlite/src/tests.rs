//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, TimeZone, Utc};
use sales_core::{
  month::YearMonth,
  plugin::{Plugin, PluginDirectory},
  query::{
    CustomerField, Page, SaleField, SaleFilter, Sort, SortOrder,
  },
  sale::{Sale, UpsertOutcome},
  store::{Grouping, SaleStore},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn sale(id: i64, plugin_id: i64, gross: f64, when: DateTime<Utc>) -> Sale {
  Sale {
    sale_id:      id,
    plugin_id,
    edition:      "Standard".into(),
    renewal:      false,
    gross_amount: gross,
    net_amount:   gross * 0.8,
    customer:     format!("customer{id}@example.com"),
    date_sold:    when,
  }
}

/// Two plugins, four sales spread over Nov 2023 – Feb 2024.
async fn seeded() -> SqliteStore {
  let s = store().await;
  s.register_plugin(Plugin { plugin_id: 1, name: "Blitz".into() })
    .await
    .unwrap();
  s.register_plugin(Plugin { plugin_id: 2, name: "Campaign".into() })
    .await
    .unwrap();

  let mut a = sale(10, 1, 100.0, at(2023, 11, 3));
  a.customer = "alice@example.com".into();
  let mut b = sale(11, 2, 50.0, at(2023, 11, 20));
  b.customer = "bob@example.com".into();
  b.renewal = true;
  b.edition = "Pro".into();
  let mut c = sale(12, 1, 30.0, at(2024, 2, 14));
  c.customer = "alice@example.com".into();
  c.renewal = true;
  let mut d = sale(13, 2, 20.0, at(2024, 2, 28));
  d.customer = "carol@example.com".into();
  d.edition = "Pro".into();

  for x in [a, b, c, d] {
    s.upsert(x).await.unwrap();
  }
  s
}

fn newest_first() -> Sort<SaleField> {
  Sort { field: SaleField::DateSold, order: SortOrder::Desc }
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_inserts_then_updates() {
  let s = store().await;
  let mut x = sale(1, 1, 10.0, at(2024, 1, 1));

  assert_eq!(s.upsert(x.clone()).await.unwrap(), UpsertOutcome::Inserted);
  assert_eq!(s.count().await.unwrap(), 1);

  x.gross_amount = 12.5;
  x.edition = "Pro".into();
  assert_eq!(s.upsert(x.clone()).await.unwrap(), UpsertOutcome::Updated);
  assert_eq!(s.count().await.unwrap(), 1);

  let stored = s.get(1).await.unwrap().unwrap();
  assert_eq!(stored, x);
}

#[tokio::test]
async fn upsert_leaves_other_rows_alone() {
  let s = store().await;
  let first = sale(1, 1, 10.0, at(2024, 1, 1));
  let second = sale(2, 1, 20.0, at(2024, 1, 2));
  s.upsert(first.clone()).await.unwrap();
  s.upsert(second.clone()).await.unwrap();

  let mut changed = second.clone();
  changed.net_amount = 1.0;
  s.upsert(changed).await.unwrap();

  assert_eq!(s.get(1).await.unwrap().unwrap(), first);
  assert_eq!(s.count().await.unwrap(), 2);
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get(404).await.unwrap().is_none());
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_joins_plugin_name_and_sorts() {
  let s = seeded().await;
  let rows = s
    .list_sales(&SaleFilter::default(), newest_first(), Page::ALL)
    .await
    .unwrap();

  let ids: Vec<_> = rows.iter().map(|r| r.sale.sale_id).collect();
  assert_eq!(ids, [13, 12, 11, 10]);
  assert_eq!(rows[0].name.as_deref(), Some("Campaign"));
  assert_eq!(rows[1].name.as_deref(), Some("Blitz"));
}

#[tokio::test]
async fn list_sorts_by_plugin_name() {
  let s = seeded().await;
  let sort = Sort { field: SaleField::Name, order: SortOrder::Asc };
  let rows = s
    .list_sales(&SaleFilter::default(), sort, Page::ALL)
    .await
    .unwrap();
  let names: Vec<_> = rows.iter().filter_map(|r| r.name.clone()).collect();
  assert_eq!(names, ["Blitz", "Blitz", "Campaign", "Campaign"]);
}

#[tokio::test]
async fn unknown_plugin_has_no_name() {
  let s = store().await;
  s.upsert(sale(1, 99, 5.0, at(2024, 1, 1))).await.unwrap();
  let rows = s
    .list_sales(&SaleFilter::default(), newest_first(), Page::ALL)
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert!(rows[0].name.is_none());
}

#[tokio::test]
async fn date_range_is_inclusive() {
  let s = seeded().await;
  let filter = SaleFilter {
    sold_from: Some(at(2023, 11, 20)),
    sold_until: Some(at(2024, 2, 14)),
    ..Default::default()
  };
  let rows = s.list_sales(&filter, newest_first(), Page::ALL).await.unwrap();
  let ids: Vec<_> = rows.iter().map(|r| r.sale.sale_id).collect();
  assert_eq!(ids, [12, 11]);
}

#[tokio::test]
async fn customer_filter_is_exact() {
  let s = seeded().await;
  let filter = SaleFilter {
    customer: Some("alice@example.com".into()),
    ..Default::default()
  };
  assert_eq!(s.count_sales(&filter).await.unwrap(), 2);

  let partial = SaleFilter {
    customer: Some("alice".into()),
    ..Default::default()
  };
  assert_eq!(s.count_sales(&partial).await.unwrap(), 0);
}

#[tokio::test]
async fn search_matches_name_edition_and_customer() {
  let s = seeded().await;
  let by = |term: &str| SaleFilter {
    search: Some(term.into()),
    ..Default::default()
  };

  assert_eq!(s.count_sales(&by("blitz")).await.unwrap(), 2);
  assert_eq!(s.count_sales(&by("Pro")).await.unwrap(), 2);
  assert_eq!(s.count_sales(&by("carol")).await.unwrap(), 1);
  assert_eq!(s.count_sales(&by("nothing-like-this")).await.unwrap(), 0);
}

#[tokio::test]
async fn search_ignores_customer_column_when_customer_is_fixed() {
  let s = seeded().await;
  let filter = SaleFilter {
    customer: Some("alice@example.com".into()),
    search: Some("alice".into()),
    ..Default::default()
  };
  assert_eq!(s.count_sales(&filter).await.unwrap(), 0);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
  let s = seeded().await;
  let filter = SaleFilter { search: Some("%".into()), ..Default::default() };
  assert_eq!(s.count_sales(&filter).await.unwrap(), 0);
}

#[tokio::test]
async fn pagination_and_count_agree() {
  let s = seeded().await;
  let filter = SaleFilter::default();

  let all = s.list_sales(&filter, newest_first(), Page::ALL).await.unwrap();
  assert_eq!(all.len() as u64, s.count_sales(&filter).await.unwrap());

  let page = Page { offset: Some(1), limit: Some(2) };
  let rows = s.list_sales(&filter, newest_first(), page).await.unwrap();
  let ids: Vec<_> = rows.iter().map(|r| r.sale.sale_id).collect();
  assert_eq!(ids, [12, 11]);

  let offset_only = Page { offset: Some(3), limit: None };
  let rows = s.list_sales(&filter, newest_first(), offset_only).await.unwrap();
  assert_eq!(rows.len(), 1);
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn total_on_empty_store_is_one_zero_row() {
  let s = store().await;
  let rows = s
    .aggregate(&SaleFilter::default(), Grouping::Total)
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].count, 0);
  assert_eq!(rows[0].gross_amount, 0.0);
  assert_eq!(rows[0].net_amount, 0.0);
}

#[tokio::test]
async fn total_sums_are_rounded_to_cents() {
  let s = store().await;
  for (id, gross) in [(1, 1.111), (2, 2.222), (3, 3.333)] {
    let mut x = sale(id, 1, gross, at(2024, 1, 1));
    x.net_amount = 0.001;
    s.upsert(x).await.unwrap();
  }
  let rows = s
    .aggregate(&SaleFilter::default(), Grouping::Total)
    .await
    .unwrap();
  assert_eq!(rows[0].count, 3);
  assert_eq!(rows[0].gross_amount, 6.67);
  assert_eq!(rows[0].net_amount, 0.0);
}

#[tokio::test]
async fn renewal_grouping_splits_amounts() {
  let s = seeded().await;
  let rows = s
    .aggregate(&SaleFilter::default(), Grouping::Renewal)
    .await
    .unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0].renewal, Some(false));
  assert_eq!(rows[0].gross_amount, 120.0);
  assert_eq!(rows[1].renewal, Some(true));
  assert_eq!(rows[1].gross_amount, 80.0);
}

#[tokio::test]
async fn plugin_grouping_carries_names() {
  let s = seeded().await;
  let rows = s
    .aggregate(&SaleFilter::default(), Grouping::Plugin)
    .await
    .unwrap();
  let pairs: Vec<_> = rows
    .iter()
    .map(|r| (r.plugin_name.clone().unwrap(), r.gross_amount))
    .collect();
  assert_eq!(pairs, [("Blitz".to_owned(), 130.0), ("Campaign".to_owned(), 70.0)]);
}

#[tokio::test]
async fn month_grouping_is_sparse_and_chronological() {
  let s = seeded().await;
  let rows = s
    .aggregate(&SaleFilter::default(), Grouping::Month)
    .await
    .unwrap();
  let months: Vec<_> = rows.iter().map(|r| r.month.unwrap()).collect();
  assert_eq!(months, [
    YearMonth::new(2023, 11).unwrap(),
    YearMonth::new(2024, 2).unwrap(),
  ]);
  assert_eq!(rows[0].count, 2);
  assert_eq!(rows[0].gross_amount, 150.0);
  assert_eq!(rows[1].net_amount, 40.0);
}

#[tokio::test]
async fn month_and_renewal_grouping() {
  let s = seeded().await;
  let rows = s
    .aggregate(&SaleFilter::default(), Grouping::MonthAndRenewal)
    .await
    .unwrap();
  assert_eq!(rows.len(), 4);
  assert!(rows.iter().all(|r| r.month.is_some() && r.renewal.is_some()));
  assert!(rows.iter().all(|r| r.plugin_id.is_none() && r.customer.is_none()));
}

#[tokio::test]
async fn aggregates_respect_filters() {
  let s = seeded().await;
  let filter = SaleFilter {
    search: Some("Pro".into()),
    ..Default::default()
  };
  let rows = s.aggregate(&filter, Grouping::Total).await.unwrap();
  assert_eq!(rows[0].count, 2);
  assert_eq!(rows[0].gross_amount, 70.0);
}

// ─── Customers ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn customers_are_grouped_and_sorted() {
  let s = seeded().await;
  let sort = Sort { field: CustomerField::GrossAmount, order: SortOrder::Desc };
  let rows = s
    .list_customers(&SaleFilter::default(), sort, Page::ALL)
    .await
    .unwrap();

  assert_eq!(rows.len(), 3);
  assert_eq!(rows[0].customer, "alice@example.com");
  assert_eq!(rows[0].count, 2);
  assert_eq!(rows[0].gross_amount, 130.0);
  assert_eq!(s.count_customers(&SaleFilter::default()).await.unwrap(), 3);
}

#[tokio::test]
async fn customer_search_must_match_customer() {
  let s = seeded().await;
  // "Pro" matches editions but no customer identifier.
  let filter = SaleFilter { search: Some("Pro".into()), ..Default::default() };
  assert_eq!(s.count_customers(&filter).await.unwrap(), 0);

  let filter = SaleFilter { search: Some("bob".into()), ..Default::default() };
  let sort = Sort { field: CustomerField::Customer, order: SortOrder::Asc };
  let rows = s.list_customers(&filter, sort, Page::ALL).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].customer, "bob@example.com");
}

// ─── Plugin directory ────────────────────────────────────────────────────────

#[tokio::test]
async fn plugin_names_are_sorted_and_renamable() {
  let s = store().await;
  s.register_plugin(Plugin { plugin_id: 2, name: "Zeta".into() })
    .await
    .unwrap();
  s.register_plugin(Plugin { plugin_id: 1, name: "Alpha".into() })
    .await
    .unwrap();
  assert_eq!(s.plugin_names().await.unwrap(), ["Alpha", "Zeta"]);

  s.register_plugin(Plugin { plugin_id: 2, name: "Beta".into() })
    .await
    .unwrap();
  assert_eq!(s.plugin_names().await.unwrap(), ["Alpha", "Beta"]);
}
