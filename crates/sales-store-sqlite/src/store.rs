//! [`SqliteStore`]: the SQLite implementation of [`SaleStore`] and
//! [`PluginDirectory`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, params_from_iter, types::Value};
use sales_core::{
  plugin::{Plugin, PluginDirectory},
  query::{CustomerField, Page, SaleField, SaleFilter, Sort},
  sale::{Sale, SaleRow, UpsertOutcome},
  store::{CustomerTotals, GroupTotals, Grouping, SaleStore},
};

use crate::{
  Result,
  encode::{RawGroup, RawSale, customer_totals_from_row, decode_count, encode_dt},
  filter::{
    FROM_SALES, QueryBuilder, apply_filters, customer_order_clause, like_pattern,
    page_clause, sale_order_clause,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A plugin sales store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    tracing::debug!(path = %path.as_ref().display(), "opening sales store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT COUNT(*) ...` statement built by the caller.
  async fn count_query(&self, sql: String, params: Vec<Value>) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, params_from_iter(params), |row| row.get(0))?)
      })
      .await?;
    Ok(decode_count(n))
  }
}

// ─── Aggregate SQL ───────────────────────────────────────────────────────────

const YEAR_KEY: &str = "CAST(strftime('%Y', s.date_sold) AS INTEGER) AS sale_year";
const MONTH_KEY: &str =
  "CAST(strftime('%m', s.date_sold) AS INTEGER) AS sale_month";

/// Key columns (in [`RawGroup`] order) plus the GROUP BY / ORDER BY tail for
/// a grouping. Unselected keys are `NULL`.
fn grouping_sql(grouping: Grouping) -> (String, &'static str) {
  let customer = matches!(grouping, Grouping::Customer);
  let plugin = matches!(grouping, Grouping::Plugin | Grouping::MonthAndPlugin);
  let renewal =
    matches!(grouping, Grouping::Renewal | Grouping::MonthAndRenewal);
  let month = grouping.by_month();

  let keys = [
    if customer { "s.customer" } else { "NULL" },
    if plugin { "s.plugin_id" } else { "NULL" },
    if plugin { "MAX(p.name)" } else { "NULL" },
    if renewal { "s.renewal" } else { "NULL" },
    if month { YEAR_KEY } else { "NULL" },
    if month { MONTH_KEY } else { "NULL" },
  ]
  .join(", ");

  let tail = match grouping {
    Grouping::Total => "",
    Grouping::Customer => "GROUP BY s.customer ORDER BY s.customer",
    Grouping::Plugin => "GROUP BY s.plugin_id ORDER BY s.plugin_id",
    Grouping::Renewal => "GROUP BY s.renewal ORDER BY s.renewal",
    Grouping::Month => {
      "GROUP BY sale_year, sale_month ORDER BY sale_year, sale_month"
    }
    Grouping::MonthAndPlugin => {
      "GROUP BY sale_year, sale_month, s.plugin_id \
       ORDER BY sale_year, sale_month, s.plugin_id"
    }
    Grouping::MonthAndRenewal => {
      "GROUP BY sale_year, sale_month, s.renewal \
       ORDER BY sale_year, sale_month, s.renewal"
    }
  };

  (keys, tail)
}

/// Sums rounded to cents in SQL so every caller sees the same figures.
const SUM_COLUMNS: &str = "COUNT(*), \
   ROUND(COALESCE(SUM(s.gross_amount), 0), 2), \
   ROUND(COALESCE(SUM(s.net_amount), 0), 2)";

// ─── SaleStore impl ──────────────────────────────────────────────────────────

impl SaleStore for SqliteStore {
  type Error = crate::Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn upsert(&self, sale: Sale) -> Result<UpsertOutcome> {
    let date_sold = encode_dt(sale.date_sold);

    let existed: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existed = tx
          .query_row(
            "SELECT 1 FROM sales WHERE sale_id = ?1",
            rusqlite::params![sale.sale_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();

        tx.execute(
          "INSERT INTO sales (
             sale_id, plugin_id, edition, renewal,
             gross_amount, net_amount, customer, date_sold
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT(sale_id) DO UPDATE SET
             plugin_id    = excluded.plugin_id,
             edition      = excluded.edition,
             renewal      = excluded.renewal,
             gross_amount = excluded.gross_amount,
             net_amount   = excluded.net_amount,
             customer     = excluded.customer,
             date_sold    = excluded.date_sold",
          rusqlite::params![
            sale.sale_id,
            sale.plugin_id,
            sale.edition,
            sale.renewal,
            sale.gross_amount,
            sale.net_amount,
            sale.customer,
            date_sold,
          ],
        )?;
        tx.commit()?;
        Ok(existed)
      })
      .await?;

    Ok(if existed { UpsertOutcome::Updated } else { UpsertOutcome::Inserted })
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn count(&self) -> Result<u64> {
    self.count_query("SELECT COUNT(*) FROM sales".to_owned(), Vec::new()).await
  }

  async fn get(&self, sale_id: i64) -> Result<Option<Sale>> {
    let raw: Option<RawSale> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} {FROM_SALES} WHERE s.sale_id = ?1", RawSale::COLUMNS),
              rusqlite::params![sale_id],
              RawSale::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSale::into_sale).transpose()
  }

  async fn list_sales(
    &self,
    filter: &SaleFilter,
    sort: Sort<SaleField>,
    page: Page,
  ) -> Result<Vec<SaleRow>> {
    let mut query = QueryBuilder::new();
    apply_filters(&mut query, filter);
    let where_clause = query.where_clause();
    let mut params = query.into_params();
    let limit = page_clause(page, &mut params);

    let sql = format!(
      "SELECT {} {FROM_SALES} {where_clause} {} {limit}",
      RawSale::COLUMNS,
      sale_order_clause(sort),
    );

    let raws: Vec<RawSale> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), RawSale::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSale::into_row).collect()
  }

  async fn count_sales(&self, filter: &SaleFilter) -> Result<u64> {
    let mut query = QueryBuilder::new();
    apply_filters(&mut query, filter);
    let sql = format!("SELECT COUNT(*) {FROM_SALES} {}", query.where_clause());
    self.count_query(sql, query.into_params()).await
  }

  async fn aggregate(
    &self,
    filter: &SaleFilter,
    grouping: Grouping,
  ) -> Result<Vec<GroupTotals>> {
    let mut query = QueryBuilder::new();
    apply_filters(&mut query, filter);
    let (keys, tail) = grouping_sql(grouping);

    let sql = format!(
      "SELECT {keys}, {SUM_COLUMNS} {FROM_SALES} {} {tail}",
      query.where_clause(),
    );
    let params = query.into_params();

    let raws: Vec<RawGroup> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), RawGroup::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGroup::into_totals).collect()
  }

  async fn list_customers(
    &self,
    filter: &SaleFilter,
    sort: Sort<CustomerField>,
    page: Page,
  ) -> Result<Vec<CustomerTotals>> {
    let query = customer_query(filter);
    let where_clause = query.where_clause();
    let mut params = query.into_params();
    let limit = page_clause(page, &mut params);

    let sql = format!(
      "SELECT s.customer AS customer,
              COUNT(*) AS count,
              ROUND(COALESCE(SUM(s.gross_amount), 0), 2) AS gross_amount,
              ROUND(COALESCE(SUM(s.net_amount), 0), 2) AS net_amount
       {FROM_SALES} {where_clause}
       GROUP BY s.customer {} {limit}",
      customer_order_clause(sort),
    );

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), customer_totals_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn count_customers(&self, filter: &SaleFilter) -> Result<u64> {
    let query = customer_query(filter);
    let sql = format!(
      "SELECT COUNT(*) FROM (
         SELECT s.customer {FROM_SALES} {} GROUP BY s.customer
       )",
      query.where_clause(),
    );
    self.count_query(sql, query.into_params()).await
  }
}

/// The shared filter plus the customer-identifier substring condition.
fn customer_query(filter: &SaleFilter) -> QueryBuilder {
  let mut query = QueryBuilder::new();
  apply_filters(&mut query, filter);
  if let Some(search) = &filter.search {
    query.and_where("s.customer LIKE ? ESCAPE '\\'", [Value::Text(
      like_pattern(search),
    )]);
  }
  query
}

// ─── PluginDirectory impl ────────────────────────────────────────────────────

impl PluginDirectory for SqliteStore {
  type Error = crate::Error;

  async fn plugin_names(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT DISTINCT name FROM plugins ORDER BY name")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(names)
  }

  async fn register_plugin(&self, plugin: Plugin) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO plugins (plugin_id, name) VALUES (?1, ?2)
           ON CONFLICT(plugin_id) DO UPDATE SET name = excluded.name",
          rusqlite::params![plugin.plugin_id, plugin.name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
