//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` UTC strings so that range
//! filters compare lexically and SQLite's `strftime` can extract the year and
//! month for grouping. Booleans are stored as `0`/`1`.

use chrono::{DateTime, NaiveDateTime, Utc};
use sales_core::{
  month::YearMonth,
  sale::{Sale, SaleRow},
  store::{CustomerTotals, GroupTotals},
};

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.format(DATE_FORMAT).to_string()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  NaiveDateTime::parse_from_str(s, DATE_FORMAT)
    .map(|naive| naive.and_utc())
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Counts ──────────────────────────────────────────────────────────────────

/// SQLite counts are signed; a negative count can only mean corruption, so
/// it is clamped rather than propagated.
pub fn decode_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns read directly from a `sales` row, optionally joined with
/// `plugins.name`.
pub struct RawSale {
  pub sale_id:      i64,
  pub plugin_id:    i64,
  pub edition:      String,
  pub renewal:      bool,
  pub gross_amount: f64,
  pub net_amount:   f64,
  pub customer:     String,
  pub date_sold:    String,
  pub name:         Option<String>,
}

impl RawSale {
  /// Column list matching [`RawSale::from_row`]; expects `sales s` joined
  /// with `plugins p`.
  pub const COLUMNS: &'static str = "s.sale_id, s.plugin_id, s.edition, \
     s.renewal, s.gross_amount, s.net_amount, s.customer, s.date_sold, p.name";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      sale_id:      row.get(0)?,
      plugin_id:    row.get(1)?,
      edition:      row.get(2)?,
      renewal:      row.get(3)?,
      gross_amount: row.get(4)?,
      net_amount:   row.get(5)?,
      customer:     row.get(6)?,
      date_sold:    row.get(7)?,
      name:         row.get(8)?,
    })
  }

  pub fn into_row(self) -> Result<SaleRow> {
    let name = self.name.clone();
    Ok(SaleRow { sale: self.into_sale()?, name })
  }

  pub fn into_sale(self) -> Result<Sale> {
    Ok(Sale {
      sale_id:      self.sale_id,
      plugin_id:    self.plugin_id,
      edition:      self.edition,
      renewal:      self.renewal,
      gross_amount: self.gross_amount,
      net_amount:   self.net_amount,
      customer:     self.customer,
      date_sold:    decode_dt(&self.date_sold)?,
    })
  }
}

/// Columns read from a grouped aggregate row. Key columns not selected by
/// the grouping come back as `NULL`.
pub struct RawGroup {
  pub customer:     Option<String>,
  pub plugin_id:    Option<i64>,
  pub plugin_name:  Option<String>,
  pub renewal:      Option<bool>,
  pub year:         Option<i32>,
  pub month:        Option<u32>,
  pub count:        i64,
  pub gross_amount: f64,
  pub net_amount:   f64,
}

impl RawGroup {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      customer:     row.get(0)?,
      plugin_id:    row.get(1)?,
      plugin_name:  row.get(2)?,
      renewal:      row.get(3)?,
      year:         row.get(4)?,
      month:        row.get(5)?,
      count:        row.get(6)?,
      gross_amount: row.get(7)?,
      net_amount:   row.get(8)?,
    })
  }

  pub fn into_totals(self) -> Result<GroupTotals> {
    let month = match (self.year, self.month) {
      (Some(year), Some(month)) => Some(
        YearMonth::new(year, month)
          .ok_or(Error::InvalidMonth { year, month })?,
      ),
      _ => None,
    };

    Ok(GroupTotals {
      customer: self.customer,
      plugin_id: self.plugin_id,
      plugin_name: self.plugin_name,
      renewal: self.renewal,
      month,
      count: decode_count(self.count),
      gross_amount: self.gross_amount,
      net_amount: self.net_amount,
    })
  }
}

pub fn customer_totals_from_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<CustomerTotals> {
  let count: i64 = row.get(1)?;
  Ok(CustomerTotals {
    customer:     row.get(0)?,
    count:        decode_count(count),
    gross_amount: row.get(2)?,
    net_amount:   row.get(3)?,
  })
}
