//! SQL builder shared by every sales query.
//!
//! [`apply_filters`] is the one place that turns a [`SaleFilter`] into WHERE
//! conditions, so listings, counts, and grouped aggregates always agree on
//! which rows match.

use rusqlite::types::Value;
use sales_core::query::{
  CustomerField, Page, SaleField, SaleFilter, Sort, SortOrder,
};

use crate::encode::encode_dt;

/// Base FROM clause; the plugin join is needed for search and names.
pub const FROM_SALES: &str =
  "FROM sales s LEFT JOIN plugins p ON p.plugin_id = s.plugin_id";

/// Accumulates WHERE conditions and their positional parameters.
#[derive(Debug, Default)]
pub struct QueryBuilder {
  conditions: Vec<String>,
  params:     Vec<Value>,
}

impl QueryBuilder {
  pub fn new() -> Self { Self::default() }

  /// Add a condition using `?` placeholders, one per element of `params`.
  pub fn and_where(
    &mut self,
    condition: impl Into<String>,
    params: impl IntoIterator<Item = Value>,
  ) -> &mut Self {
    self.conditions.push(condition.into());
    self.params.extend(params);
    self
  }

  /// `WHERE a AND b ...`, or an empty string when unconstrained.
  pub fn where_clause(&self) -> String {
    if self.conditions.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.conditions.join(" AND "))
    }
  }

  pub fn into_params(self) -> Vec<Value> { self.params }
}

/// Apply the shared filter set to `query`.
///
/// The search term matches plugin name or edition, and also the customer
/// unless an exact customer is already being filtered on.
pub fn apply_filters(query: &mut QueryBuilder, filter: &SaleFilter) {
  if let Some(from) = filter.sold_from {
    query.and_where("s.date_sold >= ?", [Value::Text(encode_dt(from))]);
  }

  if let Some(until) = filter.sold_until {
    query.and_where("s.date_sold <= ?", [Value::Text(encode_dt(until))]);
  }

  if let Some(customer) = &filter.customer {
    query.and_where("s.customer = ?", [Value::Text(customer.clone())]);
  }

  if let Some(search) = &filter.search {
    let pattern = like_pattern(search);
    if filter.customer.is_some() {
      query.and_where(
        "(p.name LIKE ? ESCAPE '\\' OR s.edition LIKE ? ESCAPE '\\')",
        [Value::Text(pattern.clone()), Value::Text(pattern)],
      );
    } else {
      query.and_where(
        "(p.name LIKE ? ESCAPE '\\' OR s.edition LIKE ? ESCAPE '\\' \
         OR s.customer LIKE ? ESCAPE '\\')",
        [
          Value::Text(pattern.clone()),
          Value::Text(pattern.clone()),
          Value::Text(pattern),
        ],
      );
    }
  }
}

/// `%term%` with LIKE wildcards in `term` escaped.
pub fn like_pattern(term: &str) -> String {
  let mut escaped = String::with_capacity(term.len() + 2);
  escaped.push('%');
  for c in term.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped.push('%');
  escaped
}

fn direction(order: SortOrder) -> &'static str {
  match order {
    SortOrder::Asc => "ASC",
    SortOrder::Desc => "DESC",
  }
}

/// ORDER BY for sale listings, with `sale_id` as a stable tie-breaker.
pub fn sale_order_clause(sort: Sort<SaleField>) -> String {
  let column = match sort.field {
    SaleField::SaleId => "s.sale_id",
    SaleField::PluginId => "s.plugin_id",
    SaleField::Name => "p.name",
    SaleField::Edition => "s.edition",
    SaleField::Renewal => "s.renewal",
    SaleField::GrossAmount => "s.gross_amount",
    SaleField::NetAmount => "s.net_amount",
    SaleField::Customer => "s.customer",
    SaleField::DateSold => "s.date_sold",
  };
  let dir = direction(sort.order);
  format!("ORDER BY {column} {dir}, s.sale_id {dir}")
}

/// ORDER BY for the grouped customer listing.
pub fn customer_order_clause(sort: Sort<CustomerField>) -> String {
  let column = match sort.field {
    CustomerField::Customer => "customer",
    CustomerField::Count => "count",
    CustomerField::GrossAmount => "gross_amount",
    CustomerField::NetAmount => "net_amount",
  };
  let dir = direction(sort.order);
  format!("ORDER BY {column} {dir}, customer ASC")
}

/// `LIMIT ? OFFSET ?`; SQLite treats a negative limit as unbounded.
pub fn page_clause(page: Page, params: &mut Vec<Value>) -> &'static str {
  let limit = page.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
  let offset = page.offset.map_or(0, |o| i64::try_from(o).unwrap_or(i64::MAX));
  params.push(Value::Integer(limit));
  params.push(Value::Integer(offset));
  "LIMIT ? OFFSET ?"
}
