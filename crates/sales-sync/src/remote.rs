//! Wire types for the remote sales endpoint and their mapping onto [`Sale`].
//!
//! The remote serialises ids and amounts inconsistently, sometimes as JSON
//! numbers and sometimes as numeric strings, so both are accepted.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use sales_core::{plugin::Plugin, sale::Sale};
use serde::{Deserialize, Deserializer};

use crate::{Error, Result};

/// One page of the sales listing.
#[derive(Debug, Clone, Deserialize)]
pub struct SalesPage {
  /// Number of sales the account has in total, regardless of `per_page`.
  #[serde(deserialize_with = "flexible")]
  pub total: u64,
  #[serde(default)]
  pub data:  Vec<RemoteSale>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSale {
  #[serde(deserialize_with = "flexible")]
  pub id:               i64,
  pub plugin:           RemotePlugin,
  pub edition:          RemoteEdition,
  #[serde(default)]
  pub purchasable_type: String,
  #[serde(deserialize_with = "flexible")]
  pub gross_amount:     f64,
  #[serde(deserialize_with = "flexible")]
  pub net_amount:       f64,
  pub customer:         RemoteCustomer,
  pub sale_time:        String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemotePlugin {
  #[serde(deserialize_with = "flexible")]
  pub id:   i64,
  #[serde(default)]
  pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEdition {
  pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCustomer {
  #[serde(default)]
  pub email: String,
}

impl RemoteSale {
  /// Map onto the local representation. A sale is a renewal exactly when its
  /// purchasable type equals `renewal_type`.
  pub fn to_sale(&self, renewal_type: &str) -> Result<Sale> {
    Ok(Sale {
      sale_id:      self.id,
      plugin_id:    self.plugin.id,
      edition:      self.edition.name.clone(),
      renewal:      self.purchasable_type == renewal_type,
      gross_amount: self.gross_amount,
      net_amount:   self.net_amount,
      customer:     self.customer.email.clone(),
      date_sold:    parse_sale_time(&self.sale_time).ok_or_else(|| {
        Error::RemoteApi(format!(
          "sale {} has an unreadable saleTime {:?}",
          self.id, self.sale_time
        ))
      })?,
    })
  }

  /// The plugin reference carried by the sale, when it includes a name.
  pub fn plugin(&self) -> Option<Plugin> {
    let name = self.plugin.name.as_deref()?.trim();
    (!name.is_empty()).then(|| Plugin {
      plugin_id: self.plugin.id,
      name:      name.to_owned(),
    })
  }
}

/// RFC 3339, or a bare `YYYY-MM-DD HH:MM:SS` taken as UTC.
pub fn parse_sale_time(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
    .ok()
    .map(|naive| naive.and_utc())
}

// ─── Lenient numbers ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
  Number(T),
  Text(String),
}

fn flexible<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + FromStr,
  T::Err: Display,
{
  match NumberOrString::<T>::deserialize(deserializer)? {
    NumberOrString::Number(n) => Ok(n),
    NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
  }
}
