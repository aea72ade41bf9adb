//! Sale types: one row per transaction recorded by the remote sales system.
//!
//! Sales are written only by the ingestion path and are never deleted. The
//! `sale_id` assigned by the remote system is the upsert key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Sale ────────────────────────────────────────────────────────────────────

/// A single sale as stored locally. Amounts are in the source currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
  /// Identifier assigned by the remote sales system; unique in the store.
  pub sale_id:      i64,
  pub plugin_id:    i64,
  pub edition:      String,
  /// `true` for a renewal purchase, `false` for a new license.
  pub renewal:      bool,
  pub gross_amount: f64,
  /// Expected to be `<= gross_amount`; not enforced.
  pub net_amount:   f64,
  /// Purchaser identifier (their email address).
  pub customer:     String,
  pub date_sold:    DateTime<Utc>,
}

impl Sale {
  /// Human-readable category used by the license/renewal split.
  pub fn category(&self) -> &'static str { category_for(self.renewal) }
}

/// Maps the renewal flag onto its report category label.
pub fn category_for(renewal: bool) -> &'static str {
  if renewal { RENEWALS } else { LICENSES }
}

/// Category label for new-license sales.
pub const LICENSES: &str = "licenses";
/// Category label for renewal sales.
pub const RENEWALS: &str = "renewals";

// ─── Listing rows ────────────────────────────────────────────────────────────

/// A sale joined with its plugin's display name, as returned by listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRow {
  #[serde(flatten)]
  pub sale: Sale,
  /// `None` when the plugin directory has no entry for `sale.plugin_id`.
  pub name: Option<String>,
}

/// Whether an upsert created a new row or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
  Inserted,
  Updated,
}
