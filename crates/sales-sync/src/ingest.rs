//! Incremental ingestion: fetch the sales the local store is missing and
//! upsert them one by one.

use sales_core::{
  plugin::PluginDirectory,
  sale::UpsertOutcome,
  store::SaleStore,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result, client::SalesClient};

/// What a completed refresh did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshOutcome {
  /// Sales the remote reported in total.
  pub remote_total: u64,
  /// Sales stored locally before the refresh.
  pub local_count:  u64,
  pub inserted:     u64,
  pub updated:      u64,
}

impl RefreshOutcome {
  pub fn processed(&self) -> u64 { self.inserted + self.updated }
}

/// Bring the store up to date with the remote.
///
/// When the remote total does not exceed the local count nothing is written
/// and `progress(0, 0)` is reported once. Otherwise `total - count` sales are
/// fetched and upserted in order, with `progress(processed, missing)` after
/// each. `cancel` is checked before every upsert; rows already written stay.
pub async fn refresh<S>(
  client: &SalesClient,
  store: &S,
  mut progress: impl FnMut(u64, u64) + Send,
  cancel: &CancellationToken,
) -> Result<RefreshOutcome>
where
  S: SaleStore + PluginDirectory,
{
  let session = client.login().await?;

  let remote_total = client.fetch_total(&session).await?;
  let local_count = store.count().await.map_err(Error::store)?;
  let mut outcome =
    RefreshOutcome { remote_total, local_count, ..Default::default() };

  if remote_total <= local_count {
    tracing::info!(remote_total, local_count, "sales already up to date");
    progress(0, 0);
    return Ok(outcome);
  }

  let missing = remote_total - local_count;
  tracing::info!(remote_total, local_count, missing, "fetching new sales");

  if cancel.is_cancelled() {
    return Err(Error::Cancelled { processed: 0 });
  }
  let page = client.fetch_page(&session, missing).await?;
  if page.data.len() as u64 != missing {
    tracing::warn!(
      expected = missing,
      received = page.data.len(),
      "remote returned a different number of sales than requested"
    );
  }

  for remote in &page.data {
    if cancel.is_cancelled() {
      return Err(Error::Cancelled { processed: outcome.processed() });
    }

    let sale = remote.to_sale(&client.config().renewal_type)?;
    if let Some(plugin) = remote.plugin() {
      store.register_plugin(plugin).await.map_err(Error::store)?;
    }
    match store.upsert(sale).await.map_err(Error::store)? {
      UpsertOutcome::Inserted => outcome.inserted += 1,
      UpsertOutcome::Updated => outcome.updated += 1,
    }
    progress(outcome.processed(), missing);
  }

  tracing::info!(
    inserted = outcome.inserted,
    updated = outcome.updated,
    "refresh complete"
  );
  Ok(outcome)
}
