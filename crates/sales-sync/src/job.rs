//! [`RefreshJob`]: ingestion as a cancellable background task.

use sales_core::{plugin::PluginDirectory, store::SaleStore};
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
  Error, Result,
  client::SalesClient,
  ingest::{self, RefreshOutcome},
};

/// The observable state of a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum RefreshState {
  Running { processed: u64, total: u64, fraction: f64 },
  Succeeded(RefreshOutcome),
  Failed(String),
  Cancelled,
}

impl RefreshState {
  pub fn running(processed: u64, total: u64) -> Self {
    Self::Running {
      processed,
      total,
      fraction: progress_fraction(processed, total),
    }
  }

  pub fn is_running(&self) -> bool { matches!(self, Self::Running { .. }) }
}

/// `processed / total`, or `0` when there is nothing to do.
pub fn progress_fraction(processed: u64, total: u64) -> f64 {
  if total == 0 {
    0.0
  } else {
    (processed as f64 / total as f64).min(1.0)
  }
}

/// A refresh ready to be started.
pub struct RefreshJob<S> {
  client: SalesClient,
  store:  S,
}

impl<S> RefreshJob<S>
where
  S: SaleStore + PluginDirectory + 'static,
{
  pub fn new(client: SalesClient, store: S) -> Self { Self { client, store } }

  /// Start ingestion on the tokio runtime.
  pub fn spawn(self) -> RefreshHandle {
    let (tx, rx) = watch::channel(RefreshState::running(0, 0));
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
      tracing::info!("refresh started");
      let result = ingest::refresh(
        &self.client,
        &self.store,
        |processed, total| {
          tx.send_replace(RefreshState::running(processed, total));
        },
        &token,
      )
      .await;

      let final_state = match &result {
        Ok(outcome) => RefreshState::Succeeded(*outcome),
        Err(Error::Cancelled { processed }) => {
          tracing::info!(processed, "refresh cancelled");
          RefreshState::Cancelled
        }
        Err(err) => {
          tracing::warn!(error = %err, "refresh failed");
          RefreshState::Failed(err.to_string())
        }
      };
      tx.send_replace(final_state);
      result
    });

    RefreshHandle { state: rx, cancel, task }
  }
}

/// Handle to a spawned refresh.
#[derive(Debug)]
pub struct RefreshHandle {
  state:  watch::Receiver<RefreshState>,
  cancel: CancellationToken,
  task:   JoinHandle<Result<RefreshOutcome>>,
}

impl RefreshHandle {
  /// A snapshot of the current state.
  pub fn state(&self) -> RefreshState { self.state.borrow().clone() }

  pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
    self.state.clone()
  }

  /// Ask the task to stop before its next upsert.
  pub fn cancel(&self) { self.cancel.cancel(); }

  pub fn is_finished(&self) -> bool { self.task.is_finished() }

  pub async fn join(self) -> Result<RefreshOutcome> { self.task.await? }
}
