//! Handlers for `/refresh` and the slot that keeps at most one refresh
//! running.
//!
//! | Method   | Path       | Notes |
//! |----------|------------|-------|
//! | `GET`    | `/refresh` | State of the latest refresh, `idle` if none |
//! | `POST`   | `/refresh` | 202 on start, 409 while one is running |
//! | `DELETE` | `/refresh` | 202 once cancellation is requested, 404 if idle |

use std::sync::Mutex;

use axum::{Json, extract::State, http::StatusCode};
use sales_sync::{RefreshHandle, RefreshJob, RefreshState, SalesClient};
use serde::Serialize;

use crate::{AppState, Backend, error::ApiError};

// ─── Slot ────────────────────────────────────────────────────────────────────

/// Owns the handle of the most recent refresh.
pub struct RefreshSlot<S> {
  client:  SalesClient,
  store:   S,
  current: Mutex<Option<RefreshHandle>>,
}

impl<S: Backend> RefreshSlot<S> {
  pub fn new(client: SalesClient, store: S) -> Self {
    Self { client, store, current: Mutex::new(None) }
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Option<RefreshHandle>> {
    // A poisoned slot only means a handler panicked mid-update; the handle
    // itself is still valid.
    self.current.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Start a refresh unless one is still running.
  pub fn start(&self) -> Result<RefreshState, ApiError> {
    let mut current = self.lock();
    if current.as_ref().is_some_and(is_active) {
      return Err(ApiError::Conflict("a refresh is already running".into()));
    }
    let handle =
      RefreshJob::new(self.client.clone(), self.store.clone()).spawn();
    let state = handle.state();
    *current = Some(handle);
    Ok(state)
  }

  /// State of the latest refresh, if any has been started.
  pub fn state(&self) -> Option<RefreshState> {
    self.lock().as_ref().map(RefreshHandle::state)
  }

  /// Request cancellation. Returns `false` when nothing is running.
  pub fn cancel(&self) -> bool {
    match self.lock().as_ref() {
      Some(handle) if is_active(handle) => {
        handle.cancel();
        true
      }
      _ => false,
    }
  }
}

fn is_active(handle: &RefreshHandle) -> bool {
  !handle.is_finished() && handle.state().is_running()
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// Body of `GET /refresh`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RefreshStatus {
  Idle { state: &'static str },
  Latest(RefreshState),
}

/// `GET /refresh`
pub async fn status<S, R>(
  State(state): State<AppState<S, R>>,
) -> Json<RefreshStatus>
where
  S: Backend,
{
  Json(match state.refresh.state() {
    Some(latest) => RefreshStatus::Latest(latest),
    None => RefreshStatus::Idle { state: "idle" },
  })
}

/// `POST /refresh`
pub async fn start<S, R>(
  State(state): State<AppState<S, R>>,
) -> Result<(StatusCode, Json<RefreshState>), ApiError>
where
  S: Backend,
{
  let started = state.refresh.start()?;
  tracing::info!("refresh requested");
  Ok((StatusCode::ACCEPTED, Json(started)))
}

/// `DELETE /refresh`
pub async fn cancel<S, R>(
  State(state): State<AppState<S, R>>,
) -> Result<StatusCode, ApiError>
where
  S: Backend,
{
  if state.refresh.cancel() {
    tracing::info!("refresh cancellation requested");
    Ok(StatusCode::ACCEPTED)
  } else {
    Err(ApiError::NotFound("no refresh is running".into()))
  }
}
