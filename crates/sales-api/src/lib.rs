//! JSON HTTP API for plugin sales reports.
//!
//! Exposes an axum [`Router`] backed by any store that implements both
//! [`SaleStore`] and [`PluginDirectory`], plus the refresh slot that runs
//! ingestion in the background.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", sales_api::router(state))
//! ```

pub mod config;
pub mod error;
pub mod refresh;
pub mod reports;

use std::sync::Arc;

use axum::{Router, routing::get};
use sales_core::{
  plugin::PluginDirectory, rate::ExchangeRateProvider, store::SaleStore,
};
use sales_reports::ReportEngine;
use sales_sync::SalesClient;

pub use config::ServerConfig;
pub use error::ApiError;
pub use refresh::RefreshSlot;

/// A store usable by every endpoint: it holds the sales and names the
/// plugins.
pub trait Backend: SaleStore + PluginDirectory + Clone + 'static {}

impl<T> Backend for T where T: SaleStore + PluginDirectory + Clone + 'static {}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, R> {
  pub reports: Arc<ReportEngine<S, S, R>>,
  pub refresh: Arc<RefreshSlot<S>>,
}

impl<S, R> Clone for AppState<S, R> {
  fn clone(&self) -> Self {
    Self {
      reports: Arc::clone(&self.reports),
      refresh: Arc::clone(&self.refresh),
    }
  }
}

impl<S: Backend, R: ExchangeRateProvider> AppState<S, R> {
  /// The same store serves reports and receives refreshed sales.
  pub fn new(store: S, rates: R, client: SalesClient) -> Self {
    Self {
      reports: Arc::new(ReportEngine::new(store.clone(), store.clone(), rates)),
      refresh: Arc::new(RefreshSlot::new(client, store)),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn router<S, R>(state: AppState<S, R>) -> Router<()>
where
  S: Backend,
  R: ExchangeRateProvider + 'static,
{
  Router::new()
    // Reports
    .route("/reports/summary", get(reports::summary::<S, R>))
    .route("/reports/totals", get(reports::totals::<S, R>))
    .route("/reports/plugin-totals", get(reports::plugin_totals::<S, R>))
    .route(
      "/reports/license-renewal-totals",
      get(reports::license_renewal_totals::<S, R>),
    )
    .route("/reports/months", get(reports::months::<S, R>))
    .route("/reports/monthly-totals", get(reports::monthly_totals::<S, R>))
    .route(
      "/reports/monthly-plugin-totals",
      get(reports::monthly_plugin_totals::<S, R>),
    )
    .route(
      "/reports/monthly-license-renewal-totals",
      get(reports::monthly_license_renewal_totals::<S, R>),
    )
    // Listings
    .route("/sales", get(reports::sales::<S, R>))
    .route("/customers", get(reports::customers::<S, R>))
    // Refresh
    .route(
      "/refresh",
      get(refresh::status::<S, R>)
        .post(refresh::start::<S, R>)
        .delete(refresh::cancel::<S, R>),
    )
    .with_state(state)
}
