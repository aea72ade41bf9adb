//! Handlers for the report endpoints. Every endpoint takes the same query
//! string: `start`, `end` (`YYYY-MM-DD`), `customer`, `search`, `orderBy`,
//! `sortBy`, `offset`, `limit`.

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{FromRequestParts, Query, State},
  http::request::Parts,
};
use sales_core::{
  query::ReportQuery, rate::ExchangeRateProvider, sale::SaleRow,
  store::CustomerTotals,
};
use sales_reports::{
  LicenseRenewalTotals, Listing, MonthlySeries, MonthlyTotal, Summary, Totals,
};

use crate::{AppState, Backend, error::ApiError};

type Reply<T> = Result<Json<T>, ApiError>;

/// The report query string. Unparseable values (`limit=abc`, `start=x`) are
/// rejected with the JSON error body every other bad request gets.
pub struct Params(pub ReportQuery);

impl<S> FromRequestParts<S> for Params
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    let Query(query) = Query::<ReportQuery>::from_request_parts(parts, state)
      .await
      .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    Ok(Params(query))
  }
}

/// `GET /reports/summary`
pub async fn summary<S, R>(
  State(state): State<AppState<S, R>>,
  Params(query): Params,
) -> Reply<Summary>
where
  S: Backend,
  R: ExchangeRateProvider,
{
  Ok(Json(state.reports.summary(&query).await?))
}

/// `GET /reports/totals`
pub async fn totals<S, R>(
  State(state): State<AppState<S, R>>,
  Params(query): Params,
) -> Reply<Totals>
where
  S: Backend,
  R: ExchangeRateProvider,
{
  Ok(Json(state.reports.totals(&query).await?))
}

/// `GET /reports/plugin-totals`
pub async fn plugin_totals<S, R>(
  State(state): State<AppState<S, R>>,
  Params(query): Params,
) -> Reply<BTreeMap<String, f64>>
where
  S: Backend,
  R: ExchangeRateProvider,
{
  Ok(Json(state.reports.plugin_totals(&query).await?))
}

/// `GET /reports/license-renewal-totals`
pub async fn license_renewal_totals<S, R>(
  State(state): State<AppState<S, R>>,
  Params(query): Params,
) -> Reply<LicenseRenewalTotals>
where
  S: Backend,
  R: ExchangeRateProvider,
{
  Ok(Json(state.reports.license_renewal_totals(&query).await?))
}

/// `GET /reports/months`
pub async fn months<S, R>(
  State(state): State<AppState<S, R>>,
  Params(query): Params,
) -> Reply<Vec<String>>
where
  S: Backend,
  R: ExchangeRateProvider,
{
  Ok(Json(state.reports.months(&query).await?))
}

/// `GET /reports/monthly-totals`
pub async fn monthly_totals<S, R>(
  State(state): State<AppState<S, R>>,
  Params(query): Params,
) -> Reply<Vec<MonthlyTotal>>
where
  S: Backend,
  R: ExchangeRateProvider,
{
  Ok(Json(state.reports.monthly_totals(&query).await?))
}

/// `GET /reports/monthly-plugin-totals`
pub async fn monthly_plugin_totals<S, R>(
  State(state): State<AppState<S, R>>,
  Params(query): Params,
) -> Reply<MonthlySeries>
where
  S: Backend,
  R: ExchangeRateProvider,
{
  Ok(Json(state.reports.monthly_plugin_totals(&query).await?))
}

/// `GET /reports/monthly-license-renewal-totals`
pub async fn monthly_license_renewal_totals<S, R>(
  State(state): State<AppState<S, R>>,
  Params(query): Params,
) -> Reply<MonthlySeries>
where
  S: Backend,
  R: ExchangeRateProvider,
{
  Ok(Json(state.reports.monthly_license_renewal_totals(&query).await?))
}

// ─── Listings ────────────────────────────────────────────────────────────────

/// `GET /sales`
pub async fn sales<S, R>(
  State(state): State<AppState<S, R>>,
  Params(query): Params,
) -> Reply<Listing<SaleRow>>
where
  S: Backend,
  R: ExchangeRateProvider,
{
  Ok(Json(state.reports.sales(&query).await?))
}

/// `GET /customers`
pub async fn customers<S, R>(
  State(state): State<AppState<S, R>>,
  Params(query): Params,
) -> Reply<Listing<CustomerTotals>>
where
  S: Backend,
  R: ExchangeRateProvider,
{
  Ok(Json(state.reports.customers(&query).await?))
}
