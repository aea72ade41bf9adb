//! Error types for `sales-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A report filter or sort parameter was rejected before any query ran.
  #[error("invalid query: {0}")]
  Query(String),

  #[error("exchange rate unavailable: {0}")]
  ExchangeRate(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
