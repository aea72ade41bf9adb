//! Error type for `sales-sync`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The login page carried no usable CSRF token. Retrying will not help.
  #[error("could not fetch a valid CSRF token")]
  AuthToken,

  #[error("authentication failed: {0}")]
  Authentication(String),

  /// The remote answered, but not with what was expected.
  #[error("remote sales API error: {0}")]
  RemoteApi(String),

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("refresh cancelled after {processed} sales")]
  Cancelled { processed: u64 },

  #[error("refresh task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

impl Error {
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
