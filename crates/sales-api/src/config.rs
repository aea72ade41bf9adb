//! Runtime server configuration, deserialised from `config.toml` and
//! `PLUGIN_SALES__*` environment variables.

use std::path::PathBuf;

use sales_sync::RemoteConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  /// SQLite file; a leading `~` is expanded by the binary.
  pub store_path:    PathBuf,
  /// Multiplier from the source currency into the reporting currency.
  pub exchange_rate: f64,
  pub remote:        RemoteConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".to_owned(),
      port:          8080,
      store_path:    PathBuf::from("~/.local/share/plugin-sales/sales.db"),
      exchange_rate: 1.0,
      remote:        RemoteConfig::default(),
    }
  }
}
