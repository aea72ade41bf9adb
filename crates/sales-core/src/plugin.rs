//! Plugin references and the directory that owns them.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// A plugin that sales are recorded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
  pub plugin_id: i64,
  pub name:      String,
}

/// The authoritative set of known plugins.
///
/// Reports use it to list every plugin, including those without sales.
pub trait PluginDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All known plugin names, sorted and deduplicated.
  fn plugin_names(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Insert or rename a plugin.
  fn register_plugin(
    &self,
    plugin: Plugin,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
