//! Connection settings for the remote sales system.

use std::{fmt, time::Duration};

use serde::Deserialize;

/// Where and as whom to fetch sales. Credentials are always supplied from
/// configuration; there are no built-in defaults for them.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
  /// Root of the remote account site; relative paths are resolved against it.
  pub base_url:             String,
  pub login_name:           String,
  pub password:             String,
  /// Controller action that lists sales, without the `actions/` prefix.
  pub sales_endpoint:       String,
  /// `purchasableType` value that marks a renewal.
  pub renewal_type:         String,
  pub connect_timeout_secs: u64,
  pub timeout_secs:         u64,
}

impl RemoteConfig {
  pub fn connect_timeout(&self) -> Duration {
    Duration::from_secs(self.connect_timeout_secs)
  }

  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

impl Default for RemoteConfig {
  fn default() -> Self {
    Self {
      base_url:             "https://id.craftcms.com/".to_owned(),
      login_name:           String::new(),
      password:             String::new(),
      sales_endpoint:       "craftnet/id/sales/get-sales".to_owned(),
      renewal_type:         r"craftnet\plugins\PluginRenewal".to_owned(),
      connect_timeout_secs: 10,
      timeout_secs:         30,
    }
  }
}

impl fmt::Debug for RemoteConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RemoteConfig")
      .field("base_url", &self.base_url)
      .field("login_name", &self.login_name)
      .field("password", &"<redacted>")
      .field("sales_endpoint", &self.sales_endpoint)
      .field("renewal_type", &self.renewal_type)
      .field("connect_timeout_secs", &self.connect_timeout_secs)
      .field("timeout_secs", &self.timeout_secs)
      .finish()
  }
}
