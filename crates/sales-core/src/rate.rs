//! Currency conversion applied to every reported figure.

use std::future::Future;

use crate::{Error, Result};

/// Supplies the multiplier from the source currency into the reporting
/// currency. Queried once per report call; the rate is never stored.
pub trait ExchangeRateProvider: Send + Sync {
  fn exchange_rate(&self) -> impl Future<Output = Result<f64>> + Send + '_;
}

/// A rate fixed at construction time, typically read from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRate(pub f64);

impl Default for FixedRate {
  fn default() -> Self { Self(1.0) }
}

impl ExchangeRateProvider for FixedRate {
  async fn exchange_rate(&self) -> Result<f64> { Ok(self.0) }
}

/// A validated exchange rate, used to convert raw store sums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
  rate: f64,
}

impl Conversion {
  /// Rejects non-finite and negative multipliers.
  pub fn new(rate: f64) -> Result<Self> {
    if !rate.is_finite() || rate < 0.0 {
      return Err(Error::ExchangeRate(format!("invalid multiplier {rate}")));
    }
    Ok(Self { rate })
  }

  /// Fetch and validate the provider's current rate.
  pub async fn current<R: ExchangeRateProvider>(provider: &R) -> Result<Self> {
    Self::new(provider.exchange_rate().await?)
  }

  pub fn rate(&self) -> f64 { self.rate }

  /// Convert an amount and round it to cents.
  pub fn apply(&self, amount: f64) -> f64 { round_cents(amount * self.rate) }
}

/// Round to two decimal places, half away from zero.
///
/// The scaled value is first rounded to 15 significant digits, so a product
/// such as `1.005 * 100 = 100.49999999999999` still rounds up to `1.01`.
pub fn round_cents(value: f64) -> f64 {
  let rounded = pre_round(value * 100.0).round() / 100.0;
  // Normalise `-0.0` so serialised output never shows a signed zero.
  if rounded == 0.0 { 0.0 } else { rounded }
}

fn pre_round(value: f64) -> f64 {
  if value == 0.0 || !value.is_finite() {
    return value;
  }
  let digits = 14 - value.abs().log10().floor() as i32;
  if digits <= 0 {
    return value;
  }
  let scale = 10f64.powi(digits);
  (value * scale).round() / scale
}
