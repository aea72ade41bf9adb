//! Async HTTP client for the remote sales system.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::{Client, RequestBuilder, Response, multipart::Form};
use serde_json::Value;

use crate::{
  Error, Result,
  config::RemoteConfig,
  remote::SalesPage,
};

/// Matches the token the login page embeds in its inline script, allowing
/// escaped quotes inside the literal.
static CSRF_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"csrfTokenValue:\s*"((?:[^"\\]|\\.)*)""#)
    .expect("CSRF token pattern is valid")
});

/// An authenticated session. The session cookie lives in the client's jar;
/// the CSRF token has to accompany every later request.
#[derive(Debug, Clone)]
pub struct Session {
  csrf_token: String,
}

/// Async HTTP client for the remote sales API.
///
/// Cheap to clone: the inner [`reqwest::Client`] and its cookie jar are
/// `Arc`-based.
#[derive(Clone)]
pub struct SalesClient {
  client: Client,
  config: RemoteConfig,
}

impl SalesClient {
  pub fn new(config: RemoteConfig) -> Result<Self> {
    let client = Client::builder()
      .cookie_store(true)
      .connect_timeout(config.connect_timeout())
      .timeout(config.timeout())
      .build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &RemoteConfig { &self.config }

  fn url(&self, path: &str) -> String {
    format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn action_url(&self, action: &str) -> String {
    self.url(&format!("index.php?p=actions//{action}"))
  }

  fn with_session(
    &self,
    req: RequestBuilder,
    session: &Session,
  ) -> RequestBuilder {
    req
      .header(reqwest::header::ACCEPT, "application/json")
      .header("X-CSRF-Token", &session.csrf_token)
  }

  // ── Authentication ────────────────────────────────────────────────────────

  /// `GET login` for a CSRF token, then post the configured credentials.
  pub async fn login(&self) -> Result<Session> {
    if self.config.login_name.is_empty() {
      return Err(Error::Authentication("no login name configured".into()));
    }

    let page = self
      .client
      .get(self.url("login"))
      .send()
      .await?
      .error_for_status()?
      .text()
      .await?;
    let session = Session { csrf_token: extract_csrf_token(&page)? };
    tracing::debug!("fetched CSRF token");

    let form = Form::new()
      .text("loginName", self.config.login_name.clone())
      .text("password", self.config.password.clone());
    let resp = self
      .with_session(self.client.post(self.action_url("users/login")), &session)
      .multipart(form)
      .send()
      .await?;

    let status = resp.status();
    let body: Option<Value> = resp.json().await.ok();
    if let Some(message) = body.as_ref().and_then(login_error) {
      return Err(Error::Authentication(message));
    }
    if !status.is_success() {
      return Err(Error::Authentication(format!("login returned {status}")));
    }

    tracing::info!(login = %self.config.login_name, "authenticated");
    Ok(session)
  }

  // ── Sales ─────────────────────────────────────────────────────────────────

  /// `GET <sales endpoint>&per_page=<n>`
  pub async fn fetch_page(
    &self,
    session: &Session,
    per_page: u64,
  ) -> Result<SalesPage> {
    let url = format!(
      "{}&per_page={per_page}",
      self.action_url(&self.config.sales_endpoint)
    );
    let resp = self.with_session(self.client.get(url), session).send().await?;
    decode_page(resp).await
  }

  /// Total number of sales the remote holds, via a one-row page.
  pub async fn fetch_total(&self, session: &Session) -> Result<u64> {
    Ok(self.fetch_page(session, 1).await?.total)
  }
}

async fn decode_page(resp: Response) -> Result<SalesPage> {
  let status = resp.status();
  if !status.is_success() {
    return Err(Error::RemoteApi(format!("sales endpoint returned {status}")));
  }
  let body = resp.bytes().await?;
  serde_json::from_slice(&body)
    .map_err(|e| Error::RemoteApi(format!("malformed sales payload: {e}")))
}

/// Pull the CSRF token out of the login page and undo its JSON escaping.
pub fn extract_csrf_token(page: &str) -> Result<String> {
  let raw = CSRF_TOKEN
    .captures(page)
    .and_then(|c| c.get(1))
    .ok_or(Error::AuthToken)?;
  let token: String = serde_json::from_str(&format!("\"{}\"", raw.as_str()))
    .map_err(|_| Error::AuthToken)?;
  if token.is_empty() {
    return Err(Error::AuthToken);
  }
  Ok(token)
}

/// The error message of a failed login response, if the body reports one.
fn login_error(body: &Value) -> Option<String> {
  ["error", "errorMessage"]
    .iter()
    .find_map(|key| body.get(*key))
    .map(|v| match v.as_str() {
      Some(s) => s.to_owned(),
      None => v.to_string(),
    })
}
