//! Runtime server configuration, deserialised from `config.toml` layered
//! under `ROLO_*` environment variables.

use std::{net::IpAddr, path::PathBuf, time::Duration};

use rolo_auth::{ThrottlePolicy, TokenConfig};
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  #[serde(default = "default_store_path")]
  pub store_path:             PathBuf,
  pub access_token_secret:    String,
  pub refresh_token_secret:   String,
  #[serde(default = "default_access_ttl")]
  pub access_token_ttl_secs:  u64,
  #[serde(default = "default_refresh_ttl")]
  pub refresh_token_ttl_secs: u64,
  #[serde(default = "default_login_max_attempts")]
  pub login_max_attempts:     u32,
  #[serde(default = "default_login_window")]
  pub login_window_secs:      u64,
  #[serde(default = "default_storage_timeout")]
  pub storage_timeout_ms:     u64,
  /// Reverse proxies whose `X-Forwarded-For` / `X-Real-IP` headers are
  /// believed when throttling logins. Empty means the socket peer is used.
  #[serde(default)]
  pub trusted_proxies:        Vec<IpAddr>,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 5280 }
fn default_store_path() -> PathBuf { PathBuf::from("rolo.sqlite3") }
fn default_access_ttl() -> u64 { 15 * 60 }
fn default_refresh_ttl() -> u64 { 7 * 24 * 60 * 60 }
fn default_login_max_attempts() -> u32 { 3 }
fn default_login_window() -> u64 { 10 * 60 }
fn default_storage_timeout() -> u64 { 5_000 }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn token_config(&self) -> TokenConfig {
    TokenConfig {
      access_secret:  self.access_token_secret.clone(),
      refresh_secret: self.refresh_token_secret.clone(),
      access_ttl:     Duration::from_secs(self.access_token_ttl_secs),
      refresh_ttl:    Duration::from_secs(self.refresh_token_ttl_secs),
    }
  }

  pub fn throttle_policy(&self) -> ThrottlePolicy {
    ThrottlePolicy {
      max_attempts: self.login_max_attempts,
      window:       Duration::from_secs(self.login_window_secs),
    }
  }

  pub fn storage_timeout(&self) -> Duration { Duration::from_millis(self.storage_timeout_ms) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_fill_everything_but_secrets() {
    let cfg: ServerConfig = serde_json::from_value(serde_json::json!({
      "access_token_secret": "a",
      "refresh_token_secret": "r",
    }))
    .unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:5280");
    assert_eq!(cfg.token_config().access_ttl, Duration::from_secs(900));
    assert_eq!(cfg.throttle_policy(), ThrottlePolicy::default());
    assert_eq!(cfg.storage_timeout(), Duration::from_secs(5));
    assert!(cfg.trusted_proxies.is_empty());
  }

  #[test]
  fn trusted_proxies_parse_as_addresses() {
    let cfg: ServerConfig = serde_json::from_value(serde_json::json!({
      "access_token_secret": "a",
      "refresh_token_secret": "r",
      "trusted_proxies": ["127.0.0.1", "::1"],
    }))
    .unwrap();
    assert_eq!(cfg.trusted_proxies.len(), 2);

    let bad = serde_json::from_value::<ServerConfig>(serde_json::json!({
      "access_token_secret": "a",
      "refresh_token_secret": "r",
      "trusted_proxies": ["proxy.internal"],
    }));
    assert!(bad.is_err());
  }

  #[test]
  fn secrets_are_required() {
    let missing = serde_json::from_value::<ServerConfig>(serde_json::json!({ "port": 8080 }));
    assert!(missing.is_err());
  }
}
