//! Runtime configuration: an optional TOML file layered under `SANTA_*`
//! environment variables.

use std::path::{Path, PathBuf};

use santa_core::policy::EventPolicy;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  /// SQLite file; the event lives in memory when unset.
  #[serde(default)]
  pub store_path:          Option<PathBuf>,
  pub admin_username:      String,
  pub admin_password_hash: String,
  #[serde(default)]
  pub policy:              EventPolicy,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

impl ServerConfig {
  /// Read `path` (if it exists) and apply environment overrides, e.g.
  /// `SANTA_PORT=9000` or `SANTA_POLICY__MIN_NAME_CHARS=3`.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SANTA")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::{Config, File, FileFormat};

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn minimal_config_uses_defaults() {
    let cfg = parse(
      r#"
        admin_username      = "admin"
        admin_password_hash = "$argon2id$placeholder"
      "#,
    );
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert!(cfg.store_path.is_none());
    assert_eq!(cfg.policy, EventPolicy::default());
  }

  #[test]
  fn policy_table_overrides_fields() {
    let cfg = parse(
      r#"
        admin_username      = "admin"
        admin_password_hash = "x"
        store_path          = "santa.db"

        [policy]
        min_name_chars                = 3
        allow_registration_after_draw = false
      "#,
    );
    assert_eq!(cfg.store_path, Some(PathBuf::from("santa.db")));
    assert_eq!(cfg.policy.min_name_chars, 3);
    assert!(!cfg.policy.allow_registration_after_draw);
    assert_eq!(
      cfg.policy.notify_max_attempts,
      EventPolicy::default().notify_max_attempts
    );
  }

  #[test]
  fn missing_admin_is_an_error() {
    let result = Config::builder()
      .add_source(File::from_str("port = 1", FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize::<ServerConfig>();
    assert!(result.is_err());
  }

  #[test]
  fn tilde_is_expanded_only_at_start() {
    let plain = Path::new("data/santa.db");
    assert_eq!(expand_tilde(plain), plain);
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/santa.db")),
        PathBuf::from(home).join("santa.db")
      );
    }
  }
}
