//! HTTP Basic-auth check for administrative routes.
//!
//! This is the only place the service decides who may run, reset or notify;
//! `santa-core` carries no notion of identity beyond participant ids.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use santa_core::{notify::Notifier, store::SantaStore};

use crate::{AppState, error::ApiError};

/// Administrator credentials accepted by this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Zero-size marker: present in the handler means the caller is the
/// administrator.
pub struct Admin;

/// Accept `headers` only if they carry `Basic` credentials for the configured
/// administrator whose password matches the stored argon2 hash.
///
/// Every failure collapses to [`ApiError::Unauthorized`] so the response does
/// not say which part was wrong.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), ApiError> {
  let (username, password) = basic_credentials(headers).ok_or(ApiError::Unauthorized)?;
  if username != config.username {
    return Err(ApiError::Unauthorized);
  }

  let stored = PasswordHash::new(&config.password_hash).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &stored)
    .map_err(|_| ApiError::Unauthorized)
}

/// Decode `Authorization: Basic <b64(user:pass)>`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let decoded = B64.decode(value.strip_prefix("Basic ")?).ok()?;
  let (user, pass) = std::str::from_utf8(&decoded).ok()?.split_once(':')?;
  Some((user.to_owned(), pass.to_owned()))
}

impl<S, N> FromRequestParts<AppState<S, N>> for Admin
where
  S: SantaStore + 'static,
  N: Notifier,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, N>,
  ) -> Result<Self, Self::Rejection> {
    if let Err(e) = verify_auth(&parts.headers, &state.auth) {
      tracing::warn!(path = %parts.uri.path(), "rejected administrative request");
      return Err(e);
    }
    Ok(Admin)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::HeaderValue;
  use rand_core::OsRng;

  fn config(password: &str) -> AuthConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    AuthConfig {
      username:      "admin".to_string(),
      password_hash: hash,
    }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[test]
  fn correct_credentials() {
    let cfg = config("secret");
    assert!(verify_auth(&headers(&basic("admin", "secret")), &cfg).is_ok());
  }

  #[test]
  fn wrong_password() {
    let cfg = config("secret");
    assert!(matches!(
      verify_auth(&headers(&basic("admin", "wrong")), &cfg),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn wrong_username() {
    let cfg = config("secret");
    assert!(matches!(
      verify_auth(&headers(&basic("mallory", "secret")), &cfg),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn missing_header() {
    let cfg = config("secret");
    assert!(matches!(verify_auth(&HeaderMap::new(), &cfg), Err(ApiError::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let cfg = config("secret");
    assert!(matches!(
      verify_auth(&headers("Basic !!!not-base64!!!"), &cfg),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn credentials_without_colon() {
    let cfg = config("secret");
    let value = format!("Basic {}", B64.encode("adminsecret"));
    assert!(matches!(verify_auth(&headers(&value), &cfg), Err(ApiError::Unauthorized)));
  }
}
