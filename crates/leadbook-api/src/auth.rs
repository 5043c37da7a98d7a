//! Bearer-token issuance and verification, and password hashing.
//!
//! Tokens are HS256 JWTs carrying the account id and email. Passwords are
//! stored as argon2 PHC strings.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use std::sync::LazyLock;

use axum::http::{HeaderMap, header};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use leadbook_core::account::Account;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;

/// Claims carried by every issued token. Inserted into request extensions
/// once the guard has verified the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  /// Account id.
  pub sub:   Uuid,
  pub email: String,
  pub iat:   i64,
  pub exp:   i64,
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// A token lifetime that cannot be represented as an expiry timestamp.
#[derive(Debug, Error)]
#[error("token lifetime of {0} seconds is out of range")]
pub struct TtlOutOfRange(pub u64);

pub struct TokenService {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl:        TimeDelta,
}

impl TokenService {
  /// Fails when `ttl_secs` would put token expiry past the representable
  /// date range.
  pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self, TtlOutOfRange> {
    let ttl = i64::try_from(ttl_secs)
      .ok()
      .and_then(TimeDelta::try_seconds)
      .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
      .ok_or(TtlOutOfRange(ttl_secs))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    Ok(Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation,
      ttl,
    })
  }

  /// Issue a token for `account`, valid from now for the configured TTL.
  pub fn issue(&self, account: &Account) -> Result<String, ApiError> {
    self.sign(&self.claims_for(account, Utc::now())?)
  }

  fn claims_for(&self, account: &Account, now: DateTime<Utc>) -> Result<Claims, ApiError> {
    let exp = now
      .checked_add_signed(self.ttl)
      .ok_or_else(|| ApiError::Internal("token expiry out of range".into()))?;
    Ok(Claims {
      sub:   account.id,
      email: account.email.clone(),
      iat:   now.timestamp(),
      exp:   exp.timestamp(),
    })
  }

  fn sign(&self, claims: &Claims) -> Result<String, ApiError> {
    jsonwebtoken::encode(&Header::default(), claims, &self.encoding)
      .map_err(|e| ApiError::Internal(Box::new(e)))
  }

  /// Check signature and expiry.
  pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
    jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
      .map(|data| data.claims)
      .map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        let message = match e.kind() {
          ErrorKind::ExpiredSignature => "Token expired",
          _ => "Invalid token",
        };
        ApiError::Unauthorized(message.into())
      })
  }
}

/// The token in an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Verified against when a login names no account, so both outcomes cost one
/// argon2 run.
pub(crate) static DUMMY_PASSWORD_HASH: LazyLock<String> =
  LazyLock::new(|| hash_password("leadbook-no-such-account").unwrap_or_default());

/// `true` when `password` matches the PHC string. Malformed hashes never
/// match.
pub fn verify_password(password_hash: &str, password: &str) -> bool {
  PasswordHash::new(password_hash).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn account() -> Account {
    Account {
      id:            Uuid::new_v4(),
      email:         "ops@example.com".into(),
      name:          "Ops".into(),
      password_hash: String::new(),
      created_at:    Utc::now(),
    }
  }

  #[test]
  fn issued_token_verifies() {
    let tokens = TokenService::new(b"test-secret", 3600).unwrap();
    let account = account();

    let claims = tokens.verify(&tokens.issue(&account).unwrap()).unwrap();
    assert_eq!(claims.sub, account.id);
    assert_eq!(claims.email, "ops@example.com");
    assert_eq!(claims.exp - claims.iat, 3600);
  }

  #[test]
  fn token_from_other_secret_is_rejected() {
    let ours = TokenService::new(b"ours", 3600).unwrap();
    let theirs = TokenService::new(b"theirs", 3600).unwrap();
    let token = theirs.issue(&account()).unwrap();
    assert!(matches!(ours.verify(&token), Err(ApiError::Unauthorized(m)) if m == "Invalid token"));
  }

  #[test]
  fn expired_token_is_rejected() {
    let tokens = TokenService::new(b"test-secret", 3600).unwrap();
    let issued = Utc::now() - TimeDelta::hours(3);
    let token = tokens.sign(&tokens.claims_for(&account(), issued).unwrap()).unwrap();
    assert!(matches!(tokens.verify(&token), Err(ApiError::Unauthorized(m)) if m == "Token expired"));
  }

  #[test]
  fn out_of_range_lifetimes_are_rejected() {
    // Fits in an i64 but not in a TimeDelta.
    assert!(TokenService::new(b"s", 10_000_000_000_000_000).is_err());
    // Fits in a TimeDelta but overflows the expiry date.
    assert!(TokenService::new(b"s", 9_000_000_000_000).is_err());
    assert!(TokenService::new(b"s", u64::MAX).is_err());
    assert!(TokenService::new(b"s", 30 * 24 * 3600).is_ok());
  }

  #[test]
  fn expiry_overflow_is_an_error() {
    let tokens = TokenService::new(b"test-secret", 3600).unwrap();
    assert!(tokens.claims_for(&account(), DateTime::<Utc>::MAX_UTC).is_err());
  }

  #[test]
  fn garbage_token_is_rejected() {
    let tokens = TokenService::new(b"test-secret", 3600).unwrap();
    assert!(tokens.verify("not.a.jwt").is_err());
  }

  #[test]
  fn bearer_extraction() {
    let mut headers = HeaderMap::new();
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
    assert_eq!(bearer_token(&headers), Some("abc.def"));
  }

  #[test]
  fn dummy_hash_is_a_real_argon2_hash() {
    assert!(PasswordHash::new(&DUMMY_PASSWORD_HASH).is_ok());
    assert!(!verify_password(&DUMMY_PASSWORD_HASH, "hunter22"));
  }

  #[test]
  fn password_round_trip() {
    let hash = hash_password("hunter22").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password(&hash, "hunter22"));
    assert!(!verify_password(&hash, "hunter23"));
    assert!(!verify_password("not-a-phc-string", "hunter22"));
  }
}
