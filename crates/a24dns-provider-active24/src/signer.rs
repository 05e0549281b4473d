//! Request signing for Active24 REST API v2
//!
//! Each request is signed over `"{METHOD} {PATH} {UNIX_TIMESTAMP}"` with
//! HMAC-SHA1 keyed by the API secret. The query string is not part of the
//! canonical string. The hex signature becomes the password of an HTTP Basic
//! credential, and `X-Date` carries the same instant.

use a24dns_core::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// `X-Date` format: `YYYYMMDDTHHMMSSZ`
const X_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Header values for one signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Full `Authorization` value, `Basic ...`
    pub authorization: String,
    /// `X-Date` value
    pub x_date: String,
}

/// Canonical string for `method` and `path` at `timestamp`
///
/// Anything after `?` in `path` is dropped.
pub fn canonical_string(method: &str, path: &str, timestamp: i64) -> String {
    let path = path.split_once('?').map_or(path, |(path, _)| path);
    format!("{} {} {}", method.to_ascii_uppercase(), path, timestamp)
}

/// Hex HMAC-SHA1 of `canonical` keyed by `secret`
pub fn signature(secret: &str, canonical: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::config(format!("invalid signing key: {}", e)))?;
    mac.update(canonical.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Sign a request made at `now`
pub fn sign(
    api_key: &str,
    secret: &str,
    method: &str,
    path: &str,
    now: DateTime<Utc>,
) -> Result<SignedHeaders> {
    let canonical = canonical_string(method, path, now.timestamp());
    let signature = signature(secret, &canonical)?;
    let credentials = STANDARD.encode(format!("{}:{}", api_key, signature));

    Ok(SignedHeaders {
        authorization: format!("Basic {}", credentials),
        x_date: now.format(X_DATE_FORMAT).to_string(),
    })
}
