//! Admin API authentication via timestamp and hash validation
//!
//! # Scheme
//!
//! - Every admin request carries `timestamp` (Unix epoch ms) and `hash`
//!   (SHA-256, 64 hex chars): inside the JSON body for requests with a body,
//!   as query parameters otherwise.
//! - The hash is computed over the canonical JSON of a signing document
//!   ([`signing_document`]: method, target, timestamp, body) with the hash
//!   field replaced by 64 zeros, followed by the shared secret as a decimal
//!   i64. Binding method and target means a signature for one route cannot
//!   be reused on another.
//! - The shared secret lives in the `settings` table under
//!   `api_shared_secret`. The value 0 disables authentication.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[cfg(feature = "sqlx")]
use sqlx::SqlitePool;

/// Placeholder substituted for the hash field before hashing
const DUMMY_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Allowed clock skew for timestamps from the future
const MAX_FUTURE_SKEW_MS: i64 = 1000;

/// Authentication error types
#[derive(Debug, Clone, Error)]
pub enum ApiAuthError {
    /// Timestamp outside acceptable window
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        reason: String,
    },

    /// Hash does not match calculated value
    #[error("Invalid hash")]
    InvalidHash { provided: String, calculated: String },

    /// Database error loading shared secret
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Load shared secret from the settings table, generating one on first use
#[cfg(feature = "sqlx")]
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'api_shared_secret'")
            .fetch_optional(db)
            .await
            .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    match result {
        Some((value,)) => value
            .parse::<i64>()
            .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid i64: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate and store a non-zero random shared secret
#[cfg(feature = "sqlx")]
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    use rand::Rng;

    let secret: i64 = {
        let mut rng = rand::thread_rng();
        loop {
            let val = rng.gen::<i64>();
            if val != 0 {
                break val;
            }
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES ('api_shared_secret', ?)")
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Validate that a request timestamp is recent
///
/// Accepts timestamps at most `max_age_ms` in the past and at most one second
/// in the future (clock drift).
///
/// ```
/// use aiwd_common::api::auth::validate_timestamp;
/// use std::time::{SystemTime, UNIX_EPOCH};
///
/// let now = SystemTime::now()
///     .duration_since(UNIX_EPOCH)
///     .unwrap()
///     .as_millis() as i64;
///
/// assert!(validate_timestamp(now, 30_000).is_ok());
/// assert!(validate_timestamp(now - 60_000, 30_000).is_err());
/// ```
pub fn validate_timestamp(timestamp: i64, max_age_ms: i64) -> Result<(), ApiAuthError> {
    let now = now_millis();
    let diff = now - timestamp;

    if diff > max_age_ms {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms past)", diff, max_age_ms),
        });
    }

    if diff < -MAX_FUTURE_SKEW_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                diff.abs(),
                MAX_FUTURE_SKEW_MS
            ),
        });
    }

    Ok(())
}

/// Calculate the request hash
///
/// 1. Replace hash field with 64 zeros
/// 2. Convert to canonical JSON (sorted keys, no whitespace)
/// 3. Append shared secret as decimal string
/// 4. SHA-256, hex encoded
///
/// ```
/// use aiwd_common::api::auth::calculate_hash;
/// use serde_json::json;
///
/// let body = json!({"text_type": "essay", "timestamp": 1730000000000i64, "hash": "x"});
/// let hash = calculate_hash(&body, 123456789);
/// assert_eq!(hash.len(), 64);
/// ```
pub fn calculate_hash(json_value: &Value, shared_secret: i64) -> String {
    let mut value = json_value.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(DUMMY_HASH.to_string()));
    }

    let canonical = to_canonical_json(&value);
    let to_hash = format!("{}{}", canonical, shared_secret);

    let mut hasher = Sha256::new();
    hasher.update(to_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Convert JSON to canonical form (sorted keys, no whitespace)
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let items: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("\"{}\":{}", k, to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    }
}

/// Request target covered by the hash: path plus query string, with the
/// `timestamp` and `hash` parameters removed and the rest kept in order
///
/// ```
/// use aiwd_common::api::auth::signed_target;
///
/// assert_eq!(
///     signed_target("/admin/analysis-records", Some("limit=5&timestamp=1&hash=ab")),
///     "/admin/analysis-records?limit=5"
/// );
/// assert_eq!(signed_target("/admin/analysis-configs", None), "/admin/analysis-configs");
/// ```
pub fn signed_target(path: &str, query: Option<&str>) -> String {
    let kept: Vec<&str> = query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            !pair.is_empty() && key != "timestamp" && key != "hash"
        })
        .collect();

    if kept.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, kept.join("&"))
    }
}

/// Document hashed for one admin request
///
/// `body` is the JSON payload when the request has one; its own `hash`
/// field is left out.
pub fn signing_document(method: &str, target: &str, timestamp: i64, body: Option<&Value>) -> Value {
    let body = match body {
        Some(Value::Object(map)) => {
            let mut map = map.clone();
            map.remove("hash");
            Value::Object(map)
        }
        Some(other) => other.clone(),
        None => Value::Null,
    };

    json!({
        "method": method.to_ascii_uppercase(),
        "target": target,
        "timestamp": timestamp,
        "body": body,
        "hash": "",
    })
}

/// Validate hash matches calculated value
pub fn validate_hash(
    provided_hash: &str,
    json_value: &Value,
    shared_secret: i64,
) -> Result<(), ApiAuthError> {
    let calculated = calculate_hash(json_value, shared_secret);

    if provided_hash != calculated {
        return Err(ApiAuthError::InvalidHash {
            provided: provided_hash.to_string(),
            calculated,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_window() {
        let now = now_millis();

        assert!(validate_timestamp(now, 1000).is_ok());
        assert!(validate_timestamp(now - 500, 1000).is_ok());
        assert!(validate_timestamp(now - 5000, 1000).is_err());

        assert!(validate_timestamp(now + 500, 1000).is_ok());
        assert!(validate_timestamp(now + 5000, 1000).is_err());
    }

    #[test]
    fn test_hash_ignores_provided_hash_value() {
        let a = serde_json::json!({"timestamp": 1i64, "hash": "aaa"});
        let b = serde_json::json!({"timestamp": 1i64, "hash": "bbb"});
        assert_eq!(calculate_hash(&a, 42), calculate_hash(&b, 42));
        assert_ne!(calculate_hash(&a, 42), calculate_hash(&a, 43));
    }

    #[test]
    fn test_canonical_json_sorting_and_whitespace() {
        let json = serde_json::json!({
            "z_field": "last",
            "a_field": [1, 2],
            "m_field": {"b": true, "a": null}
        });

        let canonical = to_canonical_json(&json);
        assert_eq!(
            canonical,
            r#"{"a_field":[1,2],"m_field":{"a":null,"b":true},"z_field":"last"}"#
        );
    }

    #[test]
    fn test_signing_document_binds_method_and_target() {
        let get = signing_document("get", "/admin/analysis-configs", 1, None);
        let delete = signing_document("DELETE", "/admin/analysis-configs", 1, None);
        let other_path = signing_document("GET", "/admin/analysis-records", 1, None);

        assert_eq!(get["method"], "GET");
        assert_ne!(calculate_hash(&get, 42), calculate_hash(&delete, 42));
        assert_ne!(calculate_hash(&get, 42), calculate_hash(&other_path, 42));
    }

    #[test]
    fn test_signing_document_ignores_body_hash() {
        let a = serde_json::json!({"text_type": "essay", "timestamp": 5, "hash": "aaa"});
        let b = serde_json::json!({"text_type": "essay", "timestamp": 5, "hash": "bbb"});
        let doc_a = signing_document("POST", "/admin/analysis-configs", 5, Some(&a));
        let doc_b = signing_document("POST", "/admin/analysis-configs", 5, Some(&b));
        assert_eq!(calculate_hash(&doc_a, 7), calculate_hash(&doc_b, 7));
        assert!(doc_a["body"].get("hash").is_none());
    }

    #[test]
    fn test_signed_target_keeps_other_parameters() {
        assert_eq!(
            signed_target("/x", Some("hash=ab&limit=5&timestamp=9&page=2")),
            "/x?limit=5&page=2"
        );
        assert_eq!(signed_target("/x", Some("timestamp=9&hash=ab")), "/x");
        assert_eq!(signed_target("/x", Some("")), "/x");
    }

    #[test]
    fn test_validate_hash_roundtrip() {
        let body = serde_json::json!({
            "text_type": "essay",
            "timestamp": 1730000000000i64,
            "hash": "dummy"
        });
        let secret = 123456789i64;
        let calculated = calculate_hash(&body, secret);

        assert!(validate_hash(&calculated, &body, secret).is_ok());
        assert!(validate_hash(DUMMY_HASH, &body, secret).is_err());
    }
}
