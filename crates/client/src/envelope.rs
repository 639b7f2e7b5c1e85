//! Response normalization.
//!
//! The backend answers in a few shapes: a `{status_code, status, message,
//! data}` envelope or the bare payload, and lists either as a bare array or
//! as a page object (`{invoices: [...], total, page, limit, pages}`). Every
//! shape is reduced here so callers only see typed payloads. Anything else is
//! an [`ClientError::UnexpectedShape`].

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientError;

#[derive(Debug, Default, Deserialize)]
struct EnvelopeHead {
    #[serde(default, alias = "statusCode")]
    status_code: Option<u16>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl EnvelopeHead {
    fn failed(&self) -> bool {
        let bad_status = self.status.as_deref().is_some_and(|s| {
            s.eq_ignore_ascii_case("error") || s.eq_ignore_ascii_case("fail") || s.eq_ignore_ascii_case("failed")
        });
        bad_status || self.status_code.is_some_and(|c| c >= 400)
    }
}

fn is_envelope(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("data")
        && (map.contains_key("status") || map.contains_key("status_code") || map.contains_key("statusCode"))
}

/// Strip the envelope if there is one, surfacing envelope-level failures.
pub fn open(body: Value) -> Result<Value, ClientError> {
    match body {
        Value::Object(mut map) if is_envelope(&map) => {
            let data = map.remove("data").unwrap_or(Value::Null);
            let head: EnvelopeHead = serde_json::from_value(Value::Object(map))
                .map_err(|e| ClientError::UnexpectedShape(format!("envelope: {e}")))?;
            if head.failed() {
                let message = head
                    .message
                    .unwrap_or_else(|| "request failed".to_string());
                return Err(ClientError::Rejected(message));
            }
            Ok(data)
        }
        other => Ok(other),
    }
}

/// A page of results, keyed by whatever the endpoint calls its items.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(
        alias = "invoices",
        alias = "receipts",
        alias = "customers",
        alias = "approvals",
        alias = "history"
    )]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Paged(Page<T>),
}

pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ClientError> {
    let payload = open(body)?;
    serde_json::from_value(payload).map_err(|e| ClientError::UnexpectedShape(e.to_string()))
}

pub fn decode_list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, ClientError> {
    let payload = open(body)?;
    if payload.is_null() {
        return Ok(Vec::new());
    }
    match serde_json::from_value::<Listing<T>>(payload) {
        Ok(Listing::Bare(items)) | Ok(Listing::Paged(Page { items })) => Ok(items),
        Err(e) => Err(ClientError::UnexpectedShape(e.to_string())),
    }
}

/// Best-effort message from an error response body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error", "detail"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}
