use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::debug;

use crate::php::unserialize_session;
use crate::types::{RawSession, Request};

/// Parse a single session file. The record id is the file name with `prefix` removed.
pub fn parse_session(path: &Path, prefix: &str) -> Result<RawSession> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    let id = file_name.strip_prefix(prefix).unwrap_or(file_name);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to open session file: {:?}", path))?;

    decode_session(id, &content)
}

/// Decode one session record. A record starting with `{` is JSON; anything else
/// is read as a PHP session file.
pub fn decode_session(id: &str, content: &str) -> Result<RawSession> {
    let value: Value = if content.trim_start().starts_with('{') {
        serde_json::from_str(content)
            .with_context(|| format!("Failed to parse session record {}", id))?
    } else {
        unserialize_session(content)
            .with_context(|| format!("Failed to parse session record {}", id))?
    };
    let obj = value
        .as_object()
        .with_context(|| format!("Session record {} is not an object", id))?;

    // Anything but a string counts as "no user agent".
    let useragent = obj
        .get("useragent")
        .and_then(Value::as_str)
        .map(str::to_string);

    let visits = obj
        .get("visits")
        .and_then(Value::as_u64)
        .with_context(|| format!("Session record {} has no valid `visits`", id))?;
    let last = obj
        .get("last")
        .and_then(Value::as_i64)
        .with_context(|| format!("Session record {} has no valid `last`", id))?;

    let mut history = match obj.get("history") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(seq, item)| decode_request(id, seq as u32, item))
            .collect::<Result<Vec<_>>>()?,
        Some(Value::Object(items)) => decode_keyed_history(id, items)?,
        Some(_) => anyhow::bail!("Session record {} has a malformed `history`", id),
    };
    history.sort_by_key(|r| r.seq);

    let user = obj.get("user").filter(|v| !v.is_null()).cloned();

    Ok(RawSession {
        id: id.to_string(),
        useragent,
        visits,
        last,
        history,
        user,
    })
}

fn decode_keyed_history(id: &str, items: &Map<String, Value>) -> Result<Vec<Request>> {
    items
        .iter()
        .map(|(key, item)| {
            let seq: u32 = key
                .parse()
                .with_context(|| format!("Session record {} has history key {:?}", id, key))?;
            decode_request(id, seq, item)
        })
        .collect()
}

fn decode_request(id: &str, seq: u32, item: &Value) -> Result<Request> {
    let timestamp = item
        .get("timestamp")
        .and_then(Value::as_i64)
        .with_context(|| format!("Request {} of session {} has no valid `timestamp`", seq, id))?;

    let host = match item.get("host") {
        None | Some(Value::Null) => None,
        Some(Value::String(host)) => Some(host.clone()),
        Some(other) => {
            debug!(session = id, seq, host = %other, "Ignoring non-string host");
            None
        }
    };

    let address = item
        .get("address")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Request {
        seq,
        timestamp,
        host,
        address,
        session: id.to_string(),
    })
}
