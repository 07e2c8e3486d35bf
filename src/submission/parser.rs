use axum::http::HeaderMap;
use serde_json::{Map, Value};

use super::SubmissionData;

/// Parse a submission body based on the Content-Type header.
///
/// Only objects are accepted: a submission is always a field map.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<SubmissionData, String> {
    let ct = content_type.unwrap_or("application/json");

    let value = if ct.contains("application/json") {
        serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)?
    } else if ct.contains("multipart/form-data") {
        return Err("multipart".to_string());
    } else {
        // Try JSON first, then form-urlencoded
        serde_json::from_slice(body)
            .or_else(|_| parse_form_urlencoded(body))
            .map_err(|e| format!("Unable to parse body: {e}"))?
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err("Submission must be an object of fields".to_string()),
    }
}

/// Urlencoded pairs in order, with bracketed names expanded by
/// [`push_field`].
fn parse_form_urlencoded(body: &[u8]) -> Result<Value, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;

    let mut map = Map::new();
    for (k, v) in form_urlencoded::parse(body_str.as_bytes()) {
        push_field(&mut map, &k, v.into_owned());
    }
    Ok(Value::Object(into_lists(map)))
}

/// Splits `a[b][]` into `a` and `["b", ""]`. Names that are not a base
/// followed only by bracket pairs are taken literally.
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let literal = (key, Vec::new());
    let Some(open) = key.find('[') else {
        return literal;
    };
    if open == 0 {
        return literal;
    }

    let (base, mut rest) = key.split_at(open);
    let mut segments = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return literal;
        };
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    if !rest.is_empty() {
        return literal;
    }
    (base, segments)
}

/// Inserts one field, building nested objects for bracketed names the way
/// browsers submit them: `a[b]` is a key of `a`, `a[]` takes the next
/// position. Positions stay object keys until [`into_lists`] runs.
fn push_field(map: &mut Map<String, Value>, key: &str, value: String) {
    let (base, segments) = split_key(key);
    let Some((last, parents)) = segments.split_last() else {
        map.insert(key.to_string(), Value::String(value));
        return;
    };

    let mut slot = map
        .entry(base.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    for segment in parents {
        let container = as_object(slot);
        let key = slot_key(container, segment);
        slot = container
            .entry(key)
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let container = as_object(slot);
    let key = slot_key(container, last);
    container.insert(key, Value::String(value));
}

fn slot_key(container: &Map<String, Value>, segment: &str) -> String {
    if segment.is_empty() {
        container.len().to_string()
    } else {
        segment.to_string()
    }
}

/// The object in `slot`, replacing a scalar that was there before.
fn as_object(slot: &mut Value) -> &mut Map<String, Value> {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot holds an object"),
    }
}

/// Turns every nested object keyed exactly `0..n` in order into a list.
fn into_lists(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (key, listify(value)))
        .collect()
}

fn listify(value: Value) -> Value {
    let Value::Object(map) = value else {
        return value;
    };
    let sequential = !map.is_empty()
        && map
            .keys()
            .enumerate()
            .all(|(i, key)| *key == i.to_string());
    if sequential {
        Value::Array(map.into_iter().map(|(_, v)| listify(v)).collect())
    } else {
        Value::Object(into_lists(map))
    }
}

/// Parse the text fields of a multipart form using multer.
///
/// Documents are uploaded separately and referenced by file id, so file
/// parts are ignored here.
pub async fn parse_multipart(headers: &HeaderMap, body: bytes::Bytes) -> Result<SubmissionData, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut map = Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        if field.file_name().is_some() {
            continue;
        }
        let name = field.name().unwrap_or("unknown").to_string();
        let value = field
            .text()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        push_field(&mut map, &name, value);
    }

    Ok(into_lists(map))
}
