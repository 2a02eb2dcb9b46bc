use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::error::GraphError;
use crate::{Error, Result};

/// Turns a raw status and body into a decoded mapping or a typed error.
///
/// An empty body decodes to an empty mapping. A status match always wins,
/// even over an error-shaped body. On a mismatch, a [`GraphError`] is built
/// only when the body carries a genuine `error` object; anything else is an
/// invalid response carrying just the status.
pub(crate) fn classify_response(
    endpoint: &'static str,
    expected: StatusCode,
    status: StatusCode,
    body: &[u8],
) -> Result<Map<String, Value>> {
    let result = if body.is_empty() {
        Map::new()
    } else {
        match serde_json::from_slice::<Map<String, Value>>(body) {
            Ok(map) => map,
            Err(err) if status == expected => return Err(Error::Json(err)),
            // The mismatch classification below decides what an unparseable
            // error body becomes.
            Err(_) => Map::new(),
        }
    };
    if status == expected {
        return Ok(result);
    }
    match result.get("error") {
        Some(Value::Object(error)) => Err(Error::Graph(GraphError {
            endpoint,
            status,
            error: error.clone(),
        })),
        _ => Err(Error::InvalidResponse(status)),
    }
}
