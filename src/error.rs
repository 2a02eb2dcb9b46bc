use std::fmt;
use std::io;

use reqwest::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::bounded::is_max_size_exceeded;
use crate::fundraiser::CREATE_FUNDRAISER_ENDPOINT;

#[derive(Debug, Error)]
pub enum Error {
    /// Writing a required or optional field into the request body failed
    /// before anything was sent.
    #[error("error encoding request: {0}")]
    Encoding(String),
    /// A cover photo stream grew past [`COVER_PHOTO_MAX_SIZE`].
    ///
    /// [`COVER_PHOTO_MAX_SIZE`]: crate::COVER_PHOTO_MAX_SIZE
    #[error("max size exceeded")]
    MaxSizeExceeded,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(io::Error),
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
    /// The platform reported a structured error payload. See [`GraphError`].
    #[error(transparent)]
    Graph(GraphError),
    /// Unexpected status with no `error` payload to decode.
    #[error("invalid response: {0}")]
    InvalidResponse(StatusCode),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true when the failure means the cover photo was rejected:
    /// either the local size cap fired while streaming the image, or the
    /// platform turned the request away with one of its photo-upload error
    /// codes on the fundraiser-creation endpoint.
    ///
    /// This is the only place the platform's numeric error codes are
    /// interpreted; treat other platform errors opaquely or go through
    /// [`Error::error_messages`].
    pub fn is_cover_photo_rejected(&self) -> bool {
        match self {
            Error::MaxSizeExceeded => true,
            Error::Graph(e) if e.endpoint == CREATE_FUNDRAISER_ENDPOINT => {
                let (code, subcode) = e.codes();
                // 100/1366046: unsupported format or image larger than 4 MB.
                // 100/1366055: per-dimension or total pixel limits exceeded.
                e.status == StatusCode::BAD_REQUEST
                    && code == 100
                    && (subcode == 1366046 || subcode == 1366055)
            }
            _ => false,
        }
    }

    /// Platform `code` and `error_subcode`, or `(0, 0)` for any error that
    /// did not come back from the platform.
    pub fn error_codes(&self) -> (i64, i64) {
        match self {
            Error::Graph(e) => e.codes(),
            _ => (0, 0),
        }
    }

    /// Platform `message`, `error_user_title` and `error_user_msg`. For
    /// non-platform errors the first element is the `Display` rendering and
    /// the user-facing fields are empty.
    pub fn error_messages(&self) -> (String, String, String) {
        match self {
            Error::Graph(e) => e.messages(),
            other => (other.to_string(), String::new(), String::new()),
        }
    }

    pub(crate) fn from_read_error(err: io::Error) -> Self {
        if is_max_size_exceeded(&err) {
            Error::MaxSizeExceeded
        } else {
            Error::Io(err)
        }
    }
}

/// One failed API call as reported by the platform: the endpoint that was
/// hit, the HTTP status received, and the decoded `error` object from the
/// response body.
///
/// Only constructed when the status did not match the expected success
/// status and the body carried a genuine `error` object; every other failure
/// mode surfaces as one of the plainer [`Error`] variants.
#[derive(Debug, Clone)]
pub struct GraphError {
    pub endpoint: &'static str,
    pub status: StatusCode,
    pub error: Map<String, Value>,
}

impl GraphError {
    /// Numeric `code` and `error_subcode` fields, zero when absent or not
    /// numeric.
    pub fn codes(&self) -> (i64, i64) {
        (self.int_field("code"), self.int_field("error_subcode"))
    }

    /// `message`, `error_user_title` and `error_user_msg` fields, empty when
    /// absent or not strings.
    pub fn messages(&self) -> (String, String, String) {
        (
            self.str_field("message"),
            self.str_field("error_user_title"),
            self.str_field("error_user_msg"),
        )
    }

    fn int_field(&self, key: &str) -> i64 {
        match self.error.get(key) {
            Some(value) => value
                .as_i64()
                .or_else(|| value.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            None => 0,
        }
    }

    fn str_field(&self, key: &str) -> String {
        self.error
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.endpoint,
            self.status.as_u16(),
            Value::Object(self.error.clone())
        )
    }
}

impl std::error::Error for GraphError {}
