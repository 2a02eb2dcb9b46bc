use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::Form;
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};

use crate::fundraiser::{CREATE_FUNDRAISER_ENDPOINT, CreateFundraiserParams, FundraiserOption};
use crate::logger::Logger;
use crate::response::classify_response;
use crate::{Error, Result};

pub(crate) const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v2.8";
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

pub(crate) fn default_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

pub(crate) fn join_endpoint(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base}/{endpoint}")
}

/// HTTP client for the platform's fundraiser API.
///
/// Holds no per-call state; clones share the underlying connection pool and
/// calls may run concurrently on the same instance.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    logger: Option<Arc<dyn Logger>>,
    debug: bool,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    pub fn new() -> Self {
        Self {
            http: default_http_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            logger: None,
            debug: false,
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Adds logging of failed API calls. With `debug` set, every call is
    /// logged.
    pub fn with_logger(mut self, logger: impl Logger + 'static, debug: bool) -> Self {
        self.logger = Some(Arc::new(logger));
        self.debug = debug;
        self
    }

    /// Creates a new fundraiser.
    ///
    /// Required parameters are set with `params`, optional fields and the
    /// cover photo with `options`, applied in order. The whole request body
    /// is encoded client-side before dispatch, so a failing option aborts
    /// with nothing sent. On success returns the decoded response object.
    pub async fn create_fundraiser(
        &self,
        params: CreateFundraiserParams,
        options: Vec<FundraiserOption>,
    ) -> Result<Map<String, Value>> {
        let end_time = params.unix_end_time()?;
        let access_token = params.access_token;

        let mut form = Form::new()
            .text("charity_id", params.charity_id)
            .text("name", params.title)
            .text("description", params.description)
            .text("goal_amount", params.goal.to_string())
            .text("currency", params.currency)
            .text("end_time", end_time.to_string())
            .text("external_id", params.external_id)
            .text("fundraiser_type", "person_for_charity");
        for option in options {
            form = option.apply(form).await?;
        }

        let url = join_endpoint(&self.base_url, "me/fundraisers");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&access_token)
            .multipart(form)
            .send()
            .await?;

        self.read_response(
            CREATE_FUNDRAISER_ENDPOINT,
            Method::POST,
            &url,
            response,
            StatusCode::OK,
        )
        .await
    }

    async fn read_response(
        &self,
        endpoint: &'static str,
        method: Method,
        url: &str,
        response: reqwest::Response,
        expected: StatusCode,
    ) -> Result<Map<String, Value>> {
        let status = response.status();
        // Skip the read only on a known zero length; an absent content-length
        // can still carry a streamed body.
        let body = if response.content_length() == Some(0) {
            Ok(Bytes::new())
        } else {
            response.bytes().await
        };
        let (body, result) = match body {
            Ok(bytes) => {
                let result = classify_response(endpoint, expected, status, &bytes);
                (bytes, result)
            }
            Err(err) => (Bytes::new(), Err(Error::Http(err))),
        };

        if let Some(logger) = self.logger.as_deref() {
            if self.debug || result.is_err() {
                let text = String::from_utf8_lossy(&body);
                let status = status.as_u16();
                if text.is_empty() {
                    logger.log(&format!("graph api {method} request to {url} returned {status}"));
                } else {
                    logger.log(&format!(
                        "graph api {method} request to {url} returned {status} {text}"
                    ));
                }
            }
        }

        result
    }
}
