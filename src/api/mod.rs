pub mod accounts;
pub mod chats;
pub mod messages;
pub mod wire;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

pub use accounts::{Account, Contact};
pub use chats::{
    ArchiveResult, ChatSearchParams, ChatSearchResult, ChatTypeFilter, CreateChatParams,
    CreateChatResult, Inbox,
};
pub use messages::{
    ChatType, Direction, MessageItem, MessageListParams, MessageListResult, MessageSearchParams,
    MessageSearchResult, SendParams, SendResult,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid base url {url:?}: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Thin client for the Beeper Desktop API. Every call is bounded by the
/// configured timeout and is never retried.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    token: String,
    timeout: Option<Duration>,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: String, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base_url = parse_base_url(base_url)?;
        // The desktop API is local; system proxies are bypassed.
        let http = Client::builder().no_proxy().build()?;
        Ok(Self {
            base_url,
            token,
            timeout,
            http,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::BaseUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(method = "GET", path = url.path(), params = query.len(), "api request");
        let request = self.http.get(url).bearer_auth(&self.token).query(query);
        let body = self.send(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        payload: &B,
    ) -> Result<T, ApiError> {
        let body = self.post_raw(segments, payload).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_raw<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        payload: &B,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(method = "POST", path = url.path(), "api request");
        let request = self.http.post(url).bearer_auth(&self.token).json(payload);
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        self.with_timeout(async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            debug!(status = status.as_u16(), bytes = body.len(), "api response");
            if !status.is_success() {
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    message: error_message(&body, status.canonical_reason()),
                });
            }
            Ok(body.to_vec())
        })
        .await
    }

    async fn with_timeout<F, T>(&self, future: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, future)
                .await
                .map_err(|_| ApiError::Timeout(limit))?,
            None => future.await,
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let invalid = |reason: String| ApiError::BaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("cannot be a base".to_string()));
    }
    Ok(url)
}

fn error_message(body: &[u8], reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_slice::<wire::ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error).filter(|m| !m.trim().is_empty()) {
            return message;
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() {
        return text.chars().take(200).collect();
    }
    reason.unwrap_or("no response body").to_string()
}

/// RFC3339 in UTC with second precision; empty for missing or zero instants.
pub(crate) fn rfc3339(value: Option<DateTime<Utc>>) -> String {
    match value {
        Some(dt) if !is_zero_time(&dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        _ => String::new(),
    }
}

fn is_zero_time(dt: &DateTime<Utc>) -> bool {
    dt.year() <= 1 || dt.timestamp() == 0
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
