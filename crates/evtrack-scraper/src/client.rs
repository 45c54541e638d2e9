//! Shared HTTP plumbing for every upstream provider.
//!
//! One [`FetchClient`] exists per provider. It owns that provider's request
//! spacing and retry policy, turns HTTP and in-band failures into
//! [`FetchError`], and follows continuation-token pagination.

use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::FetchError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::throttle::RequestSpacing;

/// Hard cap on continuation-token pages, guarding against cycling tokens.
///
/// Each page may itself be retried, so the worst-case request count is
/// `MAX_PAGES * (1 + max_retries)`.
pub const MAX_PAGES: usize = 10;

/// Query parameters whose values never appear in logs or errors.
const SECRET_PARAMS: &[&str] = &["key"];

/// Inspects a decoded 2xx body for provider-level failures. The flag is
/// `true` when the request carried a continuation token.
pub type StatusCheck = fn(&Value, bool) -> Result<(), FetchError>;

/// Connection and pacing settings for one provider.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub retry: RetryPolicy,
    pub min_interval_ms: u64,
    pub page_token_delay_ms: u64,
}

pub struct FetchClient {
    client: Client,
    provider: String,
    retry: RetryPolicy,
    spacing: RequestSpacing,
    page_token_delay: Duration,
    status_check: Option<StatusCheck>,
}

impl FetchClient {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(provider: &str, settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            provider: provider.to_owned(),
            retry: settings.retry,
            spacing: RequestSpacing::new(Duration::from_millis(settings.min_interval_ms)),
            page_token_delay: Duration::from_millis(settings.page_token_delay_ms),
            status_check: None,
        })
    }

    #[must_use]
    pub fn with_status_check(mut self, check: StatusCheck) -> Self {
        self.status_check = Some(check);
        self
    }

    /// GET `url` and decode the body as JSON, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`FetchError::RateLimited`] when throttling persists past the retry budget.
    /// - [`FetchError::UnexpectedStatus`] for a non-2xx status (5xx after retries).
    /// - [`FetchError::Http`] on network failure after retries.
    /// - [`FetchError::Deserialize`] if the body is not JSON.
    /// - [`FetchError::Provider`] if the status check rejects the body.
    pub async fn get_json(&self, url: &Url) -> Result<Value, FetchError> {
        self.fetch(url, false).await
    }

    /// Fetch `first` and every following page, appending `token_param` taken
    /// from each body's `token_field`. A fresh token is only used after the
    /// configured page-token delay.
    ///
    /// All-or-nothing: a failing page discards the pages already fetched.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::get_json`] and returns
    /// [`FetchError::PaginationLimit`] past [`MAX_PAGES`] pages.
    pub async fn get_paginated(
        &self,
        first: &Url,
        token_param: &str,
        token_field: &str,
    ) -> Result<Vec<Value>, FetchError> {
        let mut pages = Vec::new();
        let mut token: Option<String> = None;

        loop {
            if pages.len() >= MAX_PAGES {
                return Err(FetchError::PaginationLimit {
                    url: redact(first),
                    max_pages: MAX_PAGES,
                });
            }

            let url = match &token {
                None => first.clone(),
                Some(t) => {
                    if !self.page_token_delay.is_zero() {
                        tokio::time::sleep(self.page_token_delay).await;
                    }
                    let mut next = first.clone();
                    next.query_pairs_mut().append_pair(token_param, t);
                    next
                }
            };

            let body = self.fetch(&url, token.is_some()).await?;
            token = body
                .get(token_field)
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_owned);
            pages.push(body);

            if token.is_none() {
                break;
            }
        }

        Ok(pages)
    }

    async fn fetch(&self, url: &Url, token_request: bool) -> Result<Value, FetchError> {
        retry_with_backoff(&self.retry, || async move {
            self.spacing.wait().await;
            self.request_once(url, token_request).await
        })
        .await
    }

    async fn request_once(&self, url: &Url, token_request: bool) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Http(e.without_url()))?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            return Err(FetchError::RateLimited {
                provider: self.provider.clone(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: redact(url),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.without_url()))?;
        let value: Value = serde_json::from_str(&body).map_err(|e| FetchError::Deserialize {
            context: redact(url),
            source: e,
        })?;

        if let Some(check) = self.status_check {
            check(&value, token_request)?;
        }
        Ok(value)
    }
}

/// Render `url` with secret query values masked.
#[must_use]
pub fn redact(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if SECRET_PARAMS.contains(&k.as_ref()) {
                "***".to_owned()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    if pairs.is_empty() {
        return masked.to_string();
    }
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}
