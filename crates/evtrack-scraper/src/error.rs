use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Network, TLS, timeout or body-read failure from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429, or throttling reported inside the response body.
    #[error("rate limited by {provider}{}", retry_after_suffix(.retry_after_secs))]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// A continuation token was used before the provider activated it.
    #[error("continuation token from {provider} is not ready yet")]
    PageTokenPending { provider: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The provider answered 2xx but refused the request in-band.
    #[error("{provider} refused the request ({status}): {message}")]
    Provider {
        provider: String,
        status: String,
        message: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("pagination limit reached for {url}: exceeded {max_pages} pages")]
    PaginationLimit { url: String, max_pages: usize },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

fn retry_after_suffix(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs
        .map(|s| format!(" (retry after {s}s)"))
        .unwrap_or_default()
}
