//! Blocking HTTP transport seam.
//!
//! The `Transport` trait abstracts the single operation every connector
//! needs — one GET returning a body — so listers and fetchers can be
//! exercised against an in-memory fake in tests.
//!
//! `HttpTransport` is the real implementation: a blocking reqwest client
//! with a browser user agent, an optional courtesy pause between requests
//! (the upstream APIs are rate-sensitive and the sync is deliberately
//! single-threaded), and a retry count that defaults to zero.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::ConnectorConfig;
use crate::error::FetchError;

/// Which canned header set a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSet {
    /// Only the client defaults.
    None,
    /// The browser-mimicking FiinTrade headers the SSI listing endpoint
    /// expects.
    Fiin,
}

/// One blocking GET. Implementations return the body on HTTP 2xx and map
/// everything else into the `FetchError` taxonomy.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, headers: HeaderSet) -> Result<String, FetchError>;
}

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36";

/// The FiinTrade endpoint rejects requests that do not look like its own
/// web frontend, so listing requests send the header set the iboard
/// frontend sends.
fn fiin_headers() -> HeaderMap {
    let pairs: [(&str, &str); 9] = [
        ("x-fiin-key", "KEY"),
        ("x-fiin-user-id", "ID"),
        ("x-fiin-seed", "SEED"),
        ("accept", "application/json"),
        ("content-type", "application/json"),
        ("origin", "https://iboard.ssi.com.vn"),
        ("referer", "https://iboard.ssi.com.vn/"),
        ("dnt", "1"),
        ("accept-language", "en-US,en;q=0.9,vi-VN;q=0.8,vi;q=0.7"),
    ];
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

/// Real HTTP transport over blocking reqwest.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    pause: Duration,
    max_retries: u32,
    base_retry_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl HttpTransport {
    pub fn new(timeout: Duration, pause: Duration, max_retries: u32) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            pause,
            max_retries,
            base_retry_delay: Duration::from_millis(500),
            last_request: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self::new(
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_millis(config.request_pause_ms),
            config.max_retries,
        )
    }

    /// Sleep out the remainder of the courtesy pause since the last request.
    fn pace(&self) {
        if self.pause.is_zero() {
            return;
        }
        let mut last = self.last_request.lock().unwrap();
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.pause {
                std::thread::sleep(self.pause - elapsed);
            }
        }
        *last = Some(Instant::now());
    }

    fn get_once(&self, url: &str, headers: HeaderSet) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        if headers == HeaderSet::Fiin {
            request = request.headers(fiin_headers());
        }

        let response = request.send().map_err(|e| {
            FetchError::NetworkUnreachable(format!("GET {url}: {e}"))
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FetchError::RateLimited {
                retry_after_secs: retry_after,
            });
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .map_err(|e| FetchError::NetworkUnreachable(format!("read body of {url}: {e}")))
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, headers: HeaderSet) -> Result<String, FetchError> {
        self.pace();
        debug!(url, "GET");

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_retry_delay * 2u32.pow(attempt - 1);
                warn!(url, attempt, "retrying after {:?}", delay);
                std::thread::sleep(delay);
            }

            match self.get_once(url, headers) {
                Ok(body) => return Ok(body),
                // Format errors cannot occur here; transport failures are
                // the only retryable class.
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetchError::NetworkUnreachable("no attempt made".into())))
    }
}
