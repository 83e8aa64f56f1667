//! Raindrop Client for raindrop-sync.
//!
//! Pages through `GET /raindrops/{collection_id}/` and returns the whole
//! collection only if every consistency check passes.
//!
//! The first page fixes the *benchmark*: the total item count the server
//! reports at the start of the fetch. Every later page must report the same
//! total, each item must carry an integer `_id`, and at the end the number of
//! collected items and the length of the final page must agree with the
//! benchmark. Any violation discards the fetch; nothing partial is returned.
//!
//! Transient transport failures are retried with exponential backoff before
//! a response ever reaches validation. Validation failures are never retried.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::services::token_provider::{provider_from_config, TokenProvider};
use crate::types::config::{ApiConfig, RetryConfig, SyncConfig};
use crate::types::errors::{FetchError, TransportError};
use crate::types::raindrop::{PageResponse, RateLimit, Raindrop};

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
const EXPECTED_ID_DIGITS: usize = 9;

/// Fetches a single page of the collection.
///
/// Implementations report non-success HTTP statuses as
/// `TransportError::Status` and everything else that prevents a response
/// body from arriving as `TransportError::Network`.
pub trait PageTransport {
    fn get_page(&self, page: u32, access_token: &str) -> Result<PageResponse, TransportError>;
}

impl<T: PageTransport + ?Sized> PageTransport for &T {
    fn get_page(&self, page: u32, access_token: &str) -> Result<PageResponse, TransportError> {
        (**self).get_page(page, access_token)
    }
}

/// Anything that can produce the full, validated collection.
pub trait Fetcher {
    fn fetch_all(&self) -> Result<Vec<Raindrop>, FetchError>;
}

/// Blocking HTTP transport for the Raindrop REST API.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    page_size: u32,
    search: Option<String>,
}

impl HttpTransport {
    pub fn new(api: &ApiConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("raindrop-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/raindrops/{}/",
                api.base_url.trim_end_matches('/'),
                api.collection_id
            ),
            page_size: api.page_size,
            search: api.search.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn rate_limit(headers: &HeaderMap) -> Option<RateLimit> {
        let remaining = headers.get(RATE_LIMIT_REMAINING)?.to_str().ok()?;
        let limit = headers.get(RATE_LIMIT_LIMIT)?.to_str().ok()?;
        Some(RateLimit {
            remaining: remaining.to_string(),
            limit: limit.to_string(),
        })
    }
}

impl PageTransport for HttpTransport {
    fn get_page(&self, page: u32, access_token: &str) -> Result<PageResponse, TransportError> {
        let mut params = vec![
            ("perpage", self.page_size.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(access_token)
            .query(&params)
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let rate_limit = Self::rate_limit(response.headers());
        let body = response
            .text()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(PageResponse { body, rate_limit })
    }
}

/// Paginating, validating client over any [`PageTransport`].
pub struct RaindropClient<T: PageTransport = HttpTransport> {
    transport: T,
    tokens: Box<dyn TokenProvider + Send + Sync>,
    page_size: u32,
    max_pages: u32,
    retry: RetryConfig,
}

impl RaindropClient<HttpTransport> {
    /// HTTP client wired from configuration, with the configured token source.
    pub fn from_config(config: &SyncConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config.api)?;
        Ok(Self::new(
            transport,
            provider_from_config(&config.api),
            &config.api,
            &config.retry,
        ))
    }
}

impl<T: PageTransport> RaindropClient<T> {
    pub fn new(
        transport: T,
        tokens: Box<dyn TokenProvider + Send + Sync>,
        api: &ApiConfig,
        retry: &RetryConfig,
    ) -> Self {
        info!("Raindrop client initialised");
        Self {
            transport,
            tokens,
            page_size: api.page_size.max(1),
            max_pages: api.max_pages,
            retry: retry.clone(),
        }
    }

    /// Requests page 0. `Ok(true)` means the server rejected the token with
    /// 401; any other failure is returned as-is. Never refreshes anything.
    pub fn token_is_stale(&self) -> Result<bool, FetchError> {
        match self.request_page(0) {
            Ok(_) => {
                info!("Access token is valid");
                Ok(false)
            }
            Err(FetchError::Unauthorized) => {
                warn!("Access token is stale");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// One page request with transport-level retries.
    fn request_page(&self, page: u32) -> Result<PageResponse, FetchError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let token = self.tokens.current_access_token()?;
            let err = match self.transport.get_page(page, &token) {
                Ok(response) => {
                    Self::log_rate_limit(page, &response);
                    return Ok(response);
                }
                Err(err) => err,
            };

            if err.status() == Some(401) {
                return Err(FetchError::Unauthorized);
            }
            if !err.is_transient() {
                return Err(FetchError::Http {
                    page,
                    status: err.status().unwrap_or_default(),
                });
            }
            if attempt >= max_attempts {
                return Err(FetchError::RetryExhausted {
                    page,
                    attempts: attempt,
                    last: err,
                });
            }

            let delay = self.retry.delay_after(attempt);
            warn!(
                page,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Page request failed, retrying"
            );
            if delay > Duration::ZERO {
                thread::sleep(delay);
            }
            attempt += 1;
        }
    }

    fn log_rate_limit(page: u32, response: &PageResponse) {
        match &response.rate_limit {
            Some(rl) => debug!(
                page,
                "API calls remaining before reset: {}/{}", rl.remaining, rl.limit
            ),
            None => warn!(page, "API headers do not include rate limit status"),
        }
    }

    /// Requests, decodes and checks the `result` flag of one page.
    fn load_page(&self, page: u32) -> Result<Map<String, Value>, FetchError> {
        let response = self.request_page(page)?;
        let data = match serde_json::from_str::<Value>(&response.body) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(FetchError::Decode {
                    page,
                    reason: format!("expected a JSON object, got {}", other),
                })
            }
            Err(e) => {
                return Err(FetchError::Decode {
                    page,
                    reason: e.to_string(),
                })
            }
        };

        if data.get("result") != Some(&Value::Bool(true)) {
            return Err(FetchError::ApiFailure { page });
        }
        Ok(data)
    }

    /// Number of pages needed for `benchmark` items, bounded by `max_pages`.
    fn target_pages(&self, benchmark: u64) -> Result<u32, FetchError> {
        let required = benchmark.div_ceil(u64::from(self.page_size));
        debug!(benchmark, required, "Target pages calculated");
        if required > u64::from(self.max_pages) {
            return Err(FetchError::TooManyPages {
                required,
                allowed: self.max_pages,
            });
        }
        Ok(required as u32)
    }

    /// Length the final page must have for a collection of `benchmark` items.
    fn expected_last_page_len(&self, benchmark: u64) -> u64 {
        if benchmark == 0 {
            return 0;
        }
        match benchmark % u64::from(self.page_size) {
            0 => u64::from(self.page_size),
            remainder => remainder,
        }
    }

    fn check_totals(
        &self,
        collected: usize,
        last_page_len: usize,
        benchmark: u64,
    ) -> Result<(), FetchError> {
        if collected as u64 != benchmark {
            return Err(FetchError::TotalMismatch {
                expected: benchmark,
                actual: collected as u64,
            });
        }
        let expected = self.expected_last_page_len(benchmark);
        if last_page_len as u64 != expected {
            return Err(FetchError::LastPageMismatch {
                expected,
                actual: last_page_len as u64,
            });
        }
        Ok(())
    }
}

/// The server's total item count from the first page.
fn extract_benchmark(data: &Map<String, Value>) -> Result<u64, FetchError> {
    let count = match data.get("count") {
        None => return Err(FetchError::MissingCount),
        Some(Value::Null) => return Err(FetchError::NullCount),
        Some(count) => count,
    };
    debug!(%count, "Benchmark count value");

    if let Some(n) = count.as_i64() {
        if n < 0 {
            return Err(FetchError::NegativeCount(n));
        }
    }
    count.as_u64().ok_or_else(|| FetchError::Decode {
        page: 0,
        reason: format!("count is not an integer: {}", count),
    })
}

fn check_count(page: u32, data: &Map<String, Value>, benchmark: u64) -> Result<(), FetchError> {
    let current = data.get("count").cloned().unwrap_or(Value::Null);
    debug!(page, %current, benchmark, "Count in current response");
    if current.as_u64() != Some(benchmark) {
        return Err(FetchError::CountChanged {
            page,
            benchmark,
            current,
        });
    }
    Ok(())
}

/// Checks every item's `_id`, then decodes the page's items.
fn validate_items(page: u32, data: &Map<String, Value>) -> Result<Vec<Raindrop>, FetchError> {
    let items = match data.get("items") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(FetchError::Decode {
                page,
                reason: format!("items is not an array: {}", other),
            })
        }
    };

    for item in items {
        let shown = match item.get("_id") {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => s.clone(),
            Some(id) => id.to_string(),
        };
        if shown.len() != EXPECTED_ID_DIGITS {
            warn!(page, id = %shown, "Raindrop _id does not have 9 digits");
        }
    }

    let mut raindrops = Vec::with_capacity(items.len());
    for item in items {
        match item.get("_id") {
            None | Some(Value::Null) => {
                return Err(FetchError::MissingId {
                    page,
                    item: item.to_string(),
                })
            }
            Some(id) if id.as_i64().is_none() => {
                return Err(FetchError::NonIntegerId {
                    page,
                    item: item.to_string(),
                })
            }
            Some(_) => {}
        }
        let raindrop: Raindrop =
            serde_json::from_value(item.clone()).map_err(|e| FetchError::MalformedItem {
                page,
                reason: e.to_string(),
            })?;
        raindrops.push(raindrop);
    }
    debug!(page, items = raindrops.len(), "Page items validated");
    Ok(raindrops)
}

impl<T: PageTransport> Fetcher for RaindropClient<T> {
    fn fetch_all(&self) -> Result<Vec<Raindrop>, FetchError> {
        info!("Fetching all raindrops");

        let mut data = self.load_page(0)?;
        let benchmark = extract_benchmark(&data)?;
        let target_pages = self.target_pages(benchmark)?;

        let mut collected: Vec<Raindrop> = Vec::new();
        let mut page: u32 = 0;
        let last_page_len = loop {
            check_count(page, &data, benchmark)?;
            let raindrops = validate_items(page, &data)?;
            let page_len = raindrops.len();
            collected.extend(raindrops);
            debug!(page, cumulative = collected.len(), "Page accepted");

            page += 1;
            if page >= target_pages {
                debug!(page, target_pages, "Reached target pages");
                break page_len;
            }
            data = self.load_page(page)?;
        };

        self.check_totals(collected.len(), last_page_len, benchmark)?;
        info!(total = collected.len(), pages = page, "Collected all bookmarks");
        Ok(collected)
    }
}
