use crate::error::{Result, ScanError};
use crate::result::FetchResult;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

pub const DEFAULT_USER_AGENT: &str = concat!("cspscout/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_CONCURRENCY: usize = 8;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const MAX_CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_REDIRECTS: usize = 10;

/// Called once per finished fetch with the number of fetches completed so far
/// and the URL that just finished.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Fetches a fixed list of URLs with at most `concurrency` requests in flight.
pub struct Fetcher {
    client: Client,
    concurrency: usize,
    progress_callback: Option<ProgressCallback>,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT)
    }

    pub fn with_options(concurrency: usize, timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(MAX_CONNECT_TIMEOUT_SECS)))
            .pool_max_idle_per_host(concurrency.max(1))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            concurrency: concurrency.max(1),
            progress_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch every URL exactly once.
    ///
    /// `urls` is consumed as a work queue in order; a new fetch starts as soon
    /// as an in-flight one finishes. The returned map has one entry per
    /// distinct URL and carries no ordering.
    pub async fn fetch_all(&self, urls: &[String]) -> Result<HashMap<String, FetchResult>> {
        info!(
            "Fetching {} URLs with concurrency {}",
            urls.len(),
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let results: Arc<Mutex<HashMap<String, FetchResult>>> =
            Arc::new(Mutex::new(HashMap::with_capacity(urls.len())));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(urls.len());

        for url in urls {
            // Waiting here keeps submission in queue order.
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| ScanError::Other(format!("Fetch pool closed: {}", e)))?;

            let client = self.client.clone();
            let results = results.clone();
            let completed = completed.clone();
            let progress_cb = self.progress_callback.clone();
            let url = url.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let result = Self::fetch_one(&client, &url).await;
                results.lock().await.insert(url.clone(), result);

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref callback) = progress_cb {
                    callback(done, url);
                }
            }));
        }

        for handle in handles {
            handle.await?;
        }

        let results = std::mem::take(&mut *results.lock().await);
        let failures = results.values().filter(|r| !r.is_success()).count();
        info!(
            "Fetch complete. {} URLs fetched, {} failed",
            results.len(),
            failures
        );
        Ok(results)
    }

    /// Single GET. Transport failures are folded into the result.
    async fn fetch_one(client: &Client, url: &str) -> FetchResult {
        debug!("Fetching {}", url);
        let start = Instant::now();

        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let message = describe_error(&e);
                warn!("Fetch failed for {}: {}", url, message);
                let mut result = FetchResult::with_error(url.to_string(), message);
                result.response_time = start.elapsed();
                return result;
            }
        };

        let mut result = FetchResult::new(url.to_string());
        result.status_code = response.status().as_u16();

        match response.text().await {
            Ok(body) => result.body = Some(body),
            Err(e) => {
                let message = describe_error(&e);
                warn!("Reading body failed for {}: {}", url, message);
                result.error = Some(message);
            }
        }
        result.response_time = start.elapsed();

        debug!(
            "Fetched {} ({}) in {:?}",
            url, result.status_code, result.response_time
        );
        result
    }
}

fn describe_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timeout: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else if err.is_redirect() {
        format!("redirect error: {}", err)
    } else {
        err.to_string()
    }
}
