use crate::aggregate::{Aggregator, DomainSummary, PageFinding};
use chrono::{DateTime, Utc};
use cspscout_scanner::error::Result;
use cspscout_scanner::fetcher::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use cspscout_scanner::{Fetcher, SitemapResolver, extract_resources};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Options for configuring an inventory run
pub struct InventoryOptions {
    pub sitemap: String,
    pub concurrency: usize,
    pub timeout_secs: u64,
    /// Truncate the deduplicated URL list to this many entries; 0 keeps all.
    pub limit: usize,
    pub user_agent: String,
    pub cycle_guard: bool,
    pub show_progress_bars: bool,
}

impl InventoryOptions {
    pub fn new(sitemap: impl Into<String>) -> Self {
        Self {
            sitemap: sitemap.into(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            limit: 0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cycle_guard: true,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting pipeline stage messages
pub type InventoryProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Final state of a run, handed to the report writers.
#[derive(Debug, Clone)]
pub struct Inventory {
    /// Page URLs in sitemap order.
    pub urls: Vec<String>,
    pub pages: HashMap<String, PageFinding>,
    pub domain_summary: DomainSummary,
    pub generated_at: DateTime<Utc>,
}

impl Inventory {
    /// Page findings in sitemap order.
    pub fn ordered_pages(&self) -> impl Iterator<Item = &PageFinding> + '_ {
        self.urls.iter().filter_map(|url| self.pages.get(url))
    }

    pub fn failed_pages(&self) -> usize {
        self.pages.values().filter(|p| !p.is_ok()).count()
    }
}

/// Apply the per-run URL limit (0 = unlimited).
pub fn apply_limit(mut urls: Vec<String>, limit: usize) -> Vec<String> {
    if limit > 0 && urls.len() > limit {
        urls.truncate(limit);
    }
    urls
}

/// Resolve the sitemap, fetch every page and aggregate the findings.
///
/// Sitemap errors abort the run. Individual page failures are recorded in
/// the inventory and never abort it.
pub async fn execute_inventory(
    options: InventoryOptions,
    progress_callback: Option<InventoryProgressCallback>,
) -> Result<Inventory> {
    let InventoryOptions {
        sitemap,
        concurrency,
        timeout_secs,
        limit,
        user_agent,
        cycle_guard,
        show_progress_bars,
    } = options;

    let report = |msg: String| {
        if let Some(ref callback) = progress_callback {
            callback(msg);
        }
    };

    report(format!("Resolving sitemap {}", sitemap));
    let resolver = SitemapResolver::with_user_agent(&user_agent)?.with_cycle_guard(cycle_guard);
    let resolved = resolver.resolve(&sitemap).await?;
    let resolved_count = resolved.len();
    let urls = apply_limit(resolved, limit);

    if urls.len() < resolved_count {
        report(format!(
            "Found {} URLs, limited to {}",
            resolved_count,
            urls.len()
        ));
    } else {
        report(format!("Found {} URLs", urls.len()));
    }

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new(urls.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(Arc::new(pb))
    } else {
        None
    };

    let mut fetcher = Fetcher::with_options(concurrency, timeout_secs, &user_agent)?;
    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        fetcher = fetcher.with_progress_callback(Arc::new(move |_done: usize, url: String| {
            pb_clone.set_message(url);
            pb_clone.inc(1);
        }));
    }

    let mut results = fetcher.fetch_all(&urls).await?;

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    let mut aggregator = Aggregator::new();
    for url in &urls {
        match results.remove(url) {
            Some(result) => {
                let references = match result.body {
                    Some(ref body) if result.is_success() => extract_resources(url, body),
                    _ => Vec::new(),
                };
                aggregator.record_page(&result, &references);
            }
            None => {
                warn!("No fetch result for {}", url);
                aggregator.record_missing(url);
            }
        }
    }

    let (pages, domain_summary) = aggregator.into_parts();
    let inventory = Inventory {
        urls,
        pages,
        domain_summary,
        generated_at: Utc::now(),
    };

    info!(
        "Inventory complete. {} pages, {} failed, {} directives",
        inventory.pages.len(),
        inventory.failed_pages(),
        inventory.domain_summary.len()
    );
    report(format!(
        "Processed {} pages ({} failed)",
        inventory.pages.len(),
        inventory.failed_pages()
    ));

    Ok(inventory)
}
