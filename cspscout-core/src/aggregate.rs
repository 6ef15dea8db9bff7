// Per-page findings and the crawl-wide domain summary

use crate::directive::{Directive, classify, is_external};
use cspscout_scanner::{FetchResult, ResolvedReference, domain_token};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Maximum number of distinct sample pages kept per domain summary entry.
pub const SAMPLE_PAGE_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchState {
    Ok,
    Error,
}

impl FetchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchState::Ok => "ok",
            FetchState::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStatus {
    pub state: FetchState,
    pub http_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What was found on a single crawled page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFinding {
    pub page_url: String,
    pub fetch_status: FetchStatus,
    /// Only directives with at least one external reference appear here.
    pub directive_domains: BTreeMap<Directive, BTreeSet<String>>,
}

impl PageFinding {
    pub fn is_ok(&self) -> bool {
        self.fetch_status.state == FetchState::Ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSummaryEntry {
    pub directive: Directive,
    pub token: String,
    /// One per surviving reference across the whole crawl, not per page.
    pub count: u64,
    pub sample_pages: Vec<String>,
}

impl DomainSummaryEntry {
    fn new(directive: Directive, token: String) -> Self {
        Self {
            directive,
            token,
            count: 0,
            sample_pages: Vec::new(),
        }
    }

    fn record(&mut self, page_url: &str) {
        self.count += 1;
        if self.sample_pages.len() < SAMPLE_PAGE_LIMIT
            && !self.sample_pages.iter().any(|p| p == page_url)
        {
            self.sample_pages.push(page_url.to_string());
        }
    }
}

pub type DomainSummary = BTreeMap<Directive, BTreeMap<String, DomainSummaryEntry>>;

/// Accumulates page findings and the domain summary as pages are processed.
///
/// Owned by a single writer; callers that process pages in parallel must
/// serialize access to it.
#[derive(Debug, Default)]
pub struct Aggregator {
    pages: HashMap<String, PageFinding>,
    domain_summary: DomainSummary,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one page. `references` are ignored when the fetch failed.
    pub fn record_page(&mut self, result: &FetchResult, references: &[ResolvedReference]) {
        if !result.is_success() {
            self.pages.insert(
                result.url.clone(),
                PageFinding {
                    page_url: result.url.clone(),
                    fetch_status: FetchStatus {
                        state: FetchState::Error,
                        http_code: result.status_code,
                        error: result.failure_reason(),
                    },
                    directive_domains: BTreeMap::new(),
                },
            );
            return;
        }

        let page_url = result.url.as_str();
        let mut directive_domains: BTreeMap<Directive, BTreeSet<String>> = BTreeMap::new();

        for reference in references {
            let token = domain_token(&reference.normalized_url);
            if !is_external(page_url, &reference.normalized_url, &token) {
                continue;
            }
            let directive = classify(reference.category);

            self.domain_summary
                .entry(directive)
                .or_default()
                .entry(token.clone())
                .or_insert_with(|| DomainSummaryEntry::new(directive, token.clone()))
                .record(page_url);

            directive_domains.entry(directive).or_default().insert(token);
        }

        self.pages.insert(
            result.url.clone(),
            PageFinding {
                page_url: result.url.clone(),
                fetch_status: FetchStatus {
                    state: FetchState::Ok,
                    http_code: result.status_code,
                    error: None,
                },
                directive_domains,
            },
        );
    }

    /// Record a page that never produced a fetch result.
    pub fn record_missing(&mut self, page_url: &str) {
        let result = FetchResult::with_error(page_url.to_string(), "no fetch result".to_string());
        self.record_page(&result, &[]);
    }

    pub fn pages(&self) -> &HashMap<String, PageFinding> {
        &self.pages
    }

    pub fn domain_summary(&self) -> &DomainSummary {
        &self.domain_summary
    }

    pub fn into_parts(self) -> (HashMap<String, PageFinding>, DomainSummary) {
        (self.pages, self.domain_summary)
    }
}
