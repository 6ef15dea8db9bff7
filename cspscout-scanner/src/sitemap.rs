use crate::error::{Result, ScanError};
use futures::future::BoxFuture;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use reqwest::Client;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const SITEMAP_TIMEOUT_SECS: u64 = 30;

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<urlset>`: page locations.
    UrlSet(Vec<String>),
    /// `<sitemapindex>`: locations of nested sitemaps.
    Index(Vec<String>),
}

/// Resolves a sitemap location (URL or local path) into page URLs.
pub struct SitemapResolver {
    client: Client,
    cycle_guard: bool,
}

impl SitemapResolver {
    pub fn new() -> Result<Self> {
        Self::with_user_agent(crate::fetcher::DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(SITEMAP_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            cycle_guard: true,
        })
    }

    /// When disabled, a sitemap index that references itself (directly or
    /// through other indexes) recurses without bound.
    pub fn with_cycle_guard(mut self, enabled: bool) -> Self {
        self.cycle_guard = enabled;
        self
    }

    /// Resolve `location` into a deduplicated list of page URLs in first-seen
    /// order. Nested sitemap indexes are followed depth-first.
    pub async fn resolve(&self, location: &str) -> Result<Vec<String>> {
        info!("Resolving sitemap {}", location);
        let mut visited = HashSet::new();
        let urls = self.resolve_nested(location.to_string(), &mut visited).await?;
        let urls = dedup_preserving_order(urls);
        info!("Sitemap resolved to {} unique URLs", urls.len());
        Ok(urls)
    }

    fn resolve_nested<'a>(
        &'a self,
        location: String,
        visited: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move {
            if self.cycle_guard && !visited.insert(location.clone()) {
                warn!("Skipping already visited sitemap {}", location);
                return Ok(Vec::new());
            }

            let content = self.load(&location).await?;
            match parse_sitemap(&content)? {
                SitemapDocument::UrlSet(urls) => {
                    debug!("Sitemap {} lists {} URLs", location, urls.len());
                    Ok(urls)
                }
                SitemapDocument::Index(children) => {
                    debug!(
                        "Sitemap index {} references {} sitemaps",
                        location,
                        children.len()
                    );
                    let mut urls = Vec::new();
                    for child in children {
                        let child = resolve_child_location(&location, &child);
                        urls.extend(self.resolve_nested(child, visited).await?);
                    }
                    Ok(urls)
                }
            }
        })
    }

    /// Read a sitemap from the network or the local filesystem.
    async fn load(&self, location: &str) -> Result<String> {
        if !is_remote(location) {
            debug!("Reading local sitemap {}", location);
            return Ok(tokio::fs::read_to_string(location).await?);
        }

        let url = Url::parse(location)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", location, e)))?;
        debug!("Fetching sitemap {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        if status >= 400 {
            return Err(ScanError::HttpStatus {
                url: location.to_string(),
                status,
            });
        }
        Ok(response.text().await?)
    }
}

/// Depth of an entry's `loc`: root, then `url`/`sitemap`, then `loc`.
const LOC_DEPTH: usize = 3;

/// Parse sitemap XML into its `loc` values.
///
/// Only a `loc` that is a direct child of a `url`/`sitemap` entry and shares
/// the root element's prefix counts, so extension elements such as
/// `<image:loc>` are skipped. Fails on malformed XML or when the root element
/// is neither `urlset` nor `sitemapindex`.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<Vec<u8>> = None;
    let mut root_prefix: Option<Vec<u8>> = None;
    let mut depth = 0usize;
    let mut locs = Vec::new();
    let mut current_loc: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                if root.is_none() {
                    root = Some(e.local_name().as_ref().to_vec());
                    root_prefix = prefix_of(&e);
                } else if depth == LOC_DEPTH
                    && e.local_name().as_ref() == b"loc"
                    && prefix_of(&e) == root_prefix
                {
                    current_loc = Some(String::new());
                }
            }
            Event::Empty(e) => {
                if root.is_none() {
                    root = Some(e.local_name().as_ref().to_vec());
                }
            }
            Event::Text(t) => {
                if let Some(ref mut loc) = current_loc {
                    loc.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(ref mut loc) = current_loc {
                    loc.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                if depth == LOC_DEPTH
                    && let Some(loc) = current_loc.take()
                {
                    let loc = loc.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match root.as_deref() {
        Some(b"urlset") => Ok(SitemapDocument::UrlSet(locs)),
        Some(b"sitemapindex") => Ok(SitemapDocument::Index(locs)),
        Some(other) => Err(ScanError::Parse(format!(
            "Unexpected root element <{}>, expected <urlset> or <sitemapindex>",
            String::from_utf8_lossy(other)
        ))),
        None => Err(ScanError::Parse("Sitemap has no root element".to_string())),
    }
}

fn prefix_of(element: &BytesStart) -> Option<Vec<u8>> {
    element.name().prefix().map(|p| p.as_ref().to_vec())
}

/// Remove duplicates by exact string equality, keeping first occurrences.
pub fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn is_remote(location: &str) -> bool {
    let lowered = location.to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

/// Relative child locations are resolved against the parent sitemap: its URL
/// when remote, its directory when local.
fn resolve_child_location(parent: &str, child: &str) -> String {
    if is_remote(child) {
        return child.to_string();
    }
    if !is_remote(parent) {
        let child_path = Path::new(child);
        if child_path.is_absolute() {
            return child.to_string();
        }
        return match Path::new(parent).parent() {
            Some(dir) => dir.join(child_path).to_string_lossy().into_owned(),
            None => child.to_string(),
        };
    }
    Url::parse(parent)
        .and_then(|base| base.join(child))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| child.to_string())
}
