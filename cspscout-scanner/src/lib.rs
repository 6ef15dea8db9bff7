pub mod error;
pub mod extract;
pub mod fetcher;
pub mod normalize;
pub mod result;
pub mod sitemap;

pub use error::ScanError;
pub use extract::{ResolvedReference, ResourceCategory, ResourceReference, extract_resources};
pub use fetcher::{Fetcher, ProgressCallback};
pub use normalize::{domain_token, host_of, normalize_url};
pub use result::FetchResult;
pub use sitemap::{SitemapDocument, SitemapResolver};
