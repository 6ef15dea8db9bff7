// Directive classification and the same-site filter

use cspscout_scanner::ResourceCategory;
use cspscout_scanner::normalize::{BLOB_TOKEN, DATA_TOKEN, host_of};
use serde::{Deserialize, Serialize};
use std::fmt;

/// CSP fetch directives a resource reference can fall under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Directive {
    DefaultSrc,
    ScriptSrc,
    StyleSrc,
    ImgSrc,
    FontSrc,
    FrameSrc,
    MediaSrc,
    ManifestSrc,
    ObjectSrc,
}

impl Directive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Directive::DefaultSrc => "default-src",
            Directive::ScriptSrc => "script-src",
            Directive::StyleSrc => "style-src",
            Directive::ImgSrc => "img-src",
            Directive::FontSrc => "font-src",
            Directive::FrameSrc => "frame-src",
            Directive::MediaSrc => "media-src",
            Directive::ManifestSrc => "manifest-src",
            Directive::ObjectSrc => "object-src",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a resource category onto the directive that governs it.
/// Generic `<link>` references fall back to `default-src`; the match is
/// closed, so there is no unknown category to handle.
pub fn classify(category: ResourceCategory) -> Directive {
    match category {
        ResourceCategory::Script => Directive::ScriptSrc,
        ResourceCategory::Style => Directive::StyleSrc,
        ResourceCategory::Img => Directive::ImgSrc,
        ResourceCategory::Frame => Directive::FrameSrc,
        ResourceCategory::Font => Directive::FontSrc,
        ResourceCategory::Media => Directive::MediaSrc,
        ResourceCategory::Manifest => Directive::ManifestSrc,
        ResourceCategory::Object => Directive::ObjectSrc,
        ResourceCategory::LinkOther => Directive::DefaultSrc,
    }
}


/// Whether `resolved_url` is third-party relative to the page referencing it.
///
/// `data:` and `blob:` tokens always count as external. When either host
/// cannot be extracted the reference is treated as not external.
pub fn is_external(page_url: &str, resolved_url: &str, token: &str) -> bool {
    if token == DATA_TOKEN || token == BLOB_TOKEN {
        return true;
    }
    match (host_of(page_url), host_of(resolved_url)) {
        (Some(page_host), Some(resource_host)) => page_host != resource_host,
        _ => false,
    }
}
