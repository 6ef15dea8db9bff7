use crate::normalize::normalize_url;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Kind of resource a markup reference loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceCategory {
    Script,
    Style,
    Img,
    Frame,
    Media,
    Object,
    Font,
    Manifest,
    LinkOther,
}

impl ResourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Script => "script",
            ResourceCategory::Style => "style",
            ResourceCategory::Img => "img",
            ResourceCategory::Frame => "frame",
            ResourceCategory::Media => "media",
            ResourceCategory::Object => "object",
            ResourceCategory::Font => "font",
            ResourceCategory::Manifest => "manifest",
            ResourceCategory::LinkOther => "link-other",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw attribute value as found on a DOM node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    pub category: ResourceCategory,
    pub raw_url: String,
}

/// A reference after resolution against its page URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedReference {
    pub category: ResourceCategory,
    pub normalized_url: String,
}

/// Simple `element[attribute]` selectors and the category they yield.
const ATTRIBUTE_RULES: [(&str, &str, ResourceCategory); 8] = [
    ("script[src]", "src", ResourceCategory::Script),
    ("img[src]", "src", ResourceCategory::Img),
    ("iframe[src]", "src", ResourceCategory::Frame),
    ("audio[src]", "src", ResourceCategory::Media),
    ("video[src]", "src", ResourceCategory::Media),
    ("source[src]", "src", ResourceCategory::Media),
    ("object[data]", "data", ResourceCategory::Object),
    ("embed[src]", "src", ResourceCategory::Object),
];

/// Collect every resource-bearing attribute value in `html`.
///
/// Parsing is permissive: malformed markup yields whatever the parser could
/// recover and never an error. No deduplication happens here.
pub fn extract_references(html: &str) -> Vec<ResourceReference> {
    let document = Html::parse_document(html);
    let mut references = Vec::new();

    for (css, attribute, category) in ATTRIBUTE_RULES {
        for element in select(&document, css) {
            if let Some(value) = element.value().attr(attribute) {
                references.push(ResourceReference {
                    category,
                    raw_url: value.to_string(),
                });
            }
        }
    }

    for element in select(&document, "link[href]") {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        references.push(ResourceReference {
            category: link_category(element.value().attr("rel")),
            raw_url: href.to_string(),
        });
        if element
            .value()
            .attr("as")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("font"))
        {
            references.push(ResourceReference {
                category: ResourceCategory::Font,
                raw_url: href.to_string(),
            });
        }
    }

    for element in select(&document, "img[srcset]") {
        if let Some(srcset) = element.value().attr("srcset") {
            for candidate in srcset_urls(srcset) {
                references.push(ResourceReference {
                    category: ResourceCategory::Img,
                    raw_url: candidate.to_string(),
                });
            }
        }
    }

    references
}

/// Extract and resolve references for the page at `page_url`, dropping any
/// value that cannot be resolved.
pub fn extract_resources(page_url: &str, html: &str) -> Vec<ResolvedReference> {
    let resolved: Vec<ResolvedReference> = extract_references(html)
        .into_iter()
        .filter_map(|reference| {
            normalize_url(page_url, &reference.raw_url).map(|normalized_url| ResolvedReference {
                category: reference.category,
                normalized_url,
            })
        })
        .collect();

    debug!("Extracted {} resources from {}", resolved.len(), page_url);
    resolved
}

fn select<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn link_category(rel: Option<&str>) -> ResourceCategory {
    let has_rel = |wanted: &str| {
        rel.is_some_and(|r| r.split_ascii_whitespace().any(|t| t.eq_ignore_ascii_case(wanted)))
    };

    if has_rel("stylesheet") {
        ResourceCategory::Style
    } else if has_rel("manifest") {
        ResourceCategory::Manifest
    } else {
        ResourceCategory::LinkOther
    }
}

/// URL portion of each comma separated `srcset` candidate.
fn srcset_urls(srcset: &str) -> impl Iterator<Item = &str> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(refs: &[ResourceReference]) -> Vec<(ResourceCategory, &str)> {
        refs.iter()
            .map(|r| (r.category, r.raw_url.as_str()))
            .collect()
    }

    #[test]
    fn test_extract_script_and_style() {
        let html = r#"<html><head>
            <script src="https://cdn.x/a.js"></script>
            <script>inline()</script>
            <link rel="stylesheet" href="/css/site.css">
            <link rel="Alternate StyleSheet" href="alt.css">
        </head></html>"#;

        let refs = extract_references(html);
        assert_eq!(
            categories(&refs),
            vec![
                (ResourceCategory::Script, "https://cdn.x/a.js"),
                (ResourceCategory::Style, "/css/site.css"),
                (ResourceCategory::Style, "alt.css"),
            ]
        );
    }

    #[test]
    fn test_link_classification() {
        let html = r#"<head>
            <link rel="manifest" href="/site.webmanifest">
            <link rel="icon" href="/favicon.ico">
            <link href="/no-rel">
            <link rel="preload" as="font" href="https://fonts.example/f.woff2">
        </head>"#;

        let refs = extract_references(html);
        assert_eq!(
            categories(&refs),
            vec![
                (ResourceCategory::Manifest, "/site.webmanifest"),
                (ResourceCategory::LinkOther, "/favicon.ico"),
                (ResourceCategory::LinkOther, "/no-rel"),
                (ResourceCategory::LinkOther, "https://fonts.example/f.woff2"),
                (ResourceCategory::Font, "https://fonts.example/f.woff2"),
            ]
        );
    }

    #[test]
    fn test_stylesheet_preloaded_as_font_yields_two_references() {
        let html = r#"<link rel="stylesheet" as="font" href="https://f.example/f.css">"#;
        let refs = extract_references(html);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].category, ResourceCategory::Style);
        assert_eq!(refs[1].category, ResourceCategory::Font);
    }

    #[test]
    fn test_srcset_candidates() {
        let html = r#"<img src="a.png" srcset="small.png 1x, https://img.cdn/large.png 2x,  ,huge.png">"#;
        let refs = extract_references(html);
        assert_eq!(
            categories(&refs),
            vec![
                (ResourceCategory::Img, "a.png"),
                (ResourceCategory::Img, "small.png"),
                (ResourceCategory::Img, "https://img.cdn/large.png"),
                (ResourceCategory::Img, "huge.png"),
            ]
        );
    }

    #[test]
    fn test_media_frames_and_objects() {
        let html = r#"<body>
            <iframe src="https://player.example/embed"></iframe>
            <video src="v.mp4"><source src="https://media.example/v.webm"></video>
            <audio src="a.mp3"></audio>
            <object data="https://obj.example/x.swf"></object>
            <embed src="https://embed.example/y">
        </body>"#;

        let refs = extract_references(html);
        assert!(refs.contains(&ResourceReference {
            category: ResourceCategory::Frame,
            raw_url: "https://player.example/embed".to_string(),
        }));
        assert_eq!(
            refs.iter()
                .filter(|r| r.category == ResourceCategory::Media)
                .count(),
            3
        );
        assert_eq!(
            refs.iter()
                .filter(|r| r.category == ResourceCategory::Object)
                .count(),
            2
        );
    }

    #[test]
    fn test_no_deduplication() {
        let html = r#"<script src="https://cdn.x/a.js"></script><script src="https://cdn.x/a.js"></script>"#;
        assert_eq!(extract_references(html).len(), 2);
    }

    #[test]
    fn test_malformed_markup_is_tolerated() {
        let html = r#"<html><body><div><img src="https://i.example/x.png"<script src="#;
        let _ = extract_references(html);

        let html = "<<<>>> not html at all </div></span>";
        assert!(extract_references(html).is_empty());
    }

    #[test]
    fn test_extract_resources_resolves_and_drops() {
        let html = r#"
            <script src="js/app.js"></script>
            <script src="javascript:void(0)"></script>
            <img src="">
            <img src="//cdn.example/logo.png">
        "#;
        let resolved = extract_resources("https://a.com/dir/page.html", html);
        assert_eq!(
            resolved,
            vec![
                ResolvedReference {
                    category: ResourceCategory::Script,
                    normalized_url: "https://a.com/dir/js/app.js".to_string(),
                },
                ResolvedReference {
                    category: ResourceCategory::Img,
                    normalized_url: "https://cdn.example/logo.png".to_string(),
                },
            ]
        );
    }
}
