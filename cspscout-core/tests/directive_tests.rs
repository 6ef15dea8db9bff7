// Tests for directive classification and the same-site filter

use cspscout_core::directive::{Directive, classify, is_external};
use cspscout_scanner::ResourceCategory;

// ============================================================================
// Classification Tests
// ============================================================================

#[test]
fn test_classify_every_category() {
    let expected = [
        (ResourceCategory::Script, Directive::ScriptSrc),
        (ResourceCategory::Style, Directive::StyleSrc),
        (ResourceCategory::Img, Directive::ImgSrc),
        (ResourceCategory::Frame, Directive::FrameSrc),
        (ResourceCategory::Font, Directive::FontSrc),
        (ResourceCategory::Media, Directive::MediaSrc),
        (ResourceCategory::Manifest, Directive::ManifestSrc),
        (ResourceCategory::Object, Directive::ObjectSrc),
        (ResourceCategory::LinkOther, Directive::DefaultSrc),
    ];

    for (category, directive) in expected {
        assert_eq!(classify(category), directive, "category {}", category);
    }
}

#[test]
fn test_directive_names() {
    assert_eq!(Directive::ScriptSrc.as_str(), "script-src");
    assert_eq!(Directive::DefaultSrc.to_string(), "default-src");
    assert_eq!(Directive::ManifestSrc.as_str(), "manifest-src");
}

#[test]
fn test_directive_serializes_as_name() {
    let json = serde_json::to_string(&Directive::ManifestSrc).unwrap();
    assert_eq!(json, "\"manifest-src\"");
}

// ============================================================================
// Same-site Filter Tests
// ============================================================================

#[test]
fn test_same_host_is_not_external() {
    assert!(!is_external(
        "https://a.com/p",
        "https://a.com/x.js",
        "a.com"
    ));
}

#[test]
fn test_host_comparison_ignores_case_scheme_and_port() {
    assert!(!is_external(
        "https://A.com/p",
        "http://a.COM:8080/x.js",
        "a.com"
    ));
}

#[test]
fn test_different_host_is_external() {
    assert!(is_external(
        "https://a.com/p",
        "https://cdn.b.com/x.js",
        "cdn.b.com"
    ));
}

#[test]
fn test_subdomain_is_external() {
    assert!(is_external(
        "https://a.com/p",
        "https://static.a.com/x.js",
        "static.a.com"
    ));
}

#[test]
fn test_data_and_blob_always_external() {
    assert!(is_external("https://a.com/p", "data:image/png;base64,AA", "data:"));
    assert!(is_external("not a url", "blob:https://a.com/1", "blob:"));
}

#[test]
fn test_missing_host_is_not_external() {
    assert!(!is_external("not a url", "https://cdn.b.com/x.js", "cdn.b.com"));
    assert!(!is_external("https://a.com/p", "about:blank", "unknown"));
}
