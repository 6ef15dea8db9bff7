// Tests for report generation functionality

use chrono::Utc;
use cspscout_core::aggregate::Aggregator;
use cspscout_core::inventory::Inventory;
use cspscout_core::report::{
    generate_domain_summary_csv, generate_json_report, generate_page_findings_csv,
    generate_text_summary, save_report, sorted_summary_entries,
};
use cspscout_scanner::{FetchResult, ResolvedReference, ResourceCategory};
use serde_json::Value;

fn reference(category: ResourceCategory, url: &str) -> ResolvedReference {
    ResolvedReference {
        category,
        normalized_url: url.to_string(),
    }
}

fn ok_result(url: &str) -> FetchResult {
    let mut result = FetchResult::new(url.to_string());
    result.status_code = 200;
    result.body = Some(String::new());
    result
}

/// Three pages: one with findings, one timed out, one with nothing external.
fn sample_inventory() -> Inventory {
    let urls = vec![
        "https://a.com/".to_string(),
        "https://a.com/slow".to_string(),
        "https://a.com/plain".to_string(),
    ];

    let mut aggregator = Aggregator::new();
    aggregator.record_page(
        &ok_result(&urls[0]),
        &[
            reference(ResourceCategory::Script, "https://cdn.x/a.js"),
            reference(ResourceCategory::Script, "https://cdn.x/b.js"),
            reference(ResourceCategory::Script, "https://a.com/self.js"),
            reference(ResourceCategory::Img, "data:image/png;base64,AAAA"),
            reference(ResourceCategory::Style, "https://fonts.googleapis.com/css"),
        ],
    );
    aggregator.record_page(
        &FetchResult::with_error(urls[1].clone(), "timeout".to_string()),
        &[],
    );
    aggregator.record_page(&ok_result(&urls[2]), &[]);

    let (pages, domain_summary) = aggregator.into_parts();
    Inventory {
        urls,
        pages,
        domain_summary,
        generated_at: Utc::now(),
    }
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_top_level_fields() {
    let json = generate_json_report(&sample_inventory()).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["total_urls"], 3);
    assert!(value["generated_at"].is_string());
    assert_eq!(value["pages"].as_array().unwrap().len(), 3);
}

#[test]
fn test_json_report_pages_follow_sitemap_order() {
    let json = generate_json_report(&sample_inventory()).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    let urls: Vec<&str> = value["pages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["page_url"].as_str().unwrap())
        .collect();
    assert_eq!(
        urls,
        vec!["https://a.com/", "https://a.com/slow", "https://a.com/plain"]
    );
}

#[test]
fn test_json_report_page_contents() {
    let json = generate_json_report(&sample_inventory()).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    let pages = value["pages"].as_array().unwrap();

    let first = &pages[0];
    assert_eq!(first["fetch_status"]["state"], "ok");
    assert_eq!(first["fetch_status"]["http_code"], 200);
    assert!(first["fetch_status"].get("error").is_none());
    assert_eq!(first["directive_domains"]["script-src"][0], "cdn.x");
    assert_eq!(first["directive_domains"]["img-src"][0], "data:");

    let failed = &pages[1];
    assert_eq!(failed["fetch_status"]["state"], "error");
    assert_eq!(failed["fetch_status"]["http_code"], 0);
    assert_eq!(failed["fetch_status"]["error"], "timeout");
    assert!(failed["directive_domains"].as_object().unwrap().is_empty());
}

#[test]
fn test_json_report_domain_summary() {
    let json = generate_json_report(&sample_inventory()).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    let entry = &value["domain_summary"]["script-src"]["cdn.x"];
    assert_eq!(entry["count"], 2);
    assert_eq!(entry["sample_pages"][0], "https://a.com/");
    assert!(entry.get("directive").is_none());
    assert!(value["domain_summary"]["script-src"].get("a.com").is_none());
}

// ============================================================================
// CSV Report Tests
// ============================================================================

#[test]
fn test_sorted_summary_entries_order() {
    let inventory = sample_inventory();
    let entries = sorted_summary_entries(&inventory);

    let keys: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e.directive.as_str(), e.token.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("script-src", "cdn.x"),
            ("img-src", "data:"),
            ("style-src", "fonts.googleapis.com"),
        ]
    );
}

#[test]
fn test_domain_summary_csv() {
    let csv = generate_domain_summary_csv(&sample_inventory()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "directive,domain,count,sample_pages");
    assert_eq!(lines[1], "script-src,cdn.x,2,https://a.com/");
    assert_eq!(lines[2], "img-src,data:,1,https://a.com/");
    assert_eq!(lines[3], "style-src,fonts.googleapis.com,1,https://a.com/");
    assert_eq!(lines.len(), 4);
}

#[test]
fn test_domain_summary_csv_joins_samples() {
    let mut aggregator = Aggregator::new();
    let urls = vec!["https://a.com/1".to_string(), "https://a.com/2".to_string()];
    for url in &urls {
        aggregator.record_page(
            &ok_result(url),
            &[reference(ResourceCategory::Script, "https://cdn.x/a.js")],
        );
    }
    let (pages, domain_summary) = aggregator.into_parts();
    let inventory = Inventory {
        urls,
        pages,
        domain_summary,
        generated_at: Utc::now(),
    };

    let csv = generate_domain_summary_csv(&inventory).unwrap();
    assert!(csv.contains("script-src,cdn.x,2,https://a.com/1 | https://a.com/2"));
}

#[test]
fn test_page_findings_csv() {
    let csv = generate_page_findings_csv(&sample_inventory()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "page_url,fetch_status,http_code,error,directive,domains");
    assert_eq!(lines[1], "https://a.com/,ok,200,,script-src,cdn.x");
    assert_eq!(lines[2], "https://a.com/,ok,200,,style-src,fonts.googleapis.com");
    assert_eq!(lines[3], "https://a.com/,ok,200,,img-src,data:");
    assert_eq!(lines[4], "https://a.com/slow,error,0,timeout,,");
    assert_eq!(lines[5], "https://a.com/plain,ok,200,,,");
    assert_eq!(lines.len(), 6);
}

#[test]
fn test_page_findings_csv_space_joins_domains() {
    let mut aggregator = Aggregator::new();
    let url = "https://a.com/".to_string();
    aggregator.record_page(
        &ok_result(&url),
        &[
            reference(ResourceCategory::Script, "https://cdn.y/a.js"),
            reference(ResourceCategory::Script, "https://cdn.x/a.js"),
        ],
    );
    let (pages, domain_summary) = aggregator.into_parts();
    let inventory = Inventory {
        urls: vec![url],
        pages,
        domain_summary,
        generated_at: Utc::now(),
    };

    let csv = generate_page_findings_csv(&inventory).unwrap();
    assert!(csv.contains("https://a.com/,ok,200,,script-src,cdn.x cdn.y"));
}

// ============================================================================
// Text Summary Tests
// ============================================================================

#[test]
fn test_text_summary_counts() {
    let summary = generate_text_summary(&sample_inventory());

    assert!(summary.contains("Pages crawled: 3"));
    assert!(summary.contains("Failed fetches: 1"));
    assert!(summary.contains("Pages with external resources: 1"));
    assert!(summary.contains("Directive/domain pairs: 3"));
}

#[test]
fn test_text_summary_lists_failures_and_domains() {
    let summary = generate_text_summary(&sample_inventory());

    assert!(summary.contains("https://a.com/slow (timeout)"));
    assert!(summary.contains("cdn.x"));
    assert!(summary.contains("fonts.googleapis.com"));
}

#[test]
fn test_text_summary_empty_inventory() {
    let inventory = Inventory {
        urls: Vec::new(),
        pages: Default::default(),
        domain_summary: Default::default(),
        generated_at: Utc::now(),
    };
    let summary = generate_text_summary(&inventory);

    assert!(summary.contains("Pages crawled: 0"));
    assert!(!summary.contains("Failed pages"));
}

// ============================================================================
// File Output Tests
// ============================================================================

#[test]
fn test_save_report_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.json");

    let json = generate_json_report(&sample_inventory()).unwrap();
    save_report(&json, &path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, json);
}

#[test]
fn test_save_report_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("inventory.json");

    assert!(save_report("{}", &path).is_err());
}
