// Report generation from a finished inventory

use crate::aggregate::{DomainSummaryEntry, PageFinding};
use crate::directive::Directive;
use crate::inventory::Inventory;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const JSON_REPORT_FILE: &str = "inventory.json";
pub const DOMAIN_SUMMARY_FILE: &str = "domain_summary.csv";
pub const PAGE_FINDINGS_FILE: &str = "page_findings.csv";
pub const POLICY_DRAFT_FILE: &str = "csp-draft.txt";

const SAMPLE_SEPARATOR: &str = " | ";

#[derive(Debug, Serialize)]
struct SummaryEntryJson<'a> {
    count: u64,
    sample_pages: &'a [String],
}

#[derive(Debug, Serialize)]
struct InventoryJson<'a> {
    generated_at: String,
    total_urls: usize,
    pages: Vec<&'a PageFinding>,
    domain_summary: BTreeMap<Directive, BTreeMap<&'a str, SummaryEntryJson<'a>>>,
}

pub fn generate_json_report(inventory: &Inventory) -> Result<String, serde_json::Error> {
    let domain_summary = inventory
        .domain_summary
        .iter()
        .map(|(directive, tokens)| {
            let entries = tokens
                .iter()
                .map(|(token, entry)| {
                    (
                        token.as_str(),
                        SummaryEntryJson {
                            count: entry.count,
                            sample_pages: &entry.sample_pages,
                        },
                    )
                })
                .collect();
            (*directive, entries)
        })
        .collect();

    let report = InventoryJson {
        generated_at: inventory.generated_at.to_rfc3339(),
        total_urls: inventory.urls.len(),
        pages: inventory.ordered_pages().collect(),
        domain_summary,
    };

    serde_json::to_string_pretty(&report)
}

/// Domain summary entries sorted by descending count, then directive name and token.
pub fn sorted_summary_entries(inventory: &Inventory) -> Vec<&DomainSummaryEntry> {
    let mut entries: Vec<&DomainSummaryEntry> = inventory
        .domain_summary
        .values()
        .flat_map(|tokens| tokens.values())
        .collect();
    entries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(a.directive.as_str().cmp(b.directive.as_str()))
            .then(a.token.cmp(&b.token))
    });
    entries
}

pub fn write_domain_summary_csv<W: Write>(inventory: &Inventory, writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["directive", "domain", "count", "sample_pages"])?;

    for entry in sorted_summary_entries(inventory) {
        let count = entry.count.to_string();
        let samples = entry.sample_pages.join(SAMPLE_SEPARATOR);
        writer.write_record([
            entry.directive.as_str(),
            entry.token.as_str(),
            count.as_str(),
            samples.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_page_findings_csv<W: Write>(inventory: &Inventory, writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record([
        "page_url",
        "fetch_status",
        "http_code",
        "error",
        "directive",
        "domains",
    ])?;

    for page in inventory.ordered_pages() {
        let status = page.fetch_status.state.as_str();
        let http_code = page.fetch_status.http_code.to_string();
        let error = page.fetch_status.error.as_deref().unwrap_or("");

        if page.directive_domains.is_empty() {
            writer.write_record([page.page_url.as_str(), status, http_code.as_str(), error, "", ""])?;
            continue;
        }

        for (directive, domains) in &page.directive_domains {
            let domains = domains.iter().map(String::as_str).collect::<Vec<_>>().join(" ");
            writer.write_record([
                page.page_url.as_str(),
                status,
                http_code.as_str(),
                error,
                directive.as_str(),
                domains.as_str(),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}

pub fn generate_domain_summary_csv(inventory: &Inventory) -> csv::Result<String> {
    let mut buffer = Vec::new();
    write_domain_summary_csv(inventory, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn generate_page_findings_csv(inventory: &Inventory) -> csv::Result<String> {
    let mut buffer = Vec::new();
    write_page_findings_csv(inventory, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Console summary printed at the end of a run.
pub fn generate_text_summary(inventory: &Inventory) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str(&format!("{}\n", "# Summary:".bold()));
    report.push_str(&format!("  Pages crawled: {}\n", inventory.urls.len()));
    report.push_str(&format!("  Failed fetches: {}\n", inventory.failed_pages()));

    let pages_with_findings = inventory
        .pages
        .values()
        .filter(|p| !p.directive_domains.is_empty())
        .count();
    report.push_str(&format!(
        "  Pages with external resources: {}\n",
        pages_with_findings
    ));

    let total_domains: usize = inventory.domain_summary.values().map(|t| t.len()).sum();
    report.push_str(&format!("  Directive/domain pairs: {}\n", total_domains));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    for (directive, tokens) in &inventory.domain_summary {
        report.push_str(&format!("## {}\n", directive.as_str().cyan()));
        report.push_str(&format!("  {} domains\n\n", tokens.len()));

        let mut entries: Vec<&DomainSummaryEntry> = tokens.values().collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.token.cmp(&b.token)));
        for entry in entries {
            report.push_str(&format!("  {:>6}  {}\n", entry.count, entry.token));
        }
        report.push('\n');
    }

    let failed: Vec<&PageFinding> = inventory.ordered_pages().filter(|p| !p.is_ok()).collect();
    if !failed.is_empty() {
        report.push_str(&format!("{}\n", "## Failed pages".yellow()));
        for page in failed {
            let reason = page.fetch_status.error.as_deref().unwrap_or("unknown error");
            report.push_str(&format!("  {} ({})\n", page.page_url, reason));
        }
        report.push('\n');
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
