use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use cspscout_core::inventory::{
    Inventory, InventoryOptions, InventoryProgressCallback, execute_inventory,
};
use cspscout_core::policy::draft_policy;
use cspscout_core::report::{
    DOMAIN_SUMMARY_FILE, JSON_REPORT_FILE, PAGE_FINDINGS_FILE, POLICY_DRAFT_FILE,
    generate_json_report, generate_text_summary, save_report, write_domain_summary_csv,
    write_page_findings_csv,
};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

pub const DEFAULT_OUTPUT_DIR: &str = "csp-inventory";

/// Validated settings for a `scan` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub sitemap: String,
    pub output_dir: PathBuf,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub limit: usize,
    pub user_agent: String,
    pub cycle_guard: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl ScanConfig {
    /// Build a config from the `scan` subcommand matches.
    pub fn from_matches(args: &ArgMatches) -> Result<Self, String> {
        let sitemap = args
            .get_one::<String>("sitemap")
            .ok_or("--sitemap is required")?;
        let output_dir = args
            .get_one::<String>("output-dir")
            .map(String::as_str)
            .unwrap_or(DEFAULT_OUTPUT_DIR);
        let user_agent = args
            .get_one::<String>("user-agent")
            .ok_or("--user-agent must not be empty")?;

        let config = ScanConfig {
            sitemap: sitemap.trim().to_string(),
            output_dir: expand_output_dir(output_dir),
            concurrency: args.get_one::<usize>("concurrency").copied().unwrap_or(8),
            timeout_secs: args.get_one::<u64>("timeout").copied().unwrap_or(20),
            limit: args.get_one::<usize>("limit").copied().unwrap_or(0),
            user_agent: user_agent.clone(),
            cycle_guard: !args.get_flag("no-cycle-guard"),
            verbose: args.get_flag("verbose"),
            quiet: args.get_flag("quiet"),
        };
        config.validate()
    }

    pub fn validate(self) -> Result<Self, String> {
        if self.sitemap.is_empty() {
            return Err("Sitemap location must not be empty".to_string());
        }
        if self.concurrency < 1 {
            return Err(format!(
                "Concurrency must be at least 1 (got {})",
                self.concurrency
            ));
        }
        if self.timeout_secs < 1 {
            return Err(format!(
                "Timeout must be at least 1 second (got {})",
                self.timeout_secs
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err("User agent must not be empty".to_string());
        }
        Ok(self)
    }

    pub fn inventory_options(&self) -> InventoryOptions {
        InventoryOptions {
            sitemap: self.sitemap.clone(),
            concurrency: self.concurrency,
            timeout_secs: self.timeout_secs,
            limit: self.limit,
            user_agent: self.user_agent.clone(),
            cycle_guard: self.cycle_guard,
            show_progress_bars: !self.quiet,
        }
    }
}

/// Expand a leading `~` in the output directory.
pub fn expand_output_dir(raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw.trim());
    PathBuf::from(expanded.as_ref())
}

/// Install the stderr log subscriber. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn prepare_output_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create output directory {}", path.display()))
}

/// Write the four report files and return their paths.
pub fn write_reports(inventory: &Inventory, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let json_path = output_dir.join(JSON_REPORT_FILE);
    let json = generate_json_report(inventory).context("Failed to serialize inventory")?;
    save_report(&json, &json_path)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    let summary_path = output_dir.join(DOMAIN_SUMMARY_FILE);
    let file = File::create(&summary_path)
        .with_context(|| format!("Failed to create {}", summary_path.display()))?;
    write_domain_summary_csv(inventory, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;

    let findings_path = output_dir.join(PAGE_FINDINGS_FILE);
    let file = File::create(&findings_path)
        .with_context(|| format!("Failed to create {}", findings_path.display()))?;
    write_page_findings_csv(inventory, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", findings_path.display()))?;

    let policy_path = output_dir.join(POLICY_DRAFT_FILE);
    let policy = format!("{}\n", draft_policy(&inventory.domain_summary));
    save_report(&policy, &policy_path)
        .with_context(|| format!("Failed to write {}", policy_path.display()))?;

    Ok(vec![json_path, summary_path, findings_path, policy_path])
}

/// Run a scan end to end: crawl, aggregate and write reports.
///
/// Nothing is written when the sitemap cannot be resolved.
pub async fn run_scan(config: &ScanConfig) -> Result<Inventory> {
    if !config.quiet {
        println!("{} Sitemap: {}", "→".blue(), config.sitemap.bright_white());
        println!(
            "{} Output: {}",
            "→".blue(),
            config.output_dir.display().to_string().bright_white()
        );
        println!(
            "{} Concurrency: {}, timeout: {}s\n",
            "→".blue(),
            config.concurrency,
            config.timeout_secs
        );
    }

    let progress_callback: Option<InventoryProgressCallback> = if config.quiet {
        None
    } else {
        Some(Arc::new(|msg: String| {
            println!("{} {}", "✓".green().bold(), msg);
        }))
    };

    let inventory = execute_inventory(config.inventory_options(), progress_callback)
        .await
        .with_context(|| format!("Failed to build inventory from {}", config.sitemap))?;

    prepare_output_dir(&config.output_dir)?;
    let written = write_reports(&inventory, &config.output_dir)?;

    if !config.quiet {
        println!();
        print!("{}", generate_text_summary(&inventory));
        for path in &written {
            println!("{} Wrote {}", "✓".green().bold(), path.display());
        }
    }

    Ok(inventory)
}

pub async fn handle_scan(args: &ArgMatches) {
    let config = match ScanConfig::from_matches(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    init_logging(config.verbose);

    if let Err(e) = run_scan(&config).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
