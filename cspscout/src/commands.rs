use crate::handlers::DEFAULT_OUTPUT_DIR;
use clap::{arg, command};
use cspscout_scanner::fetcher::DEFAULT_USER_AGENT;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("cspscout")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("cspscout")
        .about("Inventory the third-party origins a site loads, to draft a Content-Security-Policy")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("scan")
                .about(
                    "Crawl every page listed in a sitemap and record the external domains each \
                page loads resources from, grouped by CSP directive.",
                )
                .arg(
                    arg!(-s --"sitemap" <LOCATION>)
                        .required(true)
                        .help("Sitemap URL or local path. Sitemap indexes are followed."),
                )
                .arg(
                    arg!(-o --"output-dir" <DIR>)
                        .required(false)
                        .help("Directory for the JSON, CSV and policy draft reports")
                        .default_value(DEFAULT_OUTPUT_DIR),
                )
                .arg(
                    arg!(-c --"concurrency" <N>)
                        .required(false)
                        .help("Maximum number of page fetches in flight at once")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("8"),
                )
                .arg(
                    arg!(-t --"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-page request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("20"),
                )
                .arg(
                    arg!(-l --"limit" <N>)
                        .required(false)
                        .help("Only crawl the first N sitemap URLs (0 = no limit)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    arg!(-A --"user-agent" <UA>)
                        .required(false)
                        .help("User-Agent header sent with every page request")
                        .default_value(DEFAULT_USER_AGENT),
                )
                .arg(
                    arg!(--"no-cycle-guard")
                        .required(false)
                        .help("Do not skip sitemap indexes that were already visited")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-v --"verbose")
                        .required(false)
                        .help("Enable debug logging on stderr")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
