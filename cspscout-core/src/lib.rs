pub mod aggregate;
pub mod directive;
pub mod inventory;
pub mod policy;
pub mod report;

pub use aggregate::{Aggregator, DomainSummaryEntry, FetchState, FetchStatus, PageFinding};
pub use directive::{Directive, classify, is_external};
pub use inventory::{Inventory, InventoryOptions, execute_inventory};

pub fn print_banner() {
    println!(
        "\ncspscout v{} - Content-Security-Policy allowlist inventory\n",
        env!("CARGO_PKG_VERSION")
    );
}
