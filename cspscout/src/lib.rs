#[path = "commands.rs"]
pub mod commands;
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use commands::{CLAP_STYLING, command_argument_builder};
pub use handlers::{
    DEFAULT_OUTPUT_DIR, ScanConfig, expand_output_dir, init_logging, prepare_output_dir, run_scan,
    write_reports,
};

pub use cspscout_core::inventory::{Inventory, InventoryOptions, execute_inventory};
