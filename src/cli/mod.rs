// CLI module - Command line interface
pub mod args;
pub mod commands;
pub mod output;

pub use args::{InventoryArgs, InventoryMode, TagArgs, TagCommand};
pub use commands::{execute_inventory, execute_tags};
pub use output::{ConsoleWriter, ErrorStyle, OutputWriter};
