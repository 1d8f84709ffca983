use crate::core::tags::TagAction;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Options shared by both tools
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress logging
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Command line arguments for xen-tags
#[derive(Parser, Debug)]
#[command(
    name = "xen-tags",
    version = env!("CARGO_PKG_VERSION"),
    about = "Add or remove tags on XenServer virtual machines",
    long_about = "Add or remove tags on XenServer virtual machines.\n\nConnection settings are read from XENSERVER_HOST, XENSERVER_USER and XENSERVER_PASSWORD."
)]
pub struct TagArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Tag operation
    #[command(subcommand)]
    pub command: TagCommand,
}

/// Tag operations
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TagCommand {
    /// Add a tag to a VM
    Add {
        /// VM name label
        vm_name: String,
        /// Tag to add
        tag: String,
    },
    /// Remove a tag from a VM
    Rm {
        /// VM name label
        vm_name: String,
        /// Tag to remove
        tag: String,
    },
}

impl TagCommand {
    pub fn action(&self) -> TagAction {
        match self {
            TagCommand::Add { .. } => TagAction::Add,
            TagCommand::Rm { .. } => TagAction::Remove,
        }
    }

    pub fn vm_name(&self) -> &str {
        match self {
            TagCommand::Add { vm_name, .. } | TagCommand::Rm { vm_name, .. } => vm_name,
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            TagCommand::Add { tag, .. } | TagCommand::Rm { tag, .. } => tag,
        }
    }
}

/// Command line arguments for xenserver-inventory
#[derive(Parser, Debug)]
#[command(
    name = "xenserver-inventory",
    version = env!("CARGO_PKG_VERSION"),
    about = "Get list of VMs within XenServer",
    long_about = "Ansible dynamic inventory for XenServer. VMs are grouped by their tags; production, nonproduction, linux and windows tags nest the other tags as child groups."
)]
pub struct InventoryArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// List all VMs running in XenServer
    #[arg(long)]
    pub list: bool,

    /// Return information about a running guest VM
    #[arg(long, value_name = "NAME")]
    pub host: Option<String>,

    /// Rebuild the inventory cache
    #[arg(long)]
    pub refresh: bool,
}

/// What the inventory tool should print
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryMode {
    List,
    Host(String),
}

impl InventoryArgs {
    /// `--list` unless only `--host` was given.
    pub fn mode(&self) -> InventoryMode {
        match (&self.host, self.list) {
            (Some(host), false) => InventoryMode::Host(host.clone()),
            _ => InventoryMode::List,
        }
    }
}

/// Parse arguments, exiting with status 1 on usage errors and 0 for
/// `--help` / `--version`.
pub fn parse_or_exit<P: Parser>() -> P {
    match P::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    }
}
