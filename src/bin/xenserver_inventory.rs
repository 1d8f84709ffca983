// xenserver-inventory - Ansible dynamic inventory for XenServer
use std::process::ExitCode;
use xentools::cli::args::{parse_or_exit, InventoryArgs};
use xentools::cli::commands::execute_inventory;
use xentools::cli::output::{ConsoleWriter, ErrorStyle};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args: InventoryArgs = parse_or_exit();
    let writer = ConsoleWriter::new();

    match execute_inventory(args, &writer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = writer.write_failure(ErrorStyle::Inventory, &e);
            ExitCode::FAILURE
        }
    }
}
