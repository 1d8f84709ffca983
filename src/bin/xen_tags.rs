// xen-tags - Add or remove tags on XenServer VMs
use std::process::ExitCode;
use xentools::cli::args::{parse_or_exit, TagArgs};
use xentools::cli::commands::execute_tags;
use xentools::cli::output::{ConsoleWriter, ErrorStyle};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args: TagArgs = parse_or_exit();

    match execute_tags(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = ConsoleWriter::new().write_failure(ErrorStyle::Tag, &e);
            ExitCode::FAILURE
        }
    }
}
