use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;

use nmap_wrap_rs::app::{self, EXIT_FAILURE};
use nmap_wrap_rs::cli::Cli;
use nmap_wrap_rs::console::{SharedSink, TerminalSink};
use nmap_wrap_rs::logging::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let sink: SharedSink = Arc::new(TerminalSink);
    match app::run(cli, sink).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {e:#}", "Fatal error:".red());
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
