mod cli;
mod constants;
mod entity;
mod errors;
mod linux;
mod run;
mod sanity;
mod utils;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), errors::AlbiusError> {
    let cli_args = cli::Cli::parse();
    init_tracing(cli_args.verbose);

    run::run(cli_args)
}

// Logs go to stderr, stdout is reserved for the JSON report
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
