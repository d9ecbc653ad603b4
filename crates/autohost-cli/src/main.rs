use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

mod app;
mod ci;
mod cli;
mod deploy;
mod dns;
mod doctor;
mod expose;
mod handlers;
mod hints;
mod init;
mod progress;
mod setup;
mod status;
mod style;

fn init_tracing(verbose: bool) {
    // Target prefixes match autohost_cli, autohost_utils and autohost_core.
    let default = if verbose { "autohost=debug" } else { "autohost=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    match handlers::run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", style::CROSS, format!("{e:#}").red());
            std::process::exit(1);
        }
    }
}
