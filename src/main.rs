mod api;
mod app;
mod cli;
mod config;
mod error;
mod eventlog;
mod format;
mod prompt;
mod render;
mod router;
mod session;
mod store;
#[cfg(test)]
mod testing;

use app::LttApp;
use clap::Parser;
use cli::Cli;
use config::AppConfig;
use error::CliResult;
use std::process;

fn main() {
    if let Err(err) = run() {
        eprintln!("ltt: {}", err.message);
        process::exit(err.exit_code);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let app = LttApp::new(AppConfig::from_env())?;
    app.run(cli.command)
}
