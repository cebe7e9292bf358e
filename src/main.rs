use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod diagram;
mod diff;
mod error;
mod lexer;
mod parser;
mod plan;
mod section;
mod session;

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - only show logs with --verbose. Logs go to stderr
    // so command output stays pipeable JSON.
    let filter = if cli.verbose {
        EnvFilter::new("planview=debug")
    } else {
        EnvFilter::new("planview=warn")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Parse(args) => cli::parse::execute(args),
        Commands::Diff(args) => cli::diff::execute(args),
        Commands::Schema => cli::schema::execute(),
        Commands::SessionId(args) => cli::session::execute(args),
    }
}
