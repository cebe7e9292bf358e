pub mod diff;
pub mod parse;
pub mod schema;
pub mod session;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "planview")]
#[command(
    author,
    version,
    about = "Markdown implementation-plan parser, differ, and diagram generator"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a plan document and print its Plan JSON
    Parse(ParseArgs),

    /// Structurally diff two plan documents
    Diff(DiffArgs),

    /// Print JSON Schema for the Plan document
    Schema,

    /// Print the deterministic session id for a plan path
    SessionId(SessionIdArgs),
}

#[derive(Parser, Clone)]
pub struct ParseArgs {
    /// Plan markdown file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Project directory recorded in plan metadata (default: the file's parent)
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Version number recorded in plan metadata
    #[arg(long, default_value_t = 1)]
    pub plan_version: u32,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

#[derive(Parser, Clone)]
pub struct DiffArgs {
    /// Old plan markdown file
    #[arg(value_name = "OLD")]
    pub old: PathBuf,

    /// New plan markdown file
    #[arg(value_name = "NEW")]
    pub new: PathBuf,

    /// Project directory recorded in plan metadata (default: the old file's parent)
    #[arg(long)]
    pub project_dir: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct SessionIdArgs {
    /// Plan markdown file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}
