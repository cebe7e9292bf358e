use crate::cli::ParseArgs;
use crate::error::CliError;
use crate::parser::parse_markdown_to_plan;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

pub fn execute(args: ParseArgs) -> anyhow::Result<()> {
    let markdown = fs::read_to_string(&args.file).map_err(|source| CliError::ReadFile {
        path: args.file.clone(),
        source,
    })?;

    let project_dir = args
        .project_dir
        .clone()
        .unwrap_or_else(|| parent_of(&args.file));

    let result = parse_markdown_to_plan(&markdown, &args.file, &project_dir, args.plan_version);

    for warning in &result.warnings {
        warn!("{warning}");
    }
    info!(
        "Parsed {} phases, {} warnings from {}",
        result.plan.phases.len(),
        result.warnings.len(),
        args.file.display()
    );

    let json = if args.compact {
        serde_json::to_string(&result.plan)
    } else {
        serde_json::to_string_pretty(&result.plan)
    }
    .map_err(CliError::Serialize)?;
    println!("{json}");

    Ok(())
}

pub(crate) fn parent_of(file: &std::path::Path) -> PathBuf {
    file.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(std::path::Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
