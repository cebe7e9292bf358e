use crate::cli::DiffArgs;
use crate::diff::diff_plans;
use crate::error::CliError;
use crate::parser::parse_markdown_to_plan;
use std::fs;
use std::path::Path;
use tracing::info;

pub fn execute(args: DiffArgs) -> anyhow::Result<()> {
    let project_dir = args
        .project_dir
        .clone()
        .unwrap_or_else(|| super::parse::parent_of(&args.old));

    let old_plan = read_and_parse(&args.old, &project_dir, 1)?;
    let new_plan = read_and_parse(&args.new, &project_dir, 2)?;

    let diffs = diff_plans(&old_plan, &new_plan);
    info!(
        "{} section(s) differ between {} and {}",
        diffs.len(),
        args.old.display(),
        args.new.display()
    );

    let json = serde_json::to_string_pretty(&diffs).map_err(CliError::Serialize)?;
    println!("{json}");

    Ok(())
}

fn read_and_parse(
    file: &Path,
    project_dir: &Path,
    version: u32,
) -> anyhow::Result<crate::plan::Plan> {
    let markdown = fs::read_to_string(file).map_err(|source| CliError::ReadFile {
        path: file.to_path_buf(),
        source,
    })?;
    Ok(parse_markdown_to_plan(&markdown, file, project_dir, version).plan)
}
