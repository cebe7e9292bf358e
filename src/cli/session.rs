use crate::cli::SessionIdArgs;
use crate::session::session_id_from_path;
use std::path::absolute;

pub fn execute(args: SessionIdArgs) -> anyhow::Result<()> {
    // Hash the absolute path so the id matches what watching/storage
    // collaborators derive for the same document.
    let path = absolute(&args.file)?;
    println!("{}", session_id_from_path(&path));
    Ok(())
}
