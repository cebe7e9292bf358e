use std::path::PathBuf;
use thiserror::Error;

// The parse core never fails; only the CLI boundary (reading plan files,
// serializing output) can.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read plan file '{}': {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
