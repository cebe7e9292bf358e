//! Stable session identity for plan documents.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Deterministic session id for a plan: SHA-256 of the absolute source path,
/// truncated to 8 hex chars. Storage collaborators key snapshots by this.
pub fn session_id_from_path(path: &Path) -> String {
    let hash = Sha256::digest(path.to_string_lossy().as_bytes());
    format!("{:x}", hash)[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_eight_hex_chars() {
        let id = session_id_from_path(Path::new("/test/plan.md"));
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_id_is_deterministic() {
        let a = session_id_from_path(Path::new("/test/plan.md"));
        let b = session_id_from_path(Path::new("/test/plan.md"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_ids_differ_for_distinct_paths() {
        let a = session_id_from_path(Path::new("/test/a.md"));
        let b = session_id_from_path(Path::new("/test/b.md"));
        assert_ne!(a, b);
    }
}
