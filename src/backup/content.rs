//! Content-addressed file store inside a backup

use std::path::{Path, PathBuf};

/// Location of one content hash inside a backup root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub exists: bool,
}

/// Map a content hash to `root/<hash[0:2]>/<hash>`. Never fails; a missing
/// file is reported through `exists`.
pub fn resolve(root: &Path, file_id: &str) -> ResolvedFile {
    let shard = file_id.get(..2).unwrap_or(file_id);
    let path = root.join(shard).join(file_id);
    let exists = path.is_file();
    ResolvedFile { path, exists }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_resolves_shard_layout_without_file() {
        let root = Path::new("/backups/snap");
        let hash = "3d0d7e5fb2ce288813306e4d4636395e047a3d28";
        let resolved = resolve(root, hash);
        assert_eq!(resolved.path, root.join("3d").join(hash));
        assert!(!resolved.exists);
    }

    #[test]
    fn test_reports_existing_file() {
        let tmp = tempdir().unwrap();
        let hash = "ab12cd";
        fs::create_dir_all(tmp.path().join("ab")).unwrap();
        fs::write(tmp.path().join("ab").join(hash), b"x").unwrap();

        let resolved = resolve(tmp.path(), hash);
        assert!(resolved.exists);
        assert_eq!(resolved.path, tmp.path().join("ab/ab12cd"));
    }
}
