//! Files the watcher tracks, and their content fingerprints.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::types::{FileFormat, TableName};

/// SHA-256 of a file's bytes, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(contents: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(contents)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A data file seen by the watcher.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchedFile {
    pub path: PathBuf,
    pub format: FileFormat,
    pub table: TableName,
    /// Fingerprint of the contents last synced successfully.
    pub fingerprint: Option<Fingerprint>,
}

impl WatchedFile {
    /// Returns `None` for hidden files, unknown extensions and file stems
    /// that are not valid table names.
    pub fn recognize(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.starts_with('.') {
            return None;
        }
        Some(Self {
            path: path.to_path_buf(),
            format: FileFormat::from_path(path)?,
            table: TableName::from_path(path)?,
            fingerprint: None,
        })
    }

    /// Whether `contents` match what was last synced.
    pub fn is_unchanged(&self, fingerprint: &Fingerprint) -> bool {
        self.fingerprint.as_ref() == Some(fingerprint)
    }
}

/// A path below `root` with a dot-prefixed component. Paths outside `root`
/// are judged by their file name alone.
pub fn is_hidden(path: &Path, root: &Path) -> bool {
    let hidden = |c: Component<'_>| {
        matches!(c, Component::Normal(name) if name.to_string_lossy().starts_with('.'))
    };
    match path.strip_prefix(root) {
        Ok(relative) => relative.components().any(hidden),
        Err(_) => path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.')),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint() {
        let a = Fingerprint::of(b"name,serial\n");
        assert_eq!(a, Fingerprint::of(b"name,serial\n"));
        assert_ne!(a, Fingerprint::of(b"name,serial\nPump1,SN001\n"));
        assert_eq!(
            Fingerprint::of(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_recognize() {
        let file = WatchedFile::recognize(Path::new("/data/Equipment.XLSX")).unwrap();
        assert_eq!(file.format, FileFormat::Spreadsheet);
        assert_eq!(file.table.as_str(), "Equipment");
        assert!(file.fingerprint.is_none());

        assert!(WatchedFile::recognize(Path::new("/data/.~lock.equipment.csv")).is_none());
        assert!(WatchedFile::recognize(Path::new("/data/notes.txt")).is_none());
        assert!(WatchedFile::recognize(Path::new("/data/README")).is_none());
    }

    #[test]
    fn test_is_unchanged() {
        let mut file = WatchedFile::recognize(Path::new("/data/a.csv")).unwrap();
        let fingerprint = Fingerprint::of(b"a\n1\n");
        assert!(!file.is_unchanged(&fingerprint));
        file.fingerprint = Some(fingerprint.clone());
        assert!(file.is_unchanged(&fingerprint));
    }

    #[test]
    fn test_is_hidden() {
        let root = Path::new("/home/me/.cache/data");
        assert!(!is_hidden(&root.join("a.csv"), root));
        assert!(is_hidden(&root.join(".a.csv"), root));
        assert!(is_hidden(&root.join(".git/a.csv"), root));
        assert!(!is_hidden(Path::new("/elsewhere/a.csv"), root));
        assert!(is_hidden(Path::new("/elsewhere/.a.csv"), root));
    }
}
