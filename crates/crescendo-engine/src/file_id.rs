//! Cache keys identifying one version of one file's content.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Identity of one version of one file: canonical path + mtime.
///
/// The modification time is part of the key, so editing a file produces a
/// new, distinct `FileId`. Stale cache entries for the old version are
/// orphaned rather than ever being returned for the new content; explicit
/// invalidation reclaims their space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FileId {
    path: PathBuf,
    modified: SystemTime,
}

impl FileId {
    /// Build the id for a file on disk: canonicalize the path and read its
    /// modification time.
    pub fn for_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().canonicalize()?;
        let modified = std::fs::metadata(&path)?.modified()?;
        Ok(Self { path, modified })
    }

    /// Build an id from parts already known to the caller.
    ///
    /// Useful when a front end stats files itself; prefer [`FileId::for_path`]
    /// otherwise, which also canonicalizes.
    pub fn new(path: impl Into<PathBuf>, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            modified,
        }
    }

    /// Placeholder id for a path that could not be inspected. Results keyed
    /// by it carry a failure status and are never cached.
    pub(crate) fn unverified(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    /// The canonical path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time captured when the id was built.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// File name without its extension, for display.
    pub fn file_stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|s| s.to_str())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn same_file_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.wav");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"xx")
            .unwrap();

        let a = FileId::for_path(&path).unwrap();
        let b = FileId::for_path(&path).unwrap();
        assert_eq!(a, b);
        assert!(a.path().is_absolute());
    }

    #[test]
    fn different_mtime_different_id() {
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let a = FileId::new("/music/track.wav", base);
        let b = FileId::new("/music/track.wav", base + Duration::from_secs(5));
        assert_ne!(a, b);
        assert_eq!(a.path(), b.path());
    }

    #[test]
    fn missing_file_fails_to_stat() {
        assert!(FileId::for_path("/nonexistent/missing.wav").is_err());
    }

    #[test]
    fn file_stem_strips_extension() {
        let id = FileId::new("/music/My Track.wav", SystemTime::UNIX_EPOCH);
        assert_eq!(id.file_stem(), Some("My Track"));
    }
}
