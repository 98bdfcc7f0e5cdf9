use crate::document::CacheDocument;
use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not write cache file {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Classification cache backed by one JSON file.
///
/// The whole document is read at once and replaced at once. There is no
/// locking, so two processes sharing a path will lose each other's writes.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache, surfacing every problem. A missing file is an empty cache.
    pub fn try_load(&self) -> Result<CacheDocument> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache at {}, starting empty", self.path.display());
                return Ok(CacheDocument::new());
            }
            Err(e) => return Err(CacheError::Io(e)),
        };

        serde_json::from_str(&contents).map_err(|source| CacheError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Read the cache, degrading to an empty document on any failure.
    ///
    /// The file on disk is left alone; it only gets replaced by the next save.
    pub fn load(&self) -> CacheDocument {
        match self.try_load() {
            Ok(doc) => {
                debug!(
                    "Loaded {} cached classifications from {}",
                    doc.record_count(),
                    self.path.display()
                );
                doc
            }
            Err(e) => {
                warn!("{}; starting with an empty cache", e);
                CacheDocument::new()
            }
        }
    }

    /// Stamp `lastUpdated` and atomically replace the file.
    ///
    /// The document is written to a sibling temp file and renamed over the
    /// old one, so a crash mid-write leaves the previous cache intact.
    pub fn save(&self, doc: &mut CacheDocument) -> Result<()> {
        doc.last_updated = Some(Utc::now());

        let mut contents = serde_json::to_string_pretty(doc)?;
        contents.push('\n');

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        self.write_atomic(&dir, contents.as_bytes())
            .map_err(|source| CacheError::WriteFailure {
                path: self.path.clone(),
                source,
            })?;

        info!("Cache saved to {}", self.path.display());
        Ok(())
    }

    fn write_atomic(&self, dir: &Path, bytes: &[u8]) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ProjectType;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path().join("absent.json"));

        let doc = store.try_load().unwrap();
        assert!(doc.repositories.is_empty());
        assert!(doc.last_updated.is_none());
    }

    #[test]
    fn test_corrupt_file_degrades_and_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let store = CacheStore::new(&path);
        assert!(matches!(store.try_load(), Err(CacheError::Corrupt { .. })));

        let doc = store.load();
        assert!(doc.repositories.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ this is not json");
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        // Parent directories are created on demand
        let store = CacheStore::new(dir.path().join(".cache").join("shared-projects.json"));

        let mut doc = CacheDocument::new();
        doc.upsert("relativedelta", ProjectType::Npm, Some("relativedelta".into()));
        doc.upsert("dotfiles", ProjectType::Npm, None);
        store.save(&mut doc).unwrap();

        assert!(doc.last_updated.is_some());

        let loaded = store.load();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_saved_file_matches_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let store = CacheStore::new(&path);

        let mut doc = CacheDocument::new();
        doc.upsert("repoA", ProjectType::Npm, Some("foo-lib".into()));
        store.save(&mut doc).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["repositories"]["repoA"]["type"], "npm");
        assert_eq!(raw["repositories"]["repoA"]["id"], "foo-lib");
        assert!(raw["lastUpdated"].is_string());
    }

    #[test]
    fn test_unwritable_location_is_write_failure() {
        let dir = TempDir::new().unwrap();
        // A regular file where the parent directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = CacheStore::new(blocker.join("cache.json"));

        let mut doc = CacheDocument::new();
        let result = store.save(&mut doc);
        assert!(matches!(result, Err(CacheError::WriteFailure { .. })));
    }
}
