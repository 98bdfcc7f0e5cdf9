// Shields endpoint data: one flat JSON object, one key per registry
use crate::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The `downloads.json` file README badges read from.
///
/// Each registry owns one top-level key. Updating a key leaves the others
/// alone so separate jobs can share the file.
pub struct BadgeFile {
    path: PathBuf,
}

impl BadgeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents; anything missing or unreadable reads as empty
    pub fn read(&self) -> Map<String, Value> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return Map::new(),
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(
                    "Error parsing existing badge data in {}, creating new file",
                    self.path.display()
                );
                Map::new()
            }
        }
    }

    /// Replace one key and write the file back
    pub fn update<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut data = self.read();
        data.insert(key.to_string(), serde_json::to_value(value)?);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(&Value::Object(data))?;
        std::fs::write(&self.path, contents)?;

        info!("Badge data for {} updated in {}", key, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModrinthStats, NpmStats};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_update_merges_keys() {
        let dir = TempDir::new().unwrap();
        let badge = BadgeFile::new(dir.path().join("shields").join("downloads.json"));

        badge
            .update("modrinth", &ModrinthStats { projects: 3, downloads: 900 })
            .unwrap();
        badge
            .update("npm", &NpmStats { packages: 1, downloads: 50 })
            .unwrap();
        badge
            .update("npm", &NpmStats { packages: 2, downloads: 75 })
            .unwrap();

        assert_eq!(
            Value::Object(badge.read()),
            json!({
                "modrinth": {"projects": 3, "downloads": 900},
                "npm": {"packages": 2, "downloads": 75}
            })
        );
    }

    #[test]
    fn test_garbage_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("downloads.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let badge = BadgeFile::new(&path);
        assert!(badge.read().is_empty());

        badge
            .update("npm", &NpmStats { packages: 0, downloads: 0 })
            .unwrap();
        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, json!({"npm": {"packages": 0, "downloads": 0}}));
    }

    #[test]
    fn test_output_is_two_space_indented() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("downloads.json");
        let badge = BadgeFile::new(&path);

        badge
            .update("modrinth", &ModrinthStats { projects: 1, downloads: 2 })
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        // serde_json keeps object keys sorted
        assert!(text.starts_with("{\n  \"modrinth\": {\n    \"downloads\": 2,\n    \"projects\": 1"));
    }
}
