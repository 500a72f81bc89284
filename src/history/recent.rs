use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

/// Number of payloads remembered by default
pub const RECENT_CAPACITY: usize = 5;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecentFile {
    #[serde(default)]
    payloads: Vec<String>,
}

/// Recently used payload strings, newest first, persisted as YAML.
///
/// Recording a payload that is already present leaves the list untouched.
#[derive(Debug, Clone)]
pub struct RecentPayloads {
    path: Utf8PathBuf,
    capacity: usize,
    entries: Vec<String>,
}

impl RecentPayloads {
    /// Load the list stored at `path`.
    ///
    /// A missing file yields an empty list. So does an unreadable one; the
    /// parse failure is logged and the file is overwritten on the next save.
    pub fn load<P: AsRef<Utf8Path>>(path: P, capacity: usize) -> Self {
        let path = path.as_ref().to_path_buf();
        let capacity = capacity.max(1);

        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_yaml_ng::from_str::<RecentFile>(&contents) {
                Ok(file) => file.payloads,
                Err(e) => {
                    tracing::warn!("Failed to parse recent payloads at {}: {}", path, e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read recent payloads at {}: {}", path, e);
                Vec::new()
            }
        };

        let mut recent = Self {
            path,
            capacity,
            entries,
        };
        recent.entries.truncate(capacity);
        recent
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Remember `payload` and persist.
    ///
    /// Returns `Ok(false)` when the payload was blank or already present.
    pub fn record(&mut self, payload: &str) -> Result<bool> {
        if payload.trim().is_empty() || self.entries.iter().any(|p| p == payload) {
            return Ok(false);
        }

        self.entries.insert(0, payload.to_string());
        self.entries.truncate(self.capacity);
        self.save()?;

        tracing::debug!("Recorded recent payload ({} stored)", self.entries.len());
        Ok(true)
    }

    /// Forget everything and delete the backing file.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove recent payloads: {}", self.path))?;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent))?;
            }
        }

        let file = RecentFile {
            payloads: self.entries.clone(),
        };
        let yaml = serde_yaml_ng::to_string(&file)
            .context("Failed to serialize recent payloads to YAML")?;

        fs::write(&self.path, yaml)
            .with_context(|| format!("Failed to write recent payloads: {}", self.path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn recent_path(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().join("recent.yaml")).unwrap()
    }

    #[test]
    fn test_record_newest_first_with_cap() {
        let temp_dir = TempDir::new().unwrap();
        let mut recent = RecentPayloads::load(recent_path(&temp_dir), RECENT_CAPACITY);

        for i in 0..7 {
            assert!(recent.record(&format!("https://site{}.com", i)).unwrap());
        }

        assert_eq!(recent.entries().len(), 5);
        assert_eq!(recent.entries()[0], "https://site6.com");
        assert_eq!(recent.entries()[4], "https://site2.com");
    }

    #[test]
    fn test_duplicates_and_blanks_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let mut recent = RecentPayloads::load(recent_path(&temp_dir), RECENT_CAPACITY);

        recent.record("a").unwrap();
        recent.record("b").unwrap();
        assert!(!recent.record("a").unwrap());
        assert!(!recent.record("   ").unwrap());

        assert_eq!(recent.entries(), ["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_persists_and_clears() {
        let temp_dir = TempDir::new().unwrap();
        let path = recent_path(&temp_dir);

        let mut recent = RecentPayloads::load(&path, RECENT_CAPACITY);
        recent.record("https://example.com").unwrap();

        let reloaded = RecentPayloads::load(&path, RECENT_CAPACITY);
        assert_eq!(reloaded.entries(), ["https://example.com".to_string()]);

        recent.clear().unwrap();
        assert!(!path.exists());
        assert!(RecentPayloads::load(&path, RECENT_CAPACITY).entries().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = recent_path(&temp_dir);
        fs::write(&path, "payloads: {not: [a list").unwrap();

        let recent = RecentPayloads::load(&path, RECENT_CAPACITY);
        assert!(recent.entries().is_empty());
    }
}
