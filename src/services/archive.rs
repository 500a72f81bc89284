//! Zip packaging for batch output.

use indexmap::IndexMap;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive task failed: {0}")]
    Task(String),
}

/// Collects named entries, in insertion order, and compresses them into a zip.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    entries: IndexMap<String, Vec<u8>>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. A repeated name replaces the earlier bytes in place.
    pub fn add(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(name.into(), bytes);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Compress every entry with Deflate.
    pub fn build(&self) -> Result<Vec<u8>, ArchiveError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, bytes) in &self.entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// [`build`](Self::build) on the blocking pool.
    pub async fn build_async(self) -> Result<Vec<u8>, ArchiveError> {
        tokio::task::spawn_blocking(move || self.build())
            .await
            .map_err(|e| ArchiveError::Task(e.to_string()))?
    }
}
