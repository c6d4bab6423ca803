//! Document Source Trait
//!
//! Where project files come from: a directory on disk or in-memory blobs.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{discover_kicad_files, SheetbomError};

/// A named piece of file content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub filename: String,
    pub content: String,
}

impl Blob {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Common trait for everything a project can be loaded from
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Human readable name for logs
    fn name(&self) -> &str;

    /// Filenames available from this source, in a stable order
    async fn list(&self) -> Result<Vec<String>, SheetbomError>;

    /// Full text of one listed file
    async fn read_text(&self, filename: &str) -> Result<String, SheetbomError>;
}

/// Files under a directory, named by their `/`-separated relative path.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    name: String,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root.display().to_string();
        Self { root, name }
    }
}

#[async_trait]
impl DocumentSource for DirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self) -> Result<Vec<String>, SheetbomError> {
        let root = self.root.clone();
        let files = tokio::task::spawn_blocking(move || discover_kicad_files(&root))
            .await
            .map_err(|e| SheetbomError::Source(e.to_string()))??;

        Ok(files
            .iter()
            .filter_map(|path| path.strip_prefix(&self.root).ok())
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect())
    }

    async fn read_text(&self, filename: &str) -> Result<String, SheetbomError> {
        Ok(tokio::fs::read_to_string(self.root.join(filename)).await?)
    }
}

/// Blobs held in memory, listed in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    blobs: Vec<Blob>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filename: impl Into<String>, content: impl Into<String>) -> Self {
        self.blobs.push(Blob::new(filename, content));
        self
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl FromIterator<Blob> for MemorySource {
    fn from_iter<T: IntoIterator<Item = Blob>>(iter: T) -> Self {
        Self {
            blobs: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<String>, SheetbomError> {
        Ok(self.blobs.iter().map(|b| b.filename.clone()).collect())
    }

    async fn read_text(&self, filename: &str) -> Result<String, SheetbomError> {
        self.blobs
            .iter()
            .find(|b| b.filename == filename)
            .map(|b| b.content.clone())
            .ok_or_else(|| SheetbomError::Source(format!("{} not found in memory source", filename)))
    }
}
