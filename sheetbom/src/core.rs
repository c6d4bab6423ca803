//! Crate error type, load configuration and file discovery shared by the
//! library and CLI.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SheetbomError {
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(String),
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),
}

impl SheetbomError {
    pub fn parse(file: impl Into<String>, err: impl std::fmt::Display) -> Self {
        SheetbomError::Parse {
            file: file.into(),
            message: err.to_string(),
        }
    }
}

/// Options for a project load.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Maximum number of documents fetched and parsed at once
    pub concurrency: usize,
    /// Abort on the first unreadable document instead of skipping it
    pub strict: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            strict: true,
        }
    }
}

impl LoadOptions {
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Recursively discover KiCad schematic, board and project files in a directory.
///
/// Results are sorted by path so listings are stable across platforms.
pub fn discover_kicad_files(dir: &Path) -> Result<Vec<PathBuf>, SheetbomError> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, depth: usize) -> Result<(), SheetbomError> {
    if depth > 20 {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            if matches!(name, "node_modules" | "target" | "build") || name.ends_with("-backups") {
                continue;
            }
            walk_dir(&path, files, depth + 1)?;
        } else if path.is_file() && crate::document::FileKind::from_filename(name).is_some() {
            files.push(path);
        }
    }
    Ok(())
}
