//! KiCad project file (.kicad_pro)
//!
//! The project file is JSON. Only the text variables and the sheet list are
//! read; every other section is ignored.

use std::collections::BTreeMap;
use std::path::Path;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectFileError {
    #[error("Invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default)]
    pub text_variables: BTreeMap<String, String>,
    /// `[uuid, name]` pairs, root sheet first
    #[serde(default)]
    pub sheets: Vec<(String, String)>,
}

impl ProjectSettings {
    pub fn from_json(content: &str) -> Result<Self, ProjectFileError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ProjectFileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn text_variable(&self, name: &str) -> Option<&str> {
        self.text_variables.get(name).map(String::as_str)
    }

    /// Sheet name recorded for a sheet UUID.
    pub fn sheet_name(&self, uuid: &str) -> Option<&str> {
        self.sheets
            .iter()
            .find(|(u, _)| u == uuid)
            .map(|(_, name)| name.as_str())
    }
}
