//! Board Schema Definitions
//!
//! Data structures for the parts of a KiCad board file (.kicad_pcb) that the
//! BOM cares about: footprints, their pads and the net table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::schema::{At, TitleBlock};

/// A complete board document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    pub uuid: String,
    pub filename: String,
    pub version: Option<String>,
    pub generator: Option<String>,
    #[serde(default)]
    pub title_block: TitleBlock,
    #[serde(default)]
    pub nets: Vec<BoardNet>,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
}

impl Board {
    pub fn new(filename: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn net_by_number(&self, number: u32) -> Option<&BoardNet> {
        self.nets.iter().find(|n| n.number == number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardNet {
    pub number: u32,
    pub name: String,
}

/// Footprint attribute flags from `(attr ...)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootprintAttributes {
    pub smd: bool,
    pub through_hole: bool,
    pub board_only: bool,
    pub exclude_from_pos_files: bool,
    pub exclude_from_bom: bool,
    pub dnp: bool,
}

/// Footprint (component) on the board
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Footprint {
    pub uuid: String,
    /// Library link such as `Resistor_SMD:R_0402_1005Metric`
    pub library_link: String,
    pub layer: String,
    #[serde(default)]
    pub at: At,
    pub reference: String,
    pub value: String,
    pub descr: Option<String>,
    #[serde(default)]
    pub attributes: FootprintAttributes,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(default)]
    pub pads: Vec<Pad>,
}

impl Footprint {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Footprint name for the BOM: explicit property, else the library link.
    pub fn footprint_name(&self) -> &str {
        self.property("Footprint").unwrap_or(&self.library_link)
    }

    pub fn datasheet(&self) -> &str {
        self.property("Datasheet").unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.descr
            .as_deref()
            .or_else(|| self.property("Description"))
            .unwrap_or("")
    }

    pub fn pad_by_number(&self, number: &str) -> Option<&Pad> {
        self.pads.iter().find(|p| p.number == number)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pad {
    pub number: String,
    pub pad_type: String,
    pub shape: String,
    pub net: Option<u32>,
    pub uuid: Option<String>,
}
