//! Sheetbom - KiCad sheet hierarchy and bill of materials library
//!
//! This library loads the schematics and boards of a KiCad project, works out
//! the sheet hierarchy (root sheet, page order, reused sub-sheets) and builds
//! a grouped bill of materials that honors per-placement overrides.
//!
//! # Quick Start
//!
//! ```no_run
//! use sheetbom::{DirectorySource, LoadOptions, Project};
//!
//! # async fn run() -> Result<(), sheetbom::SheetbomError> {
//! let source = DirectorySource::new("my_board");
//! let project = Project::load(&source, &LoadOptions::default()).await?;
//!
//! for page in project.pages() {
//!     println!("{} {} ({})", page.page_number, page.name, page.filename);
//! }
//! for row in project.bom_items() {
//!     println!("{} x {} [{}]", row.qty(), row.name, row.reference());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Hierarchy**: root detection from sheet instance tables, numeric page order, orphan sheets
//! - **BOM**: per-placement references, unit and placeholder filtering, grouping by part
//! - **Lookups**: labels by name or UUID, designators to their symbol and sheet
//! - **Loading**: concurrent fetch and parse from a directory or in-memory blobs

pub mod bom;
pub mod core;
pub mod document;
pub mod hierarchy;
pub mod parser;
pub mod project;
pub mod source;
pub mod text_vars;
pub mod visitor;
pub mod xref;

// Re-export main types
pub use crate::core::{discover_kicad_files, LoadOptions, SheetbomError};
pub use bom::{BomItem, BomSource, DesignatorRef, GroupedBomItem};
pub use document::{Document, FileKind};
pub use hierarchy::{Hierarchy, Page};
pub use parser::kicad::KicadParser;
pub use parser::pcb::PcbParser;
pub use parser::pcb_schema::Board;
pub use parser::project_file::ProjectSettings;
pub use parser::schema::Schematic;
pub use project::{Project, ProjectSummary};
pub use source::{Blob, DirectorySource, DocumentSource, MemorySource};
pub use xref::{CrossRefIndex, NetRef};

/// Parse a schematic file (convenience wrapper).
pub fn parse_schematic(path: &std::path::Path) -> Result<Schematic, SheetbomError> {
    KicadParser::parse_schematic(path).map_err(|e| SheetbomError::parse(path.display().to_string(), e))
}

/// Parse a board file (convenience wrapper).
pub fn parse_board(path: &std::path::Path) -> Result<Board, SheetbomError> {
    PcbParser::parse_board(path).map_err(|e| SheetbomError::parse(path.display().to_string(), e))
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        BomSource, DirectorySource, DocumentSource, GroupedBomItem, LoadOptions, MemorySource,
        Page, Project, SheetbomError,
    };
}
