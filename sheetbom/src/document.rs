//! Loaded documents and file classification.

use serde::Serialize;

use crate::core::SheetbomError;
use crate::parser::kicad::KicadParser;
use crate::parser::pcb::PcbParser;
use crate::parser::pcb_schema::Board;
use crate::parser::schema::Schematic;

/// File types a project can contain, selected by filename suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FileKind {
    Schematic,
    Board,
    Project,
}

impl FileKind {
    pub fn from_filename(name: &str) -> Option<Self> {
        if name.ends_with(".kicad_sch") {
            Some(FileKind::Schematic)
        } else if name.ends_with(".kicad_pcb") {
            Some(FileKind::Board)
        } else if name.ends_with(".kicad_pro") {
            Some(FileKind::Project)
        } else {
            None
        }
    }
}

/// A parsed schematic or board, keyed by its filename.
#[derive(Debug, Clone)]
pub enum Document {
    Schematic(Schematic),
    Board(Board),
}

impl Document {
    /// Parse file content, choosing the reader by the filename suffix.
    pub fn parse(filename: &str, content: &str) -> Result<Self, SheetbomError> {
        match FileKind::from_filename(filename) {
            Some(FileKind::Schematic) => KicadParser::parse_schematic_str(content, filename)
                .map(Document::Schematic)
                .map_err(|e| SheetbomError::parse(filename, e)),
            Some(FileKind::Board) => PcbParser::parse_board_str(content, filename)
                .map(Document::Board)
                .map_err(|e| SheetbomError::parse(filename, e)),
            _ => Err(SheetbomError::UnsupportedFile(filename.to_string())),
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            Document::Schematic(s) => &s.filename,
            Document::Board(b) => &b.filename,
        }
    }

    pub fn uuid(&self) -> &str {
        match self {
            Document::Schematic(s) => &s.uuid,
            Document::Board(b) => &b.uuid,
        }
    }

    pub fn kind(&self) -> FileKind {
        match self {
            Document::Schematic(_) => FileKind::Schematic,
            Document::Board(_) => FileKind::Board,
        }
    }

    pub fn as_schematic(&self) -> Option<&Schematic> {
        match self {
            Document::Schematic(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_board(&self) -> Option<&Board> {
        match self {
            Document::Board(b) => Some(b),
            _ => None,
        }
    }
}

impl From<Schematic> for Document {
    fn from(s: Schematic) -> Self {
        Document::Schematic(s)
    }
}

impl From<Board> for Document {
    fn from(b: Board) -> Self {
        Document::Board(b)
    }
}

/// Look up a filename: exact match first, then any name ending in `/<name>`.
pub(crate) fn match_filename<'a, I>(names: I, wanted: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    if let Some(exact) = names.clone().into_iter().find(|n| *n == wanted) {
        return Some(exact);
    }
    let suffix = format!("/{}", wanted);
    names.into_iter().find(|n| n.ends_with(&suffix))
}

/// `amp` for `sub/amp.kicad_sch`.
pub fn file_stem(filename: &str) -> &str {
    let base = filename.rsplit('/').next().unwrap_or(filename);
    match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    }
}
