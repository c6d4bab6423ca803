//! KiCAD PCB Parser
//!
//! Reads the footprint and net tables of a `.kicad_pcb` file. Tracks, zones,
//! graphics and layer setup are not needed for the BOM and are skipped.
//!
//! Key format details:
//! - Footprints are `(footprint "LIB:NAME" ...)`; KiCad 5 wrote `(module ...)`
//! - KiCad 8 stores reference/value as `(property "Reference" "R1")`, older
//!   versions as `(fp_text reference "R1")`
//! - KiCad 6/7 identify items by `(tstamp ...)` instead of `(uuid ...)`

use std::path::Path;
use crate::parser::kicad::{parse_at, parse_properties, parse_title_block};
use crate::parser::pcb_schema::*;
use crate::parser::sexp::{SExp, SExpParser, ParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PcbParseError {
    #[error("S-expression parse error: {0}")]
    SExpParse(#[from] ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid PCB format: {0}")]
    InvalidFormat(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Parser for KiCAD PCB files (S-expression format, KiCad 6 and later)
pub struct PcbParser;

impl PcbParser {
    pub fn parse_board(path: &Path) -> Result<Board, PcbParseError> {
        let content = std::fs::read_to_string(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        Self::parse_board_str(&content, filename)
    }

    pub fn parse_board_str(content: &str, filename: &str) -> Result<Board, PcbParseError> {
        let root = SExpParser::new(content).parse()?;

        match root.tag() {
            Some("kicad_pcb") => {}
            Some(other) => {
                return Err(PcbParseError::InvalidFormat(format!(
                    "Expected kicad_pcb, found {}",
                    other
                )))
            }
            None => {
                return Err(PcbParseError::InvalidFormat(
                    "Expected kicad_pcb root".to_string(),
                ))
            }
        }

        let uuid = item_uuid(&root).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut board = Board::new(filename, uuid);
        board.version = root.value_of("version").map(str::to_string);
        board.generator = root.value_of("generator").map(str::to_string);

        for item in root.children() {
            match item.tag() {
                Some("title_block") => board.title_block = parse_title_block(item),
                Some("net") => {
                    if let Ok(net) = Self::parse_net(item) {
                        board.nets.push(net);
                    }
                }
                Some("footprint") | Some("module") => board.footprints.push(Self::parse_footprint(item)),
                _ => {}
            }
        }

        Ok(board)
    }

    /// (net ORDINAL "NAME")
    fn parse_net(sexp: &SExp) -> Result<BoardNet, PcbParseError> {
        let number = sexp
            .atom_at(1)
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| PcbParseError::MissingField("net number".to_string()))?;
        Ok(BoardNet {
            number,
            name: sexp.atom_at(2).unwrap_or_default().to_string(),
        })
    }

    fn parse_footprint(sexp: &SExp) -> Footprint {
        let properties = parse_properties(sexp);

        let mut reference = properties.get("Reference").cloned().unwrap_or_default();
        let mut value = properties.get("Value").cloned().unwrap_or_default();

        // Older format keeps these in fp_text
        for text in sexp.get_all("fp_text") {
            match (text.atom_at(1), text.atom_at(2)) {
                (Some("reference"), Some(t)) => reference = t.to_string(),
                (Some("value"), Some(t)) => value = t.to_string(),
                _ => {}
            }
        }

        let attributes = match sexp.get("attr") {
            Some(attr) => FootprintAttributes {
                smd: attr.has_atom("smd"),
                through_hole: attr.has_atom("through_hole"),
                board_only: attr.has_atom("board_only"),
                exclude_from_pos_files: attr.has_atom("exclude_from_pos_files"),
                exclude_from_bom: attr.has_atom("exclude_from_bom"),
                dnp: attr.has_atom("dnp"),
            },
            None => FootprintAttributes::default(),
        };

        Footprint {
            uuid: item_uuid(sexp).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            library_link: sexp.atom_at(1).unwrap_or_default().to_string(),
            layer: sexp.value_of("layer").unwrap_or("F.Cu").to_string(),
            at: parse_at(sexp),
            reference,
            value,
            descr: sexp.value_of("descr").map(str::to_string),
            attributes,
            properties,
            pads: sexp.get_all("pad").filter_map(Self::parse_pad).collect(),
        }
    }

    /// (pad "NUMBER" TYPE SHAPE (at ...) ... [(net ORDINAL "NAME")] [(uuid ...)])
    fn parse_pad(sexp: &SExp) -> Option<Pad> {
        Some(Pad {
            number: sexp.atom_at(1)?.to_string(),
            pad_type: sexp.atom_at(2).unwrap_or_default().to_string(),
            shape: sexp.atom_at(3).unwrap_or_default().to_string(),
            net: sexp.get("net").and_then(|n| n.atom_at(1)).and_then(|n| n.parse().ok()),
            uuid: item_uuid(sexp),
        })
    }
}

fn item_uuid(sexp: &SExp) -> Option<String> {
    sexp.value_of("uuid")
        .or_else(|| sexp.value_of("tstamp"))
        .map(str::to_string)
}
