//! Bill of materials extraction and grouping.

pub mod board;
pub mod group;
pub mod item;
pub mod schematic;

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::parser::pcb_schema::Board;
use crate::parser::schema::Schematic;

pub use board::BoardBomExtractor;
pub use group::group_bom_items;
pub use item::{BomItem, DesignatorRef, GroupedBomItem, NOT_AVAILABLE_SHEET};
pub use schematic::SchematicBomExtractor;

/// Which documents a project's BOM was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BomSource {
    Schematic,
    Board,
    None,
}

#[derive(Debug, Clone)]
pub struct ProjectBom {
    pub source: BomSource,
    pub items: Vec<BomItem>,
    pub designators: HashMap<String, DesignatorRef>,
}

impl ProjectBom {
    pub fn grouped(&self) -> Vec<GroupedBomItem> {
        group_bom_items(&self.items)
    }
}

/// Schematics win when they yield any item; otherwise boards are used.
///
/// `schematics` must already be in traversal order (resolved pages, or the
/// load order when no hierarchy was found). A document listed twice is
/// visited twice; repeated designators are dropped by the extractor.
pub fn extract_project_bom<'a, S, B>(schematics: S, boards: B) -> ProjectBom
where
    S: IntoIterator<Item = &'a Schematic>,
    B: IntoIterator<Item = &'a Board>,
{
    let mut designators = HashMap::new();
    let mut visited_schematics = false;

    let mut extractor = SchematicBomExtractor::new();
    for schematic in schematics {
        visited_schematics = true;
        extractor.visit(schematic);
    }
    if visited_schematics {
        let (items, refs) = extractor.into_parts();
        if !items.is_empty() {
            debug!("BOM from schematics: {} items", items.len());
            return ProjectBom {
                source: BomSource::Schematic,
                items,
                designators: refs,
            };
        }
        designators = refs;
    }

    let mut extractor = BoardBomExtractor::new();
    let mut visited_boards = false;
    for board in boards {
        visited_boards = true;
        extractor.visit(board);
    }
    if visited_boards {
        let (items, refs) = extractor.into_parts();
        debug!("BOM from boards: {} items", items.len());
        return ProjectBom {
            source: BomSource::Board,
            items,
            designators: refs,
        };
    }

    ProjectBom {
        source: BomSource::None,
        items: Vec::new(),
        designators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::pcb_schema::Footprint;
    use crate::parser::schema::{SchematicSymbol, SymbolInstance};

    fn board_with(count: usize) -> Board {
        let mut board = Board::new("main.kicad_pcb", "b");
        for i in 0..count {
            board.footprints.push(Footprint {
                uuid: format!("f{}", i),
                library_link: format!("Lib:FP{}", i),
                reference: format!("U{}", i),
                value: format!("V{}", i),
                ..Default::default()
            });
        }
        board
    }

    fn schematic_with_part() -> Schematic {
        let mut sch = Schematic::new("main.kicad_sch", "s");
        sch.symbols.push(SchematicSymbol {
            uuid: "sym".to_string(),
            in_bom: true,
            properties: [("Footprint".to_string(), "R_0402".to_string())]
                .into_iter()
                .collect(),
            instances: vec![SymbolInstance {
                path: "/s".to_string(),
                reference: Some("R1".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        });
        sch
    }

    #[test]
    fn test_board_fallback_without_schematics() {
        let board = board_with(3);
        let bom = extract_project_bom(Vec::<&Schematic>::new(), [&board]);
        assert_eq!(bom.source, BomSource::Board);
        assert_eq!(bom.grouped().len(), 3);
        assert_eq!(bom.designators["U1"].sheet, NOT_AVAILABLE_SHEET);
    }

    #[test]
    fn test_schematics_preferred() {
        let sch = schematic_with_part();
        let board = board_with(3);
        let bom = extract_project_bom([&sch], [&board]);
        assert_eq!(bom.source, BomSource::Schematic);
        assert_eq!(bom.items.len(), 1);
        assert_eq!(bom.designators["R1"].sheet, "main.kicad_sch");
    }

    #[test]
    fn test_empty_schematics_fall_back_to_board() {
        let empty = Schematic::new("empty.kicad_sch", "e");
        let board = board_with(2);
        let bom = extract_project_bom([&empty], [&board]);
        assert_eq!(bom.source, BomSource::Board);
        assert_eq!(bom.items.len(), 2);
    }

    #[test]
    fn test_nothing_loaded() {
        let bom = extract_project_bom(Vec::<&Schematic>::new(), Vec::<&Board>::new());
        assert_eq!(bom.source, BomSource::None);
        assert!(bom.items.is_empty());
    }
}
