//! BOM rows from board footprints.

use std::collections::HashMap;

use crate::bom::item::{BomItem, DesignatorRef, NOT_AVAILABLE_SHEET};
use crate::parser::pcb_schema::{Board, Footprint};
use crate::visitor::{DocumentRef, Node, NodeKind, TreeVisitor};

/// Collects one [`BomItem`] for every footprint, without filtering.
#[derive(Debug, Default)]
pub struct BoardBomExtractor {
    items: Vec<BomItem>,
    designators: HashMap<String, DesignatorRef>,
}

impl BoardBomExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visit(&mut self, board: &Board) {
        TreeVisitor::new()
            .on(NodeKind::Footprint, |node, ctx| {
                if let (Node::Footprint(footprint), Some(DocumentRef::Board(doc))) = (node, ctx.document) {
                    self.visit_footprint(doc, footprint);
                }
            })
            .visit(Node::Board(board));
    }

    fn visit_footprint(&mut self, board: &Board, footprint: &Footprint) {
        self.items.push(BomItem {
            reference: footprint.reference.clone(),
            name: footprint.value.clone(),
            description: footprint.description().to_string(),
            datasheet: footprint.datasheet().to_string(),
            footprint: footprint.footprint_name().to_string(),
            dnp: false,
            qty: 1,
            price: 0.0,
        });
        self.designators.insert(
            footprint.reference.clone(),
            DesignatorRef {
                uuid: footprint.uuid.clone(),
                document_uuid: board.uuid.clone(),
                sheet: NOT_AVAILABLE_SHEET.to_string(),
            },
        );
    }

    pub fn items(&self) -> &[BomItem] {
        &self.items
    }

    pub fn designators(&self) -> &HashMap<String, DesignatorRef> {
        &self.designators
    }

    pub fn into_parts(self) -> (Vec<BomItem>, HashMap<String, DesignatorRef>) {
        (self.items, self.designators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::pcb_schema::FootprintAttributes;

    fn footprint(uuid: &str, reference: &str, value: &str, lib: &str) -> Footprint {
        Footprint {
            uuid: uuid.to_string(),
            library_link: lib.to_string(),
            reference: reference.to_string(),
            value: value.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_footprint_is_emitted() {
        let mut board = Board::new("main.kicad_pcb", "board-1");
        board.footprints.push(footprint("f1", "R1", "10k", "R_0402"));
        board.footprints.push(footprint("f2", "R?", "10k", "R_0402"));
        let mut excluded = footprint("f3", "R1", "1k", "R_0603");
        excluded.attributes = FootprintAttributes {
            exclude_from_bom: true,
            dnp: true,
            ..Default::default()
        };
        board.footprints.push(excluded);

        let mut extractor = BoardBomExtractor::new();
        extractor.visit(&board);

        let refs: Vec<_> = extractor.items().iter().map(|i| i.reference.as_str()).collect();
        assert_eq!(refs, vec!["R1", "R?", "R1"]);
        assert!(extractor.items().iter().all(|i| !i.dnp));
        assert_eq!(extractor.items()[2].footprint, "R_0603");

        let designator = &extractor.designators()["R1"];
        assert_eq!(designator.sheet, NOT_AVAILABLE_SHEET);
        assert_eq!(designator.document_uuid, "board-1");
        assert_eq!(designator.uuid, "f3");
    }
}
