//! BOM rows from placed schematic symbols.

use std::collections::{HashMap, HashSet};

use crate::bom::item::{BomItem, DesignatorRef};
use crate::parser::schema::{Schematic, SchematicSymbol};
use crate::visitor::{DocumentRef, Node, NodeKind, TreeVisitor};

/// Collects one [`BomItem`] per placement of every BOM-eligible symbol.
///
/// Reference suppression spans every document visited by the same
/// extractor: a designator already emitted is never emitted again.
#[derive(Debug, Default)]
pub struct SchematicBomExtractor {
    items: Vec<BomItem>,
    designators: HashMap<String, DesignatorRef>,
    emitted: HashSet<String>,
}

impl SchematicBomExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visit(&mut self, schematic: &Schematic) {
        TreeVisitor::new()
            .on(NodeKind::Symbol, |node, ctx| {
                if let (Node::Symbol(symbol), Some(DocumentRef::Schematic(doc))) = (node, ctx.document) {
                    self.visit_symbol(doc, symbol);
                }
            })
            .visit(Node::Schematic(schematic));
    }

    fn visit_symbol(&mut self, schematic: &Schematic, symbol: &SchematicSymbol) {
        let footprint = symbol.footprint();
        if footprint.is_empty() || !symbol.in_bom || !symbol.is_first_unit() {
            return;
        }

        let lib = schematic.lib_symbol_for(symbol);
        let template = BomItem {
            reference: String::new(),
            name: symbol.value().to_string(),
            description: symbol.description(lib).to_string(),
            datasheet: symbol.datasheet().to_string(),
            footprint: footprint.to_string(),
            dnp: symbol.dnp,
            qty: 1,
            price: 0.0,
        };

        for instance in &symbol.instances {
            let reference = instance.reference.clone().unwrap_or_default();
            if reference.ends_with('?') || self.emitted.contains(&reference) {
                continue;
            }

            let item = BomItem {
                reference: reference.clone(),
                name: instance.value.clone().unwrap_or_else(|| template.name.clone()),
                footprint: instance
                    .footprint
                    .clone()
                    .unwrap_or_else(|| template.footprint.clone()),
                ..template.clone()
            };

            self.designators.insert(
                reference.clone(),
                DesignatorRef {
                    uuid: symbol.uuid.clone(),
                    document_uuid: schematic.uuid.clone(),
                    sheet: schematic.filename.clone(),
                },
            );
            self.emitted.insert(reference);
            self.items.push(item);
        }
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
    use crate::parser::schema::{LibSymbol, SymbolInstance};

    fn placed(uuid: &str, unit: Option<u32>, footprint: &str, refs: &[&str]) -> SchematicSymbol {
        let mut properties = HashMap::new();
        properties.insert("Value".to_string(), "10k".to_string());
        properties.insert("Footprint".to_string(), footprint.to_string());
        properties.insert("Datasheet".to_string(), "~".to_string());
        SchematicSymbol {
            uuid: uuid.to_string(),
            lib_id: "Device:R".to_string(),
            unit,
            in_bom: true,
            on_board: true,
            properties,
            instances: refs
                .iter()
                .enumerate()
                .map(|(i, r)| SymbolInstance {
                    path: format!("/root/p{}", i),
                    reference: Some(r.to_string()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn doc(symbols: Vec<SchematicSymbol>) -> Schematic {
        let mut sch = Schematic::new("main.kicad_sch", "root");
        sch.lib_symbols.push(LibSymbol {
            name: "Device:R".to_string(),
            properties: [("Description".to_string(), "Resistor".to_string())]
                .into_iter()
                .collect(),
            ..Default::default()
        });
        sch.symbols = symbols;
        sch
    }

    fn refs(extractor: &SchematicBomExtractor) -> Vec<&str> {
        extractor.items().iter().map(|i| i.reference.as_str()).collect()
    }

    #[test]
    fn test_one_item_per_placement() {
        let sch = doc(vec![placed("s1", Some(1), "R_0402", &["R1", "R2"])]);
        let mut extractor = SchematicBomExtractor::new();
        extractor.visit(&sch);

        assert_eq!(refs(&extractor), vec!["R1", "R2"]);
        let item = &extractor.items()[0];
        assert_eq!(item.name, "10k");
        assert_eq!(item.description, "Resistor");
        assert_eq!(item.datasheet, "~");
        assert_eq!(item.qty, 1);

        let designator = &extractor.designators()["R2"];
        assert_eq!(designator.uuid, "s1");
        assert_eq!(designator.document_uuid, "root");
        assert_eq!(designator.sheet, "main.kicad_sch");
    }

    #[test]
    fn test_filters_units_footprints_and_bom_flag() {
        let mut excluded = placed("s4", None, "R_0402", &["R4"]);
        excluded.in_bom = false;
        let sch = doc(vec![
            placed("s1", Some(2), "SOIC-8", &["U1"]),
            placed("s2", Some(1), "SOIC-8", &["U2"]),
            placed("s3", Some(0), "", &["R3"]),
            excluded,
            placed("s5", Some(0), "R_0402", &["R5"]),
        ]);
        let mut extractor = SchematicBomExtractor::new();
        extractor.visit(&sch);
        assert_eq!(refs(&extractor), vec!["U2", "R5"]);
    }

    #[test]
    fn test_placeholders_and_duplicates_dropped() {
        let sch = doc(vec![
            placed("s1", Some(1), "R_0402", &["R?", "R1"]),
            placed("s2", Some(1), "R_0603", &["R1", "R2"]),
        ]);
        let mut extractor = SchematicBomExtractor::new();
        extractor.visit(&sch);
        assert_eq!(refs(&extractor), vec!["R1", "R2"]);
        assert_eq!(extractor.items()[0].footprint, "R_0402");
        assert_eq!(extractor.designators()["R1"].uuid, "s1");
    }

    #[test]
    fn test_duplicates_suppressed_across_documents() {
        let a = doc(vec![placed("s1", Some(1), "R_0402", &["R1"])]);
        let mut b = doc(vec![placed("s9", Some(1), "R_0402", &["R1", "R9"])]);
        b.filename = "other.kicad_sch".to_string();

        let mut extractor = SchematicBomExtractor::new();
        extractor.visit(&a);
        extractor.visit(&b);
        assert_eq!(refs(&extractor), vec!["R1", "R9"]);
        assert_eq!(extractor.designators()["R9"].sheet, "other.kicad_sch");
    }

    #[test]
    fn test_instance_overrides() {
        let mut symbol = placed("s1", Some(1), "R_0402", &[]);
        symbol.instances.push(SymbolInstance {
            path: "/root/a".to_string(),
            reference: Some("R7".to_string()),
            value: Some("22k".to_string()),
            footprint: Some("R_0805".to_string()),
            ..Default::default()
        });
        symbol.instances.push(SymbolInstance {
            path: "/root/b".to_string(),
            ..Default::default()
        });
        let sch = doc(vec![symbol]);
        let mut extractor = SchematicBomExtractor::new();
        extractor.visit(&sch);

        let (items, _) = extractor.into_parts();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "22k");
        assert_eq!(items[0].footprint, "R_0805");
        // Missing reference falls back to the empty template reference
        assert_eq!(items[1].reference, "");
        assert_eq!(items[1].name, "10k");
    }
}
