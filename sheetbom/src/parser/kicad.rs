//! KiCAD Schematic Parser
//!
//! Reads the parts of a `.kicad_sch` S-expression file the hierarchy and BOM
//! code depend on: symbols with their placement tables, child sheets with
//! their page tables, labels, and the library symbols.
//!
//! Format reference:
//! https://dev-docs.kicad.org/en/file-formats/sexpr-schematic/
//! - Properties: (property "KEY" "VALUE" ...)
//! - Position: (at X Y [ANGLE])
//! - Placements: (instances (project "NAME" (path "/UUID/..." ...)))

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use crate::parser::schema::*;
use crate::parser::sexp::{SExp, SExpParser, ParseError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum KicadParseError {
    #[error("S-expression parse error: {0}")]
    SExpParse(#[from] ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid schematic format: {0}")]
    InvalidFormat(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Parser for KiCAD schematic files (KiCad 6 and later)
pub struct KicadParser;

impl KicadParser {
    /// Parse a schematic file; the document is keyed by the file name.
    pub fn parse_schematic(path: &Path) -> Result<Schematic, KicadParseError> {
        let content = std::fs::read_to_string(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        Self::parse_schematic_str(&content, filename)
    }

    pub fn parse_schematic_str(content: &str, filename: &str) -> Result<Schematic, KicadParseError> {
        let root = SExpParser::new(content).parse()?;

        match root.tag() {
            Some("kicad_sch") => {}
            Some(other) => {
                return Err(KicadParseError::InvalidFormat(format!(
                    "Expected kicad_sch, found {}",
                    other
                )))
            }
            None => {
                return Err(KicadParseError::InvalidFormat(
                    "Expected kicad_sch root".to_string(),
                ))
            }
        }

        let uuid = root
            .value_of("uuid")
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut schematic = Schematic::new(filename, uuid);
        schematic.version = root.value_of("version").map(str::to_string);
        schematic.generator = root.value_of("generator").map(str::to_string);

        for item in root.children() {
            let Some(tag) = item.tag() else { continue };
            match tag {
                "title_block" => schematic.title_block = parse_title_block(item),
                "lib_symbols" => {
                    schematic.lib_symbols = item.get_all("symbol").map(Self::parse_lib_symbol).collect();
                }
                "symbol" => match Self::parse_symbol(item) {
                    Ok(symbol) => schematic.symbols.push(symbol),
                    Err(e) => debug!("Skipping symbol in {}: {}", filename, e),
                },
                "sheet" => match Self::parse_sheet(item) {
                    Ok(sheet) => schematic.sheets.push(sheet),
                    Err(e) => debug!("Skipping sheet in {}: {}", filename, e),
                },
                "wire" => {
                    if let Ok(wire) = Self::parse_wire(item) {
                        schematic.wires.push(wire);
                    }
                }
                "junction" => {
                    if let Some(uuid) = item.value_of("uuid") {
                        schematic.junctions.push(Junction {
                            uuid: uuid.to_string(),
                            position: parse_at(item).position,
                            diameter: item.value_of("diameter").and_then(|d| d.parse().ok()),
                        });
                    }
                }
                "no_connect" => {
                    if let Some(uuid) = item.value_of("uuid") {
                        schematic.no_connects.push(NoConnect {
                            uuid: uuid.to_string(),
                            position: parse_at(item).position,
                        });
                    }
                }
                "label" => schematic.labels.push(Self::parse_label(item, LabelType::Local)?),
                "global_label" => schematic.labels.push(Self::parse_label(item, LabelType::Global)?),
                "hierarchical_label" => {
                    schematic.labels.push(Self::parse_label(item, LabelType::Hierarchical)?)
                }
                "sheet_instances" => {
                    schematic.sheet_instances = item
                        .get_all("path")
                        .map(|p| parse_sheet_instance(p, None))
                        .collect();
                }
                "symbol_instances" => {
                    schematic.symbol_instances = item
                        .get_all("path")
                        .map(|p| parse_symbol_instance(p, None))
                        .collect();
                }
                _ => {
                    // Graphics, buses, images and the like carry nothing we need
                }
            }
        }

        fold_legacy_symbol_instances(&mut schematic);

        Ok(schematic)
    }

    fn parse_lib_symbol(sexp: &SExp) -> LibSymbol {
        LibSymbol {
            name: sexp.atom_at(1).unwrap_or_default().to_string(),
            power: sexp.get("power").is_some(),
            in_bom: sexp.flag_of("in_bom").unwrap_or(true),
            on_board: sexp.flag_of("on_board").unwrap_or(true),
            properties: parse_properties(sexp),
            children: sexp.get_all("symbol").map(Self::parse_lib_symbol).collect(),
        }
    }

    fn parse_symbol(sexp: &SExp) -> Result<SchematicSymbol, KicadParseError> {
        let uuid = sexp
            .value_of("uuid")
            .ok_or_else(|| KicadParseError::MissingField("symbol uuid".to_string()))?;
        let lib_id = sexp
            .value_of("lib_id")
            .ok_or_else(|| KicadParseError::MissingField("lib_id".to_string()))?;

        let mirror = match sexp.value_of("mirror") {
            Some("x") => Some(Mirror::X),
            Some("y") => Some(Mirror::Y),
            _ => None,
        };

        let default_instance = sexp.get("default_instance").map(|d| DefaultInstance {
            reference: d.value_of("reference").map(str::to_string),
            unit: d.value_of("unit").map(str::to_string),
            value: d.value_of("value").map(str::to_string),
            footprint: d.value_of("footprint").map(str::to_string),
        });

        // (pin "1" (uuid "...") [(alternate "NAME")])
        let pins = sexp
            .get_all("pin")
            .filter_map(|pin| {
                Some(PinInstance {
                    number: pin.atom_at(1)?.to_string(),
                    uuid: pin.value_of("uuid").map(str::to_string),
                    alternate: pin.value_of("alternate").map(str::to_string),
                })
            })
            .collect();

        let mut symbol = SchematicSymbol {
            uuid: uuid.to_string(),
            lib_id: lib_id.to_string(),
            lib_name: sexp.value_of("lib_name").map(str::to_string),
            at: parse_at(sexp),
            mirror,
            unit: sexp.value_of("unit").and_then(|u| u.parse().ok()),
            convert: sexp.value_of("convert").and_then(|c| c.parse().ok()),
            in_bom: sexp.flag_of("in_bom").unwrap_or(false),
            on_board: sexp.flag_of("on_board").unwrap_or(false),
            dnp: sexp.flag_of("dnp").unwrap_or(false),
            exclude_from_sim: sexp.flag_of("exclude_from_sim").unwrap_or(false),
            properties: parse_properties(sexp),
            pins,
            default_instance,
            instances: Vec::new(),
        };

        for (project, path) in instance_paths(sexp) {
            symbol.set_instance(parse_symbol_instance(path, project));
        }

        Ok(symbol)
    }

    fn parse_sheet(sexp: &SExp) -> Result<Sheet, KicadParseError> {
        let uuid = sexp
            .value_of("uuid")
            .ok_or_else(|| KicadParseError::MissingField("sheet uuid".to_string()))?;

        let size = sexp
            .get("size")
            .map(|s| Position {
                x: atom_f64(s, 1),
                y: atom_f64(s, 2),
            })
            .unwrap_or_default();

        // (pin "NAME" input (at X Y ANGLE) (effects ...) (uuid "..."))
        let pins = sexp
            .get_all("pin")
            .filter_map(|pin| {
                Some(SheetPin {
                    name: pin.atom_at(1)?.to_string(),
                    shape: pin.atom_at(2).map(str::to_string),
                    at: parse_at(pin),
                    uuid: pin.value_of("uuid").map(str::to_string),
                })
            })
            .collect();

        let mut sheet = Sheet {
            uuid: uuid.to_string(),
            at: parse_at(sexp),
            size,
            properties: parse_properties(sexp),
            pins,
            instances: Vec::new(),
        };

        for (project, path) in instance_paths(sexp) {
            sheet.set_instance(parse_sheet_instance(path, project));
        }

        Ok(sheet)
    }

    /// Parse wire with coordinate point list: (pts (xy X Y) (xy X Y) ...)
    fn parse_wire(sexp: &SExp) -> Result<Wire, KicadParseError> {
        let uuid = sexp
            .value_of("uuid")
            .ok_or_else(|| KicadParseError::MissingField("wire uuid".to_string()))?;

        let pts = sexp
            .get("pts")
            .ok_or_else(|| KicadParseError::MissingField("wire pts".to_string()))?;

        let points = pts
            .get_all("xy")
            .map(|xy| Position {
                x: atom_f64(xy, 1),
                y: atom_f64(xy, 2),
            })
            .collect();

        Ok(Wire {
            uuid: uuid.to_string(),
            points,
        })
    }

    /// Label text is the second element in the list: (label "TEXT" (at ...) ...)
    fn parse_label(sexp: &SExp, label_type: LabelType) -> Result<Label, KicadParseError> {
        let text = sexp
            .atom_at(1)
            .ok_or_else(|| KicadParseError::MissingField("label text".to_string()))?;

        Ok(Label {
            uuid: sexp.value_of("uuid").map(str::to_string),
            text: text.to_string(),
            at: parse_at(sexp),
            label_type,
            shape: sexp.value_of("shape").map(str::to_string),
        })
    }
}

/// Flatten `(instances (project "NAME" (path ...) ...) ...)` into
/// `(project name, path expression)` pairs.
fn instance_paths(sexp: &SExp) -> Vec<(Option<&str>, &SExp)> {
    let Some(instances) = sexp.get("instances") else {
        return Vec::new();
    };
    instances
        .get_all("project")
        .flat_map(|project| {
            let name = project.atom_at(1);
            project.get_all("path").map(move |path| (name, path))
        })
        .collect()
}

fn parse_symbol_instance(path: &SExp, project: Option<&str>) -> SymbolInstance {
    SymbolInstance {
        path: path.atom_at(1).unwrap_or_default().to_string(),
        project: project.map(str::to_string),
        reference: path.value_of("reference").map(str::to_string),
        value: path.value_of("value").map(str::to_string),
        unit: path.value_of("unit").and_then(|u| u.parse().ok()),
        footprint: path.value_of("footprint").map(str::to_string),
    }
}

fn parse_sheet_instance(path: &SExp, project: Option<&str>) -> SheetInstance {
    SheetInstance {
        path: path.atom_at(1).unwrap_or_default().to_string(),
        project: project.map(str::to_string),
        page: path.value_of("page").map(str::to_string),
    }
}

/// Move root-level `symbol_instances` rows (KiCad 6) onto the symbols of this
/// document that carry no placement table of their own.
///
/// Legacy paths end with the symbol's own UUID; the table key is the path of
/// the sheet holding the placement, so that segment is dropped.
fn fold_legacy_symbol_instances(schematic: &mut Schematic) {
    if schematic.symbol_instances.is_empty() {
        return;
    }

    let bare: HashSet<String> = schematic
        .symbols
        .iter()
        .filter(|s| s.instances.is_empty())
        .map(|s| s.uuid.clone())
        .collect();

    for legacy in &schematic.symbol_instances {
        let Some((parent, symbol_uuid)) = legacy.path.rsplit_once('/') else {
            continue;
        };
        if !bare.contains(symbol_uuid) {
            continue;
        }
        let Some(symbol) = schematic.symbols.iter_mut().find(|s| s.uuid == symbol_uuid) else {
            continue;
        };
        let mut instance = legacy.clone();
        instance.path = if parent.is_empty() {
            "/".to_string()
        } else {
            parent.to_string()
        };
        symbol.set_instance(instance);
    }
}

/// Collect `(property "KEY" "VALUE" ...)` children; later duplicates win.
pub(crate) fn parse_properties(sexp: &SExp) -> HashMap<String, String> {
    sexp.get_all("property")
        .filter_map(|p| Some((p.atom_at(1)?.to_string(), p.atom_at(2)?.to_string())))
        .collect()
}

pub(crate) fn parse_title_block(sexp: &SExp) -> TitleBlock {
    // (comment N "TEXT")
    let comments: BTreeMap<u8, String> = sexp
        .get_all("comment")
        .filter_map(|c| Some((c.atom_at(1)?.parse().ok()?, c.atom_at(2)?.to_string())))
        .collect();

    TitleBlock {
        title: sexp.value_of("title").map(str::to_string),
        date: sexp.value_of("date").map(str::to_string),
        rev: sexp.value_of("rev").map(str::to_string),
        company: sexp.value_of("company").map(str::to_string),
        comments,
    }
}

/// Position identifier: (at X Y [ANGLE]); missing or malformed reads as origin.
pub(crate) fn parse_at(sexp: &SExp) -> At {
    match sexp.get("at") {
        Some(at) => At {
            position: Position {
                x: atom_f64(at, 1),
                y: atom_f64(at, 2),
            },
            rotation: atom_f64(at, 3),
        },
        None => At::default(),
    }
}

pub(crate) fn atom_f64(sexp: &SExp, index: usize) -> f64 {
    sexp.atom_at(index)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
}
