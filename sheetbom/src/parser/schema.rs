//! Schematic document model.
//!
//! A `Schematic` exclusively owns every node it contains. Nodes never point
//! back at their owner; anything that needs the owning document (library
//! symbol lookup, text variables) goes through the `Schematic` by UUID.

use std::collections::{BTreeMap, HashMap};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Placement of an item: position plus rotation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct At {
    pub position: Position,
    pub rotation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mirror {
    X,
    Y,
}

/// Title block shared by schematics and boards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleBlock {
    pub title: Option<String>,
    pub date: Option<String>,
    pub rev: Option<String>,
    pub company: Option<String>,
    /// Comment slots 1..=9
    pub comments: BTreeMap<u8, String>,
}

impl TitleBlock {
    pub fn resolve_text_var(&self, name: &str) -> Option<String> {
        match name {
            "TITLE" => self.title.clone(),
            "ISSUE_DATE" | "DATE" => self.date.clone(),
            "REVISION" | "REV" => self.rev.clone(),
            "COMPANY" => self.company.clone(),
            _ => name
                .strip_prefix("COMMENT")
                .and_then(|n| n.parse::<u8>().ok())
                .and_then(|n| self.comments.get(&n).cloned()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schematic {
    pub uuid: String,
    pub filename: String,
    pub version: Option<String>,
    pub generator: Option<String>,
    #[serde(default)]
    pub title_block: TitleBlock,
    #[serde(default)]
    pub lib_symbols: Vec<LibSymbol>,
    #[serde(default)]
    pub wires: Vec<Wire>,
    #[serde(default)]
    pub junctions: Vec<Junction>,
    #[serde(default)]
    pub no_connects: Vec<NoConnect>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub symbols: Vec<SchematicSymbol>,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
    /// Root-level `(sheet_instances ...)` table written by older KiCad versions
    #[serde(default)]
    pub sheet_instances: Vec<SheetInstance>,
    /// Root-level `(symbol_instances ...)` table written by older KiCad versions
    #[serde(default)]
    pub symbol_instances: Vec<SymbolInstance>,
}

impl Schematic {
    /// An empty schematic, mostly useful for building documents in code.
    pub fn new(filename: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            filename: filename.into(),
            version: None,
            generator: None,
            title_block: TitleBlock::default(),
            lib_symbols: Vec::new(),
            wires: Vec::new(),
            junctions: Vec::new(),
            no_connects: Vec::new(),
            labels: Vec::new(),
            symbols: Vec::new(),
            sheets: Vec::new(),
            sheet_instances: Vec::new(),
            symbol_instances: Vec::new(),
        }
    }

    pub fn symbol_by_uuid(&self, uuid: &str) -> Option<&SchematicSymbol> {
        self.symbols.iter().find(|s| s.uuid == uuid)
    }

    /// The library symbol a placed symbol was instantiated from.
    pub fn lib_symbol_for(&self, symbol: &SchematicSymbol) -> Option<&LibSymbol> {
        let name = symbol.lib_name.as_deref().unwrap_or(&symbol.lib_id);
        self.lib_symbols.iter().find(|l| l.name == name)
    }

    /// Text variables owned by the document itself.
    pub fn resolve_text_var(&self, name: &str) -> Option<String> {
        if name == "FILENAME" {
            return Some(self.filename.clone());
        }
        None
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibSymbol {
    pub name: String,
    #[serde(default)]
    pub power: bool,
    #[serde(default)]
    pub in_bom: bool,
    #[serde(default)]
    pub on_board: bool,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    /// Per-unit/per-style child symbols, e.g. `LM358_1_1`, `LM358_2_1`
    #[serde(default)]
    pub children: Vec<LibSymbol>,
}

impl LibSymbol {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// `Device` for `Device:R`.
    pub fn library_name(&self) -> &str {
        self.name.split(':').next().unwrap_or("")
    }

    /// `R` for `Device:R`.
    pub fn library_item_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.property("Description")
            .or_else(|| self.property("ki_description"))
            .unwrap_or("")
    }

    pub fn keywords(&self) -> &str {
        self.property("ki_keywords").unwrap_or("")
    }

    /// Unit number encoded in a child symbol name (`LM358_2_1` is unit 2).
    pub fn unit(&self) -> u32 {
        let mut parts = self.name.rsplit('_');
        let _style = parts.next();
        parts.next().and_then(|u| u.parse().ok()).unwrap_or(0)
    }

    /// Number of distinct units; unit 0 is shared by all units and not counted.
    pub fn unit_count(&self) -> usize {
        let mut units: Vec<u32> = self
            .children
            .iter()
            .map(LibSymbol::unit)
            .filter(|u| *u > 0)
            .collect();
        units.sort_unstable();
        units.dedup();
        units.len().max(1)
    }
}

/// Overrides recorded for one placement of a symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolInstance {
    /// Hierarchical path of the sheet holding this placement
    pub path: String,
    pub project: Option<String>,
    pub reference: Option<String>,
    pub value: Option<String>,
    pub unit: Option<u32>,
    pub footprint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultInstance {
    pub reference: Option<String>,
    pub unit: Option<String>,
    pub value: Option<String>,
    pub footprint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinInstance {
    pub number: String,
    pub uuid: Option<String>,
    pub alternate: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchematicSymbol {
    pub uuid: String,
    pub lib_id: String,
    pub lib_name: Option<String>,
    #[serde(default)]
    pub at: At,
    pub mirror: Option<Mirror>,
    /// 1-based unit for multi-unit parts; `None`/`Some(0)` is not unit specific
    pub unit: Option<u32>,
    #[serde(default)]
    pub convert: Option<u32>,
    #[serde(default)]
    pub in_bom: bool,
    #[serde(default)]
    pub on_board: bool,
    #[serde(default)]
    pub dnp: bool,
    #[serde(default)]
    pub exclude_from_sim: bool,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(default)]
    pub pins: Vec<PinInstance>,
    pub default_instance: Option<DefaultInstance>,
    /// Placement table in file order, one entry per distinct path
    #[serde(default)]
    pub instances: Vec<SymbolInstance>,
}

impl SchematicSymbol {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    fn default_field(&self, pick: impl Fn(&DefaultInstance) -> Option<&String>) -> Option<&str> {
        self.default_instance.as_ref().and_then(pick).map(String::as_str)
    }

    pub fn reference(&self) -> &str {
        self.property("Reference")
            .or_else(|| self.default_field(|d| d.reference.as_ref()))
            .unwrap_or("?")
    }

    pub fn value(&self) -> &str {
        self.property("ALTIUM_VALUE")
            .or_else(|| self.property("Value"))
            .or_else(|| self.default_field(|d| d.value.as_ref()))
            .unwrap_or("")
    }

    pub fn footprint(&self) -> &str {
        self.property("Footprint")
            .or_else(|| self.default_field(|d| d.footprint.as_ref()))
            .unwrap_or("")
    }

    pub fn datasheet(&self) -> &str {
        self.property("Datasheet").unwrap_or("")
    }

    /// The symbol's own description, else its library symbol's.
    pub fn description<'a>(&'a self, lib: Option<&'a LibSymbol>) -> &'a str {
        self.property("Description")
            .or_else(|| lib.map(LibSymbol::description))
            .unwrap_or("")
    }

    /// Whether this placement counts for the BOM: units other than 1 do not.
    pub fn is_first_unit(&self) -> bool {
        matches!(self.unit, None | Some(0) | Some(1))
    }

    pub fn instance(&self, path: &str) -> Option<&SymbolInstance> {
        self.instances.iter().find(|i| i.path == path)
    }

    /// Insert or replace the instance recorded for `instance.path`.
    pub fn set_instance(&mut self, instance: SymbolInstance) {
        match self.instances.iter_mut().find(|i| i.path == instance.path) {
            Some(existing) => *existing = instance,
            None => self.instances.push(instance),
        }
    }

    /// Unit letter suffix (`A`, `B`, ... `Z`, `AA`, ...), empty for single-unit parts.
    pub fn unit_suffix(&self, unit_count: usize) -> String {
        let Some(mut unit) = self.unit.filter(|u| *u > 0) else {
            return String::new();
        };
        if unit_count <= 1 {
            return String::new();
        }

        let mut suffix = Vec::new();
        while unit > 0 {
            let x = (unit - 1) % 26;
            suffix.push(char::from(b'A' + x as u8));
            unit = (unit - x - 1) / 26;
        }
        suffix.iter().rev().collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wire {
    pub uuid: String,
    pub points: Vec<Position>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Junction {
    pub uuid: String,
    pub position: Position,
    pub diameter: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoConnect {
    pub uuid: String,
    pub position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub uuid: Option<String>,
    pub text: String,
    #[serde(default)]
    pub at: At,
    pub label_type: LabelType,
    /// Electrical shape for global/hierarchical labels (`input`, `output`, ...)
    pub shape: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LabelType {
    Local,
    Global,
    Hierarchical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetPin {
    pub name: String,
    pub shape: Option<String>,
    #[serde(default)]
    pub at: At,
    pub uuid: Option<String>,
}

/// One placement of a sheet: the path of its parent plus its page number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetInstance {
    pub path: String,
    pub project: Option<String>,
    pub page: Option<String>,
}

/// A child sheet reference inside a schematic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub uuid: String,
    #[serde(default)]
    pub at: At,
    #[serde(default)]
    pub size: Position,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(default)]
    pub pins: Vec<SheetPin>,
    #[serde(default)]
    pub instances: Vec<SheetInstance>,
}

impl Sheet {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn sheetname(&self) -> Option<&str> {
        self.property("Sheetname").or_else(|| self.property("Sheet name"))
    }

    pub fn sheetfile(&self) -> Option<&str> {
        self.property("Sheetfile").or_else(|| self.property("Sheet file"))
    }

    pub fn instance(&self, path: &str) -> Option<&SheetInstance> {
        self.instances.iter().find(|i| i.path == path)
    }

    pub fn set_instance(&mut self, instance: SheetInstance) {
        match self.instances.iter_mut().find(|i| i.path == instance.path) {
            Some(existing) => *existing = instance,
            None => self.instances.push(instance),
        }
    }
}
