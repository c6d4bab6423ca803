//! Text variable resolution (`${REFERENCE}`, `${TITLE}`, `${uuid:Value}` ...).
//!
//! A resolver is an ordered list of stages. Each stage either knows a
//! variable or returns `None`, and the first stage that knows it wins.

use crate::parser::project_file::ProjectSettings;
use crate::parser::schema::{LibSymbol, Schematic, SchematicSymbol, TitleBlock};

/// Expansion stops this many levels deep, so self-referencing fields terminate.
const MAX_DEPTH: usize = 8;

/// One source of text variables.
#[derive(Debug, Clone, Copy)]
pub enum Stage<'a> {
    /// User fields of a placed symbol, by exact field name
    SymbolFields(&'a SchematicSymbol),
    /// `REFERENCE`, `VALUE`, `FOOTPRINT_NAME`, `DNP` and the other symbol built-ins
    SymbolBuiltins {
        symbol: &'a SchematicSymbol,
        lib: Option<&'a LibSymbol>,
    },
    /// `FILENAME` and `<symbol uuid>:<field>` cross references
    Document(&'a Schematic),
    TitleBlock(&'a TitleBlock),
    Project(&'a ProjectSettings),
}

impl<'a> Stage<'a> {
    /// Raw value of `name`; cross references come back expanded, one level deeper.
    fn resolve(&self, name: &str, depth: usize) -> Option<String> {
        match *self {
            Stage::SymbolFields(symbol) => symbol.property(name).map(str::to_string),
            Stage::SymbolBuiltins { symbol, lib } => symbol_builtin(symbol, lib, name),
            Stage::Document(schematic) => {
                if let Some(value) = schematic.resolve_text_var(name) {
                    return Some(value);
                }
                let (uuid, field) = name.split_once(':')?;
                let symbol = schematic.symbol_by_uuid(uuid)?;
                TextVarResolver::for_symbol(schematic, symbol).resolve_at(field, depth + 1)
            }
            Stage::TitleBlock(title_block) => title_block.resolve_text_var(name),
            Stage::Project(settings) => settings.text_variable(name).map(str::to_string),
        }
    }
}

fn symbol_builtin(symbol: &SchematicSymbol, lib: Option<&LibSymbol>, name: &str) -> Option<String> {
    let footprint = symbol.footprint();
    let value = match name {
        "REFERENCE" => symbol.reference().to_string(),
        "VALUE" | "ALTIUM_VALUE" => symbol.value().to_string(),
        "FOOTPRINT" => footprint.to_string(),
        "DATASHEET" => symbol.datasheet().to_string(),
        "FOOTPRINT_LIBRARY" => footprint.split(':').next().unwrap_or("").to_string(),
        "FOOTPRINT_NAME" => footprint.rsplit(':').next().unwrap_or("").to_string(),
        "UNIT" => symbol.unit_suffix(lib.map_or(1, LibSymbol::unit_count)),
        "SYMBOL_LIBRARY" => lib?.library_name().to_string(),
        "SYMBOL_NAME" => lib?.library_item_name().to_string(),
        "SYMBOL_DESCRIPTION" => lib?.description().to_string(),
        "SYMBOL_KEYWORDS" => lib?.keywords().to_string(),
        "EXCLUDE_FROM_BOM" if symbol.in_bom => String::new(),
        "EXCLUDE_FROM_BOM" => "Excluded from BOM".to_string(),
        "EXCLUDE_FROM_BOARD" if symbol.on_board => String::new(),
        "EXCLUDE_FROM_BOARD" => "Excluded from board".to_string(),
        "DNP" if symbol.dnp => "DNP".to_string(),
        "DNP" => String::new(),
        _ => return None,
    };
    Some(value)
}

#[derive(Debug, Clone, Default)]
pub struct TextVarResolver<'a> {
    stages: Vec<Stage<'a>>,
}

impl<'a> TextVarResolver<'a> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn with(mut self, stage: Stage<'a>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Document-level resolver: file built-ins, then the title block.
    pub fn for_document(schematic: &'a Schematic) -> Self {
        Self::new()
            .with(Stage::Document(schematic))
            .with(Stage::TitleBlock(&schematic.title_block))
    }

    /// Resolver for text owned by a placed symbol.
    pub fn for_symbol(schematic: &'a Schematic, symbol: &'a SchematicSymbol) -> Self {
        Self::new()
            .with(Stage::SymbolFields(symbol))
            .with(Stage::SymbolBuiltins {
                symbol,
                lib: schematic.lib_symbol_for(symbol),
            })
            .with(Stage::Document(schematic))
            .with(Stage::TitleBlock(&schematic.title_block))
    }

    pub fn stages(&self) -> &[Stage<'a>] {
        &self.stages
    }

    /// Value of a variable, with its own `${...}` references expanded.
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.resolve_at(name, 0)
    }

    fn resolve_at(&self, name: &str, depth: usize) -> Option<String> {
        if depth > MAX_DEPTH {
            return None;
        }
        let raw = self.stages.iter().find_map(|stage| stage.resolve(name, depth))?;
        Some(self.expand_at(&raw, depth + 1))
    }

    /// Replace every `${NAME}` in `text`; unknown variables are left as written.
    pub fn expand(&self, text: &str) -> String {
        self.expand_at(text, 0)
    }

    fn expand_at(&self, text: &str, depth: usize) -> String {
        if depth > MAX_DEPTH || !text.contains("${") {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let name = &after[..end];
                    match self.resolve_at(name, depth) {
                        Some(value) => out.push_str(&value),
                        None => out.push_str(&rest[start..start + 2 + end + 1]),
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
