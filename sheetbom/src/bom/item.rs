use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Sheet name recorded for designators that come from a board.
pub const NOT_AVAILABLE_SHEET: &str = "not_available";

/// One placed, BOM-eligible component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BomItem {
    pub reference: String,
    pub name: String,
    pub description: String,
    pub datasheet: String,
    pub footprint: String,
    #[serde(rename = "DNP")]
    pub dnp: bool,
    pub qty: u32,
    pub price: f64,
}

impl BomItem {
    pub fn new(reference: impl Into<String>, name: impl Into<String>, footprint: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            name: name.into(),
            description: String::new(),
            datasheet: String::new(),
            footprint: footprint.into(),
            dnp: false,
            qty: 1,
            price: 0.0,
        }
    }
}

/// Where a designator was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignatorRef {
    /// UUID of the symbol or footprint
    pub uuid: String,
    pub document_uuid: String,
    /// Schematic filename, or [`NOT_AVAILABLE_SHEET`] for boards
    pub sheet: String,
}

/// All items sharing one `(footprint, name, dnp)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedBomItem {
    pub name: String,
    pub datasheet: String,
    pub description: String,
    pub footprint: String,
    pub dnp: bool,
    /// Every member's reference in encounter order, empty ones included
    pub references: Vec<String>,
}

impl GroupedBomItem {
    pub fn from_item(item: &BomItem) -> Self {
        Self {
            name: item.name.clone(),
            datasheet: item.datasheet.clone(),
            description: item.description.clone(),
            footprint: item.footprint.clone(),
            dnp: item.dnp,
            references: Vec::new(),
        }
    }

    pub fn add_reference(&mut self, reference: impl Into<String>) {
        self.references.push(reference.into());
    }

    /// Number of members with a non-empty reference.
    pub fn qty(&self) -> usize {
        self.non_empty_references().count()
    }

    /// Non-empty references joined with `",\n"`.
    pub fn reference(&self) -> String {
        self.non_empty_references().collect::<Vec<_>>().join(",\n")
    }

    pub fn price(&self) -> f64 {
        0.0
    }

    fn non_empty_references(&self) -> impl Iterator<Item = &str> {
        self.references
            .iter()
            .map(String::as_str)
            .filter(|r| !r.is_empty())
    }
}

impl Serialize for GroupedBomItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("GroupedBomItem", 8)?;
        s.serialize_field("Name", &self.name)?;
        s.serialize_field("Datasheet", &self.datasheet)?;
        s.serialize_field("Description", &self.description)?;
        s.serialize_field("Footprint", &self.footprint)?;
        s.serialize_field("DNP", &self.dnp)?;
        s.serialize_field("Reference", &self.reference())?;
        s.serialize_field("Qty", &self.qty())?;
        s.serialize_field("Price", &self.price())?;
        s.end()
    }
}
