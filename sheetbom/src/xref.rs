//! Label lookup index built while documents load.

use std::collections::HashMap;

use serde::Serialize;

use crate::parser::schema::{LabelType, Schematic};
use crate::visitor::{DocumentRef, Node, NodeKind, TreeVisitor};

/// Where a labeled net item lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetRef {
    pub filename: String,
    pub text: String,
    pub uuid: String,
}

#[derive(Debug, Clone, Default)]
pub struct CrossRefIndex {
    by_label_name: HashMap<String, Vec<NetRef>>,
    by_uuid: HashMap<String, NetRef>,
}

impl CrossRefIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build<'a, I>(schematics: I) -> Self
    where
        I: IntoIterator<Item = &'a Schematic>,
    {
        let mut index = Self::new();
        for schematic in schematics {
            index.add_schematic(schematic);
        }
        index
    }

    /// Record every label of `schematic` that carries a UUID; labels without
    /// one are not addressable and are skipped.
    pub fn add_schematic(&mut self, schematic: &Schematic) {
        let mut labels = Vec::new();
        TreeVisitor::new()
            .on(NodeKind::Label, |node, ctx| {
                if let (Node::Label(label), Some(DocumentRef::Schematic(doc))) = (node, ctx.document) {
                    labels.push((doc.filename.as_str(), label));
                }
            })
            .visit(Node::Schematic(schematic));

        // Global labels first, then local, then hierarchical
        labels.sort_by_key(|(_, label)| match label.label_type {
            LabelType::Global => 0,
            LabelType::Local => 1,
            LabelType::Hierarchical => 2,
        });

        for (filename, label) in labels {
            let Some(uuid) = label.uuid.as_deref() else {
                continue;
            };
            let net_ref = NetRef {
                filename: filename.to_string(),
                text: label.text.clone(),
                uuid: uuid.to_string(),
            };
            self.by_uuid.insert(uuid.to_string(), net_ref.clone());
            self.by_label_name
                .entry(label.text.clone())
                .or_default()
                .push(net_ref);
        }
    }

    pub fn find_by_label_name(&self, text: &str) -> &[NetRef] {
        self.by_label_name
            .get(text)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn find_by_uuid(&self, uuid: &str) -> Option<&NetRef> {
        self.by_uuid.get(uuid)
    }

    pub fn len(&self) -> usize {
        self.by_uuid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uuid.is_empty()
    }
}
