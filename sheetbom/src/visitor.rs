//! Depth-first traversal over a document's node tree.
//!
//! Every node kind is a variant of the closed [`Node`] enum. A [`TreeVisitor`]
//! maps a [`NodeKind`] to a handler; nodes whose kind has no handler are
//! walked through without a call.

use std::collections::HashMap;

use crate::parser::pcb_schema::{Board, BoardNet, Footprint, Pad};
use crate::parser::schema::{
    Junction, Label, LibSymbol, NoConnect, PinInstance, Schematic, SchematicSymbol, Sheet,
    SheetInstance, SheetPin, SymbolInstance, Wire,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Schematic,
    LibSymbol,
    Wire,
    Junction,
    NoConnect,
    Label,
    Symbol,
    SymbolInstance,
    SymbolPin,
    Sheet,
    SheetPin,
    SheetInstance,
    Board,
    BoardNet,
    Footprint,
    Pad,
}

/// A borrowed node of a schematic or board tree.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Schematic(&'a Schematic),
    LibSymbol(&'a LibSymbol),
    Wire(&'a Wire),
    Junction(&'a Junction),
    NoConnect(&'a NoConnect),
    Label(&'a Label),
    Symbol(&'a SchematicSymbol),
    SymbolInstance(&'a SymbolInstance),
    SymbolPin(&'a PinInstance),
    Sheet(&'a Sheet),
    SheetPin(&'a SheetPin),
    SheetInstance(&'a SheetInstance),
    Board(&'a Board),
    BoardNet(&'a BoardNet),
    Footprint(&'a Footprint),
    Pad(&'a Pad),
}

/// The document a node belongs to.
#[derive(Debug, Clone, Copy)]
pub enum DocumentRef<'a> {
    Schematic(&'a Schematic),
    Board(&'a Board),
}

impl<'a> DocumentRef<'a> {
    pub fn filename(&self) -> &'a str {
        match self {
            DocumentRef::Schematic(s) => &s.filename,
            DocumentRef::Board(b) => &b.filename,
        }
    }

    pub fn uuid(&self) -> &'a str {
        match self {
            DocumentRef::Schematic(s) => &s.uuid,
            DocumentRef::Board(b) => &b.uuid,
        }
    }

    pub fn as_node(&self) -> Node<'a> {
        match *self {
            DocumentRef::Schematic(s) => Node::Schematic(s),
            DocumentRef::Board(b) => Node::Board(b),
        }
    }
}

impl<'a> Node<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Schematic(_) => NodeKind::Schematic,
            Node::LibSymbol(_) => NodeKind::LibSymbol,
            Node::Wire(_) => NodeKind::Wire,
            Node::Junction(_) => NodeKind::Junction,
            Node::NoConnect(_) => NodeKind::NoConnect,
            Node::Label(_) => NodeKind::Label,
            Node::Symbol(_) => NodeKind::Symbol,
            Node::SymbolInstance(_) => NodeKind::SymbolInstance,
            Node::SymbolPin(_) => NodeKind::SymbolPin,
            Node::Sheet(_) => NodeKind::Sheet,
            Node::SheetPin(_) => NodeKind::SheetPin,
            Node::SheetInstance(_) => NodeKind::SheetInstance,
            Node::Board(_) => NodeKind::Board,
            Node::BoardNet(_) => NodeKind::BoardNet,
            Node::Footprint(_) => NodeKind::Footprint,
            Node::Pad(_) => NodeKind::Pad,
        }
    }

    /// Set for document roots, which become the owning context of their subtree.
    pub fn as_document(&self) -> Option<DocumentRef<'a>> {
        match *self {
            Node::Schematic(s) => Some(DocumentRef::Schematic(s)),
            Node::Board(b) => Some(DocumentRef::Board(b)),
            _ => None,
        }
    }

    /// Direct children in traversal order.
    pub fn children(&self) -> Vec<Node<'a>> {
        match *self {
            Node::Schematic(s) => {
                let mut out = Vec::with_capacity(
                    s.lib_symbols.len() + s.labels.len() + s.symbols.len() + s.sheets.len(),
                );
                out.extend(s.lib_symbols.iter().map(Node::LibSymbol));
                out.extend(s.wires.iter().map(Node::Wire));
                out.extend(s.junctions.iter().map(Node::Junction));
                out.extend(s.no_connects.iter().map(Node::NoConnect));
                out.extend(s.labels.iter().map(Node::Label));
                out.extend(s.symbols.iter().map(Node::Symbol));
                out.extend(s.sheets.iter().map(Node::Sheet));
                out
            }
            Node::LibSymbol(l) => l.children.iter().map(Node::LibSymbol).collect(),
            Node::Symbol(s) => s
                .instances
                .iter()
                .map(Node::SymbolInstance)
                .chain(s.pins.iter().map(Node::SymbolPin))
                .collect(),
            Node::Sheet(s) => s
                .pins
                .iter()
                .map(Node::SheetPin)
                .chain(s.instances.iter().map(Node::SheetInstance))
                .collect(),
            Node::Board(b) => b
                .nets
                .iter()
                .map(Node::BoardNet)
                .chain(b.footprints.iter().map(Node::Footprint))
                .collect(),
            Node::Footprint(f) => f.pads.iter().map(Node::Pad).collect(),
            _ => Vec::new(),
        }
    }
}

/// Where the visitor currently is.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisitContext<'a> {
    /// Owning document, once a document root has been entered
    pub document: Option<DocumentRef<'a>>,
    /// Node whose children are being walked
    pub parent: Option<Node<'a>>,
    pub depth: usize,
}

type Handler<'a, 'h> = Box<dyn FnMut(Node<'a>, &VisitContext<'a>) + 'h>;

/// Pre-order tree walker dispatching on [`NodeKind`].
#[derive(Default)]
pub struct TreeVisitor<'a, 'h> {
    handlers: HashMap<NodeKind, Handler<'a, 'h>>,
}

impl<'a, 'h> TreeVisitor<'a, 'h> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register the handler for one node kind, replacing any earlier one.
    pub fn on<F>(mut self, kind: NodeKind, handler: F) -> Self
    where
        F: FnMut(Node<'a>, &VisitContext<'a>) + 'h,
    {
        self.handlers.insert(kind, Box::new(handler));
        self
    }

    pub fn handles(&self, kind: NodeKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn visit(&mut self, root: Node<'a>) {
        self.walk(root, VisitContext::default());
    }

    pub fn visit_document(&mut self, document: DocumentRef<'a>) {
        self.visit(document.as_node());
    }

    fn walk(&mut self, node: Node<'a>, mut ctx: VisitContext<'a>) {
        if let Some(document) = node.as_document() {
            ctx.document = Some(document);
        }

        if let Some(handler) = self.handlers.get_mut(&node.kind()) {
            handler(node, &ctx);
        }

        let child_ctx = VisitContext {
            document: ctx.document,
            parent: Some(node),
            depth: ctx.depth + 1,
        };
        for child in node.children() {
            self.walk(child, child_ctx);
        }
    }
}
