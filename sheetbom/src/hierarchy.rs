//! Sheet hierarchy resolution.
//!
//! Finds the root schematic of a project and lays every sheet placement out
//! as an ordered list of pages.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::document::match_filename;
use crate::parser::schema::{Schematic, Sheet, SheetInstance};
use crate::visitor::{Node, NodeKind, TreeVisitor};

/// One placement of a schematic file at a hierarchical path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub filename: String,
    /// `/<root uuid>[/<sheet uuid>...]`
    #[serde(rename = "hierarchical_path")]
    pub sheet_path: String,
    #[serde(rename = "display_name")]
    pub name: String,
    pub page_number: String,
}

impl Page {
    pub fn new(
        filename: impl Into<String>,
        sheet_path: impl Into<String>,
        name: impl Into<String>,
        page_number: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            sheet_path: sheet_path.into(),
            name: name.into(),
            page_number: page_number.into(),
        }
    }

    /// Unique key of the page within its project.
    pub fn project_path(&self) -> String {
        if self.sheet_path.is_empty() {
            self.filename.clone()
        } else {
            format!("{}:{}", self.filename, self.sheet_path)
        }
    }
}

struct SheetEdge<'a> {
    path: String,
    filename: &'a str,
    sheet: &'a Sheet,
    instance: &'a SheetInstance,
}

/// Resolved page layout of a project's schematics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hierarchy {
    pages: Vec<Page>,
    resolved: bool,
}

impl Hierarchy {
    /// Resolve the hierarchy of a complete set of schematics, in load order.
    ///
    /// Never fails: without a detectable root the schematics are listed as
    /// they were loaded and [`Hierarchy::is_resolved`] is false.
    pub fn resolve<'a, I>(schematics: I) -> Self
    where
        I: IntoIterator<Item = &'a Schematic>,
    {
        let schematics: Vec<&'a Schematic> = schematics.into_iter().collect();
        let filenames: Vec<&str> = schematics.iter().map(|s| s.filename.as_str()).collect();

        let paths_to_schematics: HashMap<String, &Schematic> = schematics
            .iter()
            .map(|s| (format!("/{}", s.uuid), *s))
            .collect();

        // Keyed by "<instance path>/<sheet uuid>"; a repeated key keeps its
        // first position and takes the latest placement.
        let mut edges: Vec<SheetEdge<'a>> = Vec::new();
        let mut edge_index: HashMap<String, usize> = HashMap::new();

        for schematic in schematics.iter().copied() {
            let mut found: Vec<(&'a Sheet, &'a SheetInstance)> = Vec::new();
            TreeVisitor::new()
                .on(NodeKind::SheetInstance, |node, ctx| {
                    if let (Node::SheetInstance(instance), Some(Node::Sheet(sheet))) = (node, ctx.parent) {
                        found.push((sheet, instance));
                    }
                })
                .visit(Node::Schematic(schematic));

            for (sheet, instance) in found {
                let Some(filename) = sheet
                    .sheetfile()
                    .and_then(|f| match_filename(filenames.iter().copied(), f))
                else {
                    warn!(
                        "Sheet {} in {} references {:?}, which is not loaded",
                        sheet.uuid,
                        schematic.filename,
                        sheet.sheetfile().unwrap_or_default()
                    );
                    continue;
                };

                let edge = SheetEdge {
                    path: format!("{}/{}", instance.path, sheet.uuid),
                    filename,
                    sheet,
                    instance,
                };
                match edge_index.get(&edge.path).copied() {
                    Some(i) => edges[i] = edge,
                    None => {
                        edge_index.insert(edge.path.clone(), edges.len());
                        edges.push(edge);
                    }
                }
            }
        }

        // Shortest paths first: the first edge whose parent is a document's
        // own path names the root.
        let mut by_length: Vec<&str> = edges.iter().map(|e| e.path.as_str()).collect();
        by_length.sort_by_key(|p| p.len());

        let root = by_length.iter().find_map(|path| {
            let (parent, _) = path.rsplit_once('/')?;
            if parent.is_empty() {
                return None;
            }
            paths_to_schematics.get(parent).copied()
        });

        let mut pages: Vec<Page> = Vec::new();
        if let Some(root) = root {
            debug!("Root schematic is {} ({})", root.filename, root.uuid);
            pages.push(Page::new(&root.filename, format!("/{}", root.uuid), "Root", "1"));
            for edge in &edges {
                let name = edge
                    .sheet
                    .sheetname()
                    .or_else(|| edge.sheet.sheetfile())
                    .unwrap_or(edge.filename);
                pages.push(Page::new(
                    edge.filename,
                    edge.path.as_str(),
                    name,
                    edge.instance.page.as_deref().unwrap_or(""),
                ));
            }
            pages.sort_by(|a, b| compare_page_numbers(&a.page_number, &b.page_number));
        } else {
            debug!("No sheet hierarchy found among {} schematics", schematics.len());
        }

        let seen: HashSet<&str> = pages.iter().map(|p| p.filename.as_str()).collect();
        let orphans: Vec<Page> = schematics
            .iter()
            .filter(|s| !seen.contains(s.filename.as_str()))
            .map(|s| Page::new(&s.filename, format!("/{}", s.uuid), &s.filename, ""))
            .collect();
        pages.extend(orphans);

        let pages = dedup_by_project_path(pages);
        debug!("Resolved {} pages", pages.len());

        Self {
            pages,
            resolved: root.is_some(),
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// The root page, or the first loaded schematic when nothing resolved.
    pub fn root_page(&self) -> Option<&Page> {
        self.pages.first()
    }

    /// Whether a real root was found from the sheet instance tables.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page_by_project_path(&self, project_path: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.project_path() == project_path)
    }
}

/// Later pages replace earlier ones with the same project path, in place.
fn dedup_by_project_path(pages: Vec<Page>) -> Vec<Page> {
    let mut out: Vec<Page> = Vec::with_capacity(pages.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for page in pages {
        let key = page.project_path();
        match index.get(&key).copied() {
            Some(i) => out[i] = page,
            None => {
                index.insert(key, out.len());
                out.push(page);
            }
        }
    }
    out
}

/// Order page numbers by their leading run of digits, then by the full string.
///
/// Numbers without leading digits sort after numbered ones.
pub fn compare_page_numbers(a: &str, b: &str) -> Ordering {
    match (leading_digits(a), leading_digits(b)) {
        (Some(x), Some(y)) => compare_digit_runs(x, y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn leading_digits(s: &str) -> Option<&str> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        None
    } else {
        Some(&s[..end])
    }
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
