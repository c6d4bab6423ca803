//! Project loading and the derived views over it: pages, BOM and lookups.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bom::{extract_project_bom, BomItem, BomSource, DesignatorRef, GroupedBomItem};
use crate::core::{LoadOptions, SheetbomError};
use crate::document::{file_stem, match_filename, Document, FileKind};
use crate::hierarchy::{Hierarchy, Page};
use crate::parser::pcb_schema::Board;
use crate::parser::project_file::ProjectSettings;
use crate::parser::schema::Schematic;
use crate::source::DocumentSource;
use crate::text_vars::{Stage, TextVarResolver};
use crate::xref::{CrossRefIndex, NetRef};

/// A loaded set of documents plus everything derived from them.
///
/// Derived state is computed once, when the project is built, and never
/// updated in place. Loading again produces a fresh project.
#[derive(Debug, Clone)]
pub struct Project {
    name: Option<String>,
    settings: ProjectSettings,
    documents: Vec<Document>,
    hierarchy: Hierarchy,
    bom_source: BomSource,
    raw_bom: Vec<BomItem>,
    bom: Vec<GroupedBomItem>,
    designators: std::collections::HashMap<String, DesignatorRef>,
    xref: CrossRefIndex,
    loaded_at: DateTime<Utc>,
}

/// Serializable snapshot of a project's pages and BOM.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub project_name: String,
    pub loaded_at: DateTime<Utc>,
    pub schematic_count: usize,
    pub board_count: usize,
    pub hierarchy_resolved: bool,
    pub bom_source: BomSource,
    pub pages: Vec<Page>,
    pub bom: Vec<GroupedBomItem>,
}

impl Project {
    /// Fetch and parse every document of `source`, then resolve the project.
    ///
    /// Documents are read and parsed concurrently, up to
    /// `options.concurrency` at a time. Nothing is derived until all of them
    /// have finished.
    pub async fn load<S>(source: &S, options: &LoadOptions) -> Result<Self, SheetbomError>
    where
        S: DocumentSource + ?Sized,
    {
        info!("Loading project from {}", source.name());
        let names = source.list().await?;

        let mut project_files = Vec::new();
        let mut document_names = Vec::new();
        let mut seen = HashSet::new();

        for name in names {
            let base = name.rsplit('/').next().unwrap_or(&name);
            if base.starts_with('.') {
                debug!("Skipping hidden file {}", name);
                continue;
            }
            match FileKind::from_filename(&name) {
                Some(FileKind::Project) => project_files.push(name),
                Some(_) => {
                    if seen.insert(name.clone()) {
                        document_names.push(name);
                    }
                }
                None => warn!("Couldn't load {}: unknown file type", name),
            }
        }

        let mut name = None;
        let mut settings = ProjectSettings::default();
        if let Some(project_file) = project_files.first() {
            match load_settings(source, project_file).await {
                Ok(loaded) => {
                    name = Some(file_stem(project_file).to_string());
                    settings = loaded;
                }
                Err(e) if options.strict => return Err(e),
                Err(e) => warn!("Skipping {}: {}", project_file, e),
            }
        }

        let results: Vec<(String, Result<Document, SheetbomError>)> = stream::iter(document_names)
            .map(|filename| async move {
                let result = load_document(source, &filename).await;
                (filename, result)
            })
            .buffered(options.concurrency.max(1))
            .collect()
            .await;

        let mut documents = Vec::with_capacity(results.len());
        for (filename, result) in results {
            match result {
                Ok(document) => documents.push(document),
                Err(e) if options.strict => return Err(e),
                Err(e) => warn!("Skipping {}: {}", filename, e),
            }
        }

        let project = Self::build(name, settings, documents);
        info!(
            "Loaded {} schematics and {} boards, {} pages, {} BOM rows",
            project.schematics().count(),
            project.boards().count(),
            project.pages().len(),
            project.bom_items().len()
        );
        Ok(project)
    }

    /// Replace this project with a fresh load of `source`.
    pub async fn reload<S>(&mut self, source: &S, options: &LoadOptions) -> Result<(), SheetbomError>
    where
        S: DocumentSource + ?Sized,
    {
        *self = Self::load(source, options).await?;
        Ok(())
    }

    /// Build a project from documents that are already parsed, in load order.
    pub fn from_documents(documents: Vec<Document>, settings: ProjectSettings) -> Self {
        Self::build(None, settings, documents)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn build(name: Option<String>, settings: ProjectSettings, documents: Vec<Document>) -> Self {
        let mut seen = HashSet::new();
        let documents: Vec<Document> = documents
            .into_iter()
            .filter(|d| seen.insert(d.filename().to_string()))
            .collect();

        let schematics: Vec<&Schematic> = documents.iter().filter_map(Document::as_schematic).collect();
        let boards: Vec<&Board> = documents.iter().filter_map(Document::as_board).collect();

        let xref = CrossRefIndex::build(schematics.iter().copied());

        let hierarchy = if schematics.is_empty() {
            Hierarchy::default()
        } else {
            Hierarchy::resolve(schematics.iter().copied())
        };

        let traversal: Vec<&Schematic> = if hierarchy.is_resolved() {
            hierarchy
                .pages()
                .iter()
                .filter_map(|page| find_document(&documents, &page.filename))
                .filter_map(Document::as_schematic)
                .collect()
        } else {
            schematics.clone()
        };

        let project_bom = extract_project_bom(traversal, boards.iter().copied());
        let bom = project_bom.grouped();

        Self {
            name,
            settings,
            hierarchy,
            bom_source: project_bom.source,
            raw_bom: project_bom.items,
            bom,
            designators: project_bom.designators,
            xref,
            loaded_at: Utc::now(),
            documents,
        }
    }

    /// `.kicad_pro` stem, else the first board's stem, else the root page's.
    pub fn project_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.boards().next().map(|b| file_stem(&b.filename)))
            .or_else(|| self.root_page().map(|p| file_stem(&p.filename)))
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn schematics(&self) -> impl Iterator<Item = &Schematic> {
        self.documents.iter().filter_map(Document::as_schematic)
    }

    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        self.documents.iter().filter_map(Document::as_board)
    }

    pub fn has_schematics(&self) -> bool {
        self.schematics().next().is_some()
    }

    pub fn has_boards(&self) -> bool {
        self.boards().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Exact filename, else a loaded file whose name ends with `/<name>`.
    pub fn file_by_name(&self, name: &str) -> Option<&Document> {
        find_document(&self.documents, name)
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn pages(&self) -> &[Page] {
        self.hierarchy.pages()
    }

    pub fn root_page(&self) -> Option<&Page> {
        self.hierarchy.root_page()
    }

    pub fn hierarchy_resolved(&self) -> bool {
        self.hierarchy.is_resolved()
    }

    pub fn page_document(&self, page: &Page) -> Option<&Document> {
        self.file_by_name(&page.filename)
    }

    /// Schematics in page order; a reused sheet appears once per placement.
    pub fn schematics_in_page_order(&self) -> Vec<&Schematic> {
        self.pages()
            .iter()
            .filter_map(|p| self.page_document(p))
            .filter_map(Document::as_schematic)
            .collect()
    }

    /// The document to open first for a file kind.
    pub fn first_page(&self, kind: FileKind) -> Option<&Document> {
        match kind {
            FileKind::Schematic => {
                let by_project_name = self
                    .name
                    .as_deref()
                    .and_then(|n| self.file_by_name(&format!("{}.kicad_sch", n)))
                    .filter(|d| d.kind() == FileKind::Schematic);
                by_project_name
                    .or_else(|| self.root_page().and_then(|p| self.page_document(p)))
                    .or_else(|| self.documents.iter().find(|d| d.kind() == FileKind::Schematic))
            }
            FileKind::Board => self.documents.iter().find(|d| d.kind() == FileKind::Board),
            FileKind::Project => None,
        }
    }

    /// Grouped BOM rows, one per `(footprint, name, dnp)`.
    pub fn bom_items(&self) -> &[GroupedBomItem] {
        &self.bom
    }

    /// Ungrouped BOM items the rows were built from.
    pub fn raw_bom_items(&self) -> &[BomItem] {
        &self.raw_bom
    }

    pub fn bom_source(&self) -> BomSource {
        self.bom_source
    }

    pub fn find_labels_by_name(&self, text: &str) -> &[NetRef] {
        self.xref.find_by_label_name(text)
    }

    pub fn find_net_item(&self, uuid: &str) -> Option<&NetRef> {
        self.xref.find_by_uuid(uuid)
    }

    pub fn find_designator(&self, reference: &str) -> Option<&DesignatorRef> {
        self.designators.get(reference)
    }

    /// Expand `${...}` variables as seen by a placed symbol, falling back to
    /// the project's own text variables.
    pub fn resolve_text(&self, filename: &str, symbol_uuid: &str, text: &str) -> Option<String> {
        let schematic = self.file_by_name(filename)?.as_schematic()?;
        let symbol = schematic.symbol_by_uuid(symbol_uuid)?;
        let resolver = TextVarResolver::for_symbol(schematic, symbol).with(Stage::Project(&self.settings));
        Some(resolver.expand(text))
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            project_name: self.project_name().unwrap_or_default().to_string(),
            loaded_at: self.loaded_at,
            schematic_count: self.schematics().count(),
            board_count: self.boards().count(),
            hierarchy_resolved: self.hierarchy_resolved(),
            bom_source: self.bom_source,
            pages: self.pages().to_vec(),
            bom: self.bom.clone(),
        }
    }
}

fn find_document<'a>(documents: &'a [Document], name: &str) -> Option<&'a Document> {
    let filename = match_filename(documents.iter().map(Document::filename), name)?;
    documents.iter().find(|d| d.filename() == filename)
}

async fn load_document<S>(source: &S, filename: &str) -> Result<Document, SheetbomError>
where
    S: DocumentSource + ?Sized,
{
    info!("Loading file {}", filename);
    let content = source.read_text(filename).await?;
    let name = filename.to_string();
    tokio::task::spawn_blocking(move || Document::parse(&name, &content))
        .await
        .map_err(|e| SheetbomError::Source(e.to_string()))?
}

async fn load_settings<S>(source: &S, filename: &str) -> Result<ProjectSettings, SheetbomError>
where
    S: DocumentSource + ?Sized,
{
    let content = source.read_text(filename).await?;
    ProjectSettings::from_json(&content).map_err(|e| SheetbomError::parse(filename, e))
}
