//! Sheet hierarchy resolution over the fixture projects

use sheetbom::prelude::*;
use sheetbom::{Hierarchy, Schematic};
use std::path::PathBuf;

const ROOT_UUID: &str = "0b6f5a2e-3c1d-4e8f-9a7b-5c2d1e0f3a10";
const AMP_LEFT_SHEET: &str = "d2c4e6f8-1a3b-4c5d-8e7f-9a0b1c2d3e51";
const AMP_RIGHT_SHEET: &str = "d2c4e6f8-1a3b-4c5d-8e7f-9a0b1c2d3e52";

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn parse(name: &str) -> Schematic {
    sheetbom::parse_schematic(&fixture_path(name)).expect("fixture should parse")
}

fn hierarchical_schematics() -> Vec<Schematic> {
    ["amp", "main", "notes", "power"]
        .iter()
        .map(|name| parse(&format!("hierarchical/{}.kicad_sch", name)))
        .collect()
}

#[test]
fn test_root_detected_and_pages_numbered() {
    let schematics = hierarchical_schematics();
    let hierarchy = Hierarchy::resolve(&schematics);

    assert!(hierarchy.is_resolved());

    let root = hierarchy.root_page().expect("root page");
    assert_eq!(root.filename, "main.kicad_sch");
    assert_eq!(root.name, "Root");
    assert_eq!(root.page_number, "1");
    assert_eq!(root.sheet_path, format!("/{}", ROOT_UUID));

    let pages: Vec<_> = hierarchy
        .pages()
        .iter()
        .map(|p| (p.name.as_str(), p.page_number.as_str(), p.filename.as_str()))
        .collect();
    assert_eq!(
        pages,
        vec![
            ("Root", "1", "main.kicad_sch"),
            ("Amp Left", "2", "amp.kicad_sch"),
            ("Amp Right", "3", "amp.kicad_sch"),
            ("Power", "10", "power.kicad_sch"),
            ("notes.kicad_sch", "", "notes.kicad_sch"),
        ]
    );
}

#[test]
fn test_reused_sheet_has_one_page_per_placement() {
    let schematics = hierarchical_schematics();
    let hierarchy = Hierarchy::resolve(&schematics);

    let amp_paths: Vec<_> = hierarchy
        .pages()
        .iter()
        .filter(|p| p.filename == "amp.kicad_sch")
        .map(|p| p.sheet_path.clone())
        .collect();
    assert_eq!(
        amp_paths,
        vec![
            format!("/{}/{}", ROOT_UUID, AMP_LEFT_SHEET),
            format!("/{}/{}", ROOT_UUID, AMP_RIGHT_SHEET),
        ]
    );

    let key = format!("amp.kicad_sch:/{}/{}", ROOT_UUID, AMP_RIGHT_SHEET);
    let page = hierarchy.page_by_project_path(&key).expect("page by project path");
    assert_eq!(page.name, "Amp Right");
}

#[test]
fn test_load_order_does_not_change_pages() {
    let schematics = hierarchical_schematics();
    let forward = Hierarchy::resolve(&schematics);
    let reversed = Hierarchy::resolve(schematics.iter().rev());

    let names = |h: &Hierarchy| h.pages().iter().map(|p| p.name.clone()).collect::<Vec<_>>();
    // Orphans follow load order; everything placed is identical
    assert_eq!(names(&forward)[..4], names(&reversed)[..4]);
}

#[test]
fn test_flat_schematic_is_unresolved() {
    let flat = parse("flat/flat.kicad_sch");
    let hierarchy = Hierarchy::resolve([&flat]);

    assert!(!hierarchy.is_resolved());
    // The first loaded schematic stands in for the root
    assert_eq!(
        hierarchy.root_page().map(|p| p.filename.as_str()),
        Some(flat.filename.as_str())
    );
    assert_eq!(hierarchy.pages().len(), 1);
    assert_eq!(hierarchy.pages()[0].page_number, "");
    assert_eq!(hierarchy.pages()[0].name, flat.filename);
}

#[test]
fn test_missing_sheet_file_is_skipped() {
    let schematics: Vec<Schematic> = hierarchical_schematics()
        .into_iter()
        .filter(|s| s.filename != "power.kicad_sch")
        .collect();
    let hierarchy = Hierarchy::resolve(&schematics);

    assert!(hierarchy.is_resolved());
    assert!(hierarchy.pages().iter().all(|p| p.name != "Power"));
    assert_eq!(hierarchy.pages().len(), 4);
}

#[tokio::test]
async fn test_directory_project_pages() {
    let source = DirectorySource::new(fixture_path("hierarchical"));
    let project = Project::load(&source, &LoadOptions::default()).await.unwrap();

    assert!(project.hierarchy_resolved());
    let order: Vec<_> = project
        .schematics_in_page_order()
        .iter()
        .map(|s| s.filename.as_str())
        .collect();
    assert_eq!(
        order,
        vec![
            "main.kicad_sch",
            "amp.kicad_sch",
            "amp.kicad_sch",
            "power.kicad_sch",
            "notes.kicad_sch",
        ]
    );
}
