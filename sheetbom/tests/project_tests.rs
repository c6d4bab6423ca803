//! Project loading, lookups and text variables

use sheetbom::prelude::*;
use sheetbom::{Document, FileKind};
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

async fn load_hierarchical(options: &LoadOptions) -> Project {
    let source = DirectorySource::new(fixture_path("hierarchical"));
    Project::load(&source, options).await.expect("fixture project should load")
}

fn copy_dir(from: &Path, to: &Path) {
    for entry in std::fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), to.join(entry.file_name())).unwrap();
    }
}

#[tokio::test]
async fn test_project_file_supplies_name_and_variables() {
    let project = load_hierarchical(&LoadOptions::default()).await;

    assert_eq!(project.project_name(), Some("main"));
    assert_eq!(project.settings().text_variable("REVISION_NOTE"), Some("prototype run"));
    assert_eq!(project.documents().len(), 5);
    assert_eq!(project.schematics().count(), 4);
    assert!(project.has_boards());
}

#[tokio::test]
async fn test_first_pages() {
    let project = load_hierarchical(&LoadOptions::default()).await;

    assert_eq!(
        project.first_page(FileKind::Schematic).map(Document::filename),
        Some("main.kicad_sch")
    );
    assert_eq!(
        project.first_page(FileKind::Board).map(Document::filename),
        Some("main.kicad_pcb")
    );
    assert!(project.first_page(FileKind::Project).is_none());
}

#[tokio::test]
async fn test_label_lookup_orders_global_first() {
    let project = load_hierarchical(&LoadOptions::default()).await;

    let vin: Vec<_> = project
        .find_labels_by_name("VIN")
        .iter()
        .map(|r| r.filename.as_str())
        .collect();
    // power.kicad_sch holds a global and a hierarchical VIN
    assert_eq!(vin, vec!["main.kicad_sch", "power.kicad_sch", "power.kicad_sch"]);
    assert_eq!(
        project.find_labels_by_name("VIN")[2].uuid,
        "3f4e5d6c-7b8a-4c9d-8e0f-1a2b3c4d5e02"
    );

    let out = project
        .find_net_item("9b0a1c2d-3e4f-4a5b-8c6d-7e8f9a0b1c02")
        .expect("OUT label");
    assert_eq!(out.text, "OUT");
    assert_eq!(out.filename, "amp.kicad_sch");
    assert!(project.find_labels_by_name("NOPE").is_empty());
}

#[tokio::test]
async fn test_text_variables_through_title_block_and_project() {
    let project = load_hierarchical(&LoadOptions::default()).await;
    let r1 = "5a0e1b2c-3d4e-4f5a-8b6c-7d8e9f0a1b02";

    assert_eq!(
        project
            .resolve_text("main.kicad_sch", r1, "${REFERENCE} ${VALUE} rev ${REV}")
            .as_deref(),
        Some("R1 10k rev B")
    );
    assert_eq!(
        project.resolve_text("main.kicad_sch", r1, "${COMMENT1}").as_deref(),
        Some("prototype run")
    );
    assert_eq!(
        project.resolve_text("main.kicad_sch", r1, "${UNKNOWN}").as_deref(),
        Some("${UNKNOWN}")
    );
    assert!(project.resolve_text("main.kicad_sch", "missing", "x").is_none());
}

#[tokio::test]
async fn test_concurrency_does_not_change_result() {
    let serial = load_hierarchical(&LoadOptions::default().with_concurrency(1)).await;
    let parallel = load_hierarchical(&LoadOptions::default().with_concurrency(16)).await;

    assert_eq!(serial.pages(), parallel.pages());
    assert_eq!(serial.bom_items(), parallel.bom_items());
    let names = |p: &Project| p.documents().iter().map(|d| d.filename().to_string()).collect::<Vec<_>>();
    assert_eq!(names(&serial), names(&parallel));
}

#[tokio::test]
async fn test_broken_file_strict_and_lenient() {
    let dir = tempfile::tempdir().unwrap();
    copy_dir(&fixture_path("hierarchical"), dir.path());
    std::fs::write(dir.path().join("broken.kicad_sch"), "(kicad_sch (uuid").unwrap();

    let source = DirectorySource::new(dir.path());

    let strict = Project::load(&source, &LoadOptions::default()).await;
    match strict {
        Err(SheetbomError::Parse { file, .. }) => assert_eq!(file, "broken.kicad_sch"),
        other => panic!("expected parse error, got {:?}", other.map(|p| p.documents().len())),
    }

    let lenient = Project::load(&source, &LoadOptions::lenient()).await.unwrap();
    assert_eq!(lenient.schematics().count(), 4);
    assert!(lenient.hierarchy_resolved());
}

#[tokio::test]
async fn test_subdirectory_sheets_resolve_by_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sheets");
    std::fs::create_dir(&sub).unwrap();
    copy_dir(&fixture_path("hierarchical"), dir.path());
    for moved in ["amp.kicad_sch", "power.kicad_sch"] {
        std::fs::rename(dir.path().join(moved), sub.join(moved)).unwrap();
    }

    let project = Project::load(&DirectorySource::new(dir.path()), &LoadOptions::default())
        .await
        .unwrap();

    assert!(project.hierarchy_resolved());
    let files: Vec<_> = project.pages().iter().map(|p| p.filename.as_str()).collect();
    assert_eq!(
        files,
        vec![
            "main.kicad_sch",
            "sheets/amp.kicad_sch",
            "sheets/amp.kicad_sch",
            "sheets/power.kicad_sch",
            "notes.kicad_sch",
        ]
    );
    assert_eq!(
        project.find_designator("U3").map(|d| d.sheet.as_str()),
        Some("sheets/power.kicad_sch")
    );
}

#[tokio::test]
async fn test_reload_from_other_directory() {
    let mut project = load_hierarchical(&LoadOptions::default()).await;
    let before = project.loaded_at();

    project
        .reload(&DirectorySource::new(fixture_path("board_only")), &LoadOptions::default())
        .await
        .unwrap();

    assert!(project.loaded_at() >= before);
    assert!(project.pages().is_empty());
    assert_eq!(project.bom_source(), BomSource::Board);
    assert!(project.find_net_item("9b0a1c2d-3e4f-4a5b-8c6d-7e8f9a0b1c02").is_none());
}

#[tokio::test]
async fn test_summary_json() {
    let project = load_hierarchical(&LoadOptions::default()).await;
    let json = serde_json::to_value(project.summary()).unwrap();

    assert_eq!(json["project_name"], "main");
    assert_eq!(json["schematic_count"], 4);
    assert_eq!(json["board_count"], 1);
    assert_eq!(json["hierarchy_resolved"], true);
    assert_eq!(json["bom_source"], "schematic");
    assert_eq!(json["pages"][3]["display_name"], "Power");
    assert_eq!(
        json["pages"][3]["hierarchical_path"],
        "/0b6f5a2e-3c1d-4e8f-9a7b-5c2d1e0f3a10/d2c4e6f8-1a3b-4c5d-8e7f-9a0b1c2d3e53"
    );
    assert_eq!(json["pages"][3]["page_number"], "10");
    assert_eq!(json["bom"].as_array().map(Vec::len), Some(9));
}
