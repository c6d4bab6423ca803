use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sheetbom::bom::{extract_project_bom, group_bom_items};
use sheetbom::{Hierarchy, Schematic};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn hierarchical_schematics() -> Vec<Schematic> {
    ["main", "amp", "power", "notes"]
        .iter()
        .filter_map(|name| {
            sheetbom::parse_schematic(&fixture_path(&format!("hierarchical/{}.kicad_sch", name))).ok()
        })
        .collect()
}

fn bench_parse_schematic(c: &mut Criterion) {
    c.bench_function("parse_schematic", |b| {
        b.iter(|| sheetbom::parse_schematic(black_box(&fixture_path("hierarchical/amp.kicad_sch"))));
    });
}

fn bench_resolve_hierarchy(c: &mut Criterion) {
    let schematics = hierarchical_schematics();

    c.bench_function("resolve_hierarchy", |b| {
        b.iter(|| Hierarchy::resolve(black_box(&schematics)));
    });
}

fn bench_extract_and_group_bom(c: &mut Criterion) {
    let schematics = hierarchical_schematics();
    let hierarchy = Hierarchy::resolve(&schematics);
    let traversal: Vec<&Schematic> = hierarchy
        .pages()
        .iter()
        .filter_map(|page| schematics.iter().find(|s| s.filename == page.filename))
        .collect();

    c.bench_function("extract_and_group_bom", |b| {
        b.iter(|| {
            let bom = extract_project_bom(black_box(traversal.iter().copied()), Vec::<&sheetbom::Board>::new());
            group_bom_items(&bom.items)
        });
    });
}

criterion_group!(
    benches,
    bench_parse_schematic,
    bench_resolve_hierarchy,
    bench_extract_and_group_bom
);
criterion_main!(benches);
