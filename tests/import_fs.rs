use std::path::Path;

use pbrforge::graph::NodeKind;
use pbrforge::host::{FsEnumerator, FsImageLoader};
use pbrforge::{BatchMaterialImporter, ImportOptions, MaterialLibrary, RoleKeywordTable};

fn write_png(dir: &Path, name: &str) {
    image::RgbImage::new(8, 8).save(dir.join(name)).unwrap();
}

fn texture_tree() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();

    let brick = root.path().join("brick");
    std::fs::create_dir(&brick).unwrap();
    write_png(&brick, "Brick_Diffuse_2K.png");
    write_png(&brick, "Brick_Roughness_2K.png");
    write_png(&brick, "Brick_Normal_2K.png");
    write_png(&brick, "Brick_Height_2K.png");

    let marble = root.path().join("marble");
    std::fs::create_dir(&marble).unwrap();
    write_png(&marble, "marble_albedo.png");
    write_png(&marble, "marble_gloss.png");
    std::fs::write(marble.join("marble_opacity.png"), b"truncated").unwrap();

    let docs = root.path().join("docs");
    std::fs::create_dir(&docs).unwrap();
    std::fs::write(docs.join("readme.txt"), b"license").unwrap();

    root
}

fn import(root: &Path, library: &mut MaterialLibrary, options: &ImportOptions) -> pbrforge::ImportReport {
    let table = RoleKeywordTable::default();
    BatchMaterialImporter::new(&FsEnumerator, &FsImageLoader, &table)
        .import_all(library, root, options)
        .unwrap()
}

#[test]
fn imports_a_directory_tree() {
    let root = texture_tree();
    let mut library = MaterialLibrary::new();
    let report = import(root.path(), &mut library, &ImportOptions::default());

    assert_eq!((report.imported, report.deleted, report.skipped), (2, 1, 0));
    assert!(report.failures.is_empty());
    assert!(library.get("docs").is_none());

    let brick = library.get("brick").unwrap();
    assert_eq!(brick.texture_count(), 4);
    assert!(brick.nodes.iter().any(|n| matches!(n.kind, NodeKind::NormalMap)));
    assert!(brick.nodes.iter().any(|n| matches!(n.kind, NodeKind::Displacement { .. })));

    // The unreadable opacity map is left out and reported.
    let marble = library.get("marble").unwrap();
    assert_eq!(marble.texture_count(), 2);
    assert!(marble.nodes.iter().any(|n| matches!(n.kind, NodeKind::Invert)));
    assert_eq!(report.notices.len(), 1);
    assert_eq!(report.notices[0].0, "marble");
}

#[test]
fn second_run_skips_existing_materials() {
    let root = texture_tree();
    let mut library = MaterialLibrary::new();
    let first = import(root.path(), &mut library, &ImportOptions::default());
    let second = import(root.path(), &mut library, &ImportOptions::default());

    assert_eq!(second.skipped, first.imported);
    assert_eq!(second.imported, 0);
    assert_eq!(second.deleted, 1);
    assert_eq!(library.len(), 2);
}

#[test]
fn library_survives_saving_to_disk() {
    let root = texture_tree();
    let mut library = MaterialLibrary::new();
    import(root.path(), &mut library, &ImportOptions::default());

    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("library.json");
    std::fs::write(&path, library.to_json().unwrap()).unwrap();
    let loaded = MaterialLibrary::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(loaded, library);
}
