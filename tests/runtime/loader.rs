//! Integration tests for the data loader
//!
//! Tests multi-file merging, ordinals, duplicate ids, and error context.

use modelgen_foundation::{ErrorKind, Ordinal};
use modelgen_runtime::rpg::game_schema;
use modelgen_runtime::{DataLoader, data_files};

use crate::write_files;

const IRON: &str = r#"{"id": "iron", "type": "weapon_upgrade_material", "name": "Iron", "value": 1, "description": "ore"}"#;
const GOLD: &str = r#"{"id": "gold", "type": "weapon_upgrade_material", "name": "Gold", "value": 5, "description": "ore"}"#;
const MYTHRIL: &str = r#"{"id": "mythril", "type": "weapon_upgrade_material", "name": "Mythril", "value": 20, "description": "ore"}"#;

fn materials(entries: &[&str]) -> String {
    format!(r#"{{"upgrade_materials": [{}]}}"#, entries.join(", "))
}

// =============================================================================
// Merging
// =============================================================================

#[test]
fn materials_across_two_files_get_consecutive_ordinals() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = (materials(&[IRON, GOLD]), materials(&[MYTHRIL]));
    write_files(dir.path(), &[("a.json", a.as_str()), ("b.json", b.as_str())]);

    let schema = game_schema().unwrap();
    let instances = DataLoader::new(&schema).unwrap().load_dir(dir.path()).unwrap();
    let ty = schema.by_name("WeaponUpgradeMaterialData").unwrap();
    assert_eq!(instances.ordinal_of(ty, "iron"), Some(Ordinal::new(0)));
    assert_eq!(instances.ordinal_of(ty, "gold"), Some(Ordinal::new(1)));
    assert_eq!(instances.ordinal_of(ty, "mythril"), Some(Ordinal::new(2)));
    assert!(instances.is_sealed());
}

#[test]
fn repeated_id_across_files_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = (materials(&[IRON, GOLD]), materials(&[MYTHRIL, IRON]));
    write_files(dir.path(), &[("a.json", a.as_str()), ("b.json", b.as_str())]);

    let schema = game_schema().unwrap();
    let err = DataLoader::new(&schema)
        .unwrap()
        .load_dir(dir.path())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateInstanceId { .. }));
    let context = err.context.unwrap();
    assert_eq!(context.instance.as_deref(), Some("iron"));
    assert!(context.source.unwrap().ends_with("b.json"));
}

// =============================================================================
// Discovery
// =============================================================================

#[test]
fn data_files_are_sorted_and_filtered() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[
            ("z.json", "{}"),
            ("nested/b.json", "{}"),
            ("a.json", "{}"),
            ("notes.txt", "ignored"),
        ],
    );
    let files: Vec<_> = data_files(dir.path())
        .unwrap()
        .into_iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();
    let names: Vec<_> = files.iter().map(|p| p.to_string_lossy().into_owned()).collect();
    assert_eq!(names, vec!["a.json", "nested/b.json", "z.json"]);
}

#[test]
fn unparsable_file_names_its_path() {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &[("broken.json", "{\"currencies\": [")]);
    let schema = game_schema().unwrap();
    let err = DataLoader::new(&schema)
        .unwrap()
        .load_dir(dir.path())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Parse(_)));
    assert!(err.to_string().contains("broken.json"));
}
