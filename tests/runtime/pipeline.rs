//! Integration tests for the generation pipeline and snapshots

use std::fs;

use modelgen_engine::Category;
use modelgen_runtime::{GenerateConfig, load_from_file, run};

use crate::{GAME_DATA, write_files};

fn config(root: &std::path::Path) -> GenerateConfig {
    write_files(&root.join("data"), GAME_DATA);
    GenerateConfig::new()
        .with_data_dir(root.join("data"))
        .with_out_dir(root.join("out/csharp"))
        .with_contract_out_dir(root.join("out/contracts"))
}

#[test]
fn full_run_writes_both_trees_and_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path()).with_snapshot(dir.path().join("model.msgpack"));
    let report = run(&config).unwrap();
    assert_eq!(report.instances, 8);

    let hero = fs::read_to_string(dir.path().join("out/contracts/model/Hero.sol")).unwrap();
    assert!(hero.starts_with("// contracts/generated/model/Hero.sol\n"));
    assert!(dir.path().join("out/csharp/UserModel.cs").exists());

    let snapshot = load_from_file(dir.path().join("model.msgpack")).unwrap();
    assert_eq!(snapshot.get("HeroModel").unwrap().category, Category::Model);
    let tokens: Vec<_> = snapshot.tokens.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(tokens, vec!["scroll", "gold"]);
}

#[test]
fn rerun_replaces_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    run(&config).unwrap();
    fs::write(dir.path().join("out/contracts/Stale.sol"), "stale").unwrap();

    run(&config).unwrap();
    assert!(!dir.path().join("out/contracts/Stale.sol").exists());
    assert!(dir.path().join("out/contracts/Inventory.sol").exists());
}

#[test]
fn dry_run_validates_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path()).with_dry_run(true);
    let report = run(&config).unwrap();
    assert!(report.written.is_empty());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn dangling_reference_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    write_files(
        &dir.path().join("data"),
        &[(
            "extra.json",
            r#"{"weapon_ladder": [], "weapons": [{"id": "axe", "name": "Axe", "description": "heavy", "ladder": "weapon_ladder_data/none"}]}"#,
        )],
    );
    let err = run(&config).unwrap_err();
    assert!(err.to_string().contains("weapon_ladder_data/none"));
    assert!(!dir.path().join("out").exists());
}
