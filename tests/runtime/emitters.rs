//! Integration tests for the emitters
//!
//! Renders the shared data set through both targets.

use modelgen_engine::ResolvedModel;
use modelgen_runtime::rpg::game_schema;
use modelgen_runtime::{CSharpEmitter, ContractEmitter, DataLoader, Emitter};

use crate::{GAME_DATA, write_files};

fn model() -> ResolvedModel {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), GAME_DATA);
    let schema = game_schema().unwrap();
    let instances = DataLoader::new(&schema).unwrap().load_dir(dir.path()).unwrap();
    ResolvedModel::build(schema, instances).unwrap()
}

#[test]
fn emitters_are_deterministic() {
    let (a, b) = (model(), model());
    for emitter in [
        Box::new(ContractEmitter::new()) as Box<dyn Emitter>,
        Box::new(CSharpEmitter::new("AlienCell")),
    ] {
        assert_eq!(emitter.emit(&a).unwrap(), emitter.emit(&b).unwrap());
    }
}

#[test]
fn contract_tree_layout() {
    let tree = ContractEmitter::new().emit(&model()).unwrap();
    for path in [
        "Inventory.sol",
        "GameData.sol",
        "GameLogicBase.sol",
        "data/HeroData.sol",
        "data/HeroLadderData.sol",
        "data/CurrencyData.sol",
        "data/HeroUpgradeMaterialData.sol",
        "model/Hero.sol",
        "model/Building.sol",
        "visitors/RewardVisitor.sol",
    ] {
        assert!(tree.get(path).is_some(), "missing {path}");
    }
    assert!(tree.get("model/User.sol").is_none());
    assert!(tree.get("data/UpgradeMaterialData.sol").is_none());
}

#[test]
fn references_render_as_ordinals() {
    let tree = ContractEmitter::new().emit(&model()).unwrap();
    let hero = tree.get("data/HeroData.sol").unwrap();
    assert!(hero.contains("_hero_data.quality = uint(0);"));
    assert!(hero.contains("_hero_data.slots = get_array_1();"));
    assert!(hero.contains("_arr = new uint[](0);"));
    assert!(!hero.contains("quality_data/common"));
}

#[test]
fn token_ids_follow_catalog_order() {
    let tree = ContractEmitter::new().emit(&model()).unwrap();
    let inventory = tree.get("Inventory.sol").unwrap();
    assert!(inventory.contains("HERO_UPGRADE_MATERIAL_DATA_SCROLL = 0;"));
    assert!(inventory.contains("CURRENCY_DATA_GOLD = 1;"));
}

#[test]
fn csharp_classes_use_project_namespace() {
    let tree = CSharpEmitter::new("Demo").emit(&model()).unwrap();
    let hero = tree.get("HeroData.cs").unwrap();
    assert!(hero.contains("namespace Demo"));
    assert!(hero.contains("public HeroLadderData Ladder;"));
    assert!(hero.contains("public List<SkillData> Skills;"));
}
