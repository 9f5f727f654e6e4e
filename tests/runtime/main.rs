//! Integration tests for Layer 3: Runtime
//!
//! Tests for data loading, both emitters, the generation pipeline, and
//! snapshots.

mod emitters;
mod loader;
mod pipeline;

use std::fs;
use std::path::Path;

/// Writes `files` (relative path, contents) below `dir`.
pub fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (relative, contents) in files {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
}

/// A small but complete data set.
pub const GAME_DATA: &[(&str, &str)] = &[
    (
        "currencies.json",
        r#"{"currencies": [{"id": "gold", "name": "Gold", "ticker": "GLD"}]}"#,
    ),
    (
        "heroes/heroes.json",
        r#"{
            "hero_ladder": [{"id": "default", "levels": [{"experience": 100}, {"experience": 300}]}],
            "heroes": [{
                "id": "knight",
                "name": "Knight",
                "description": "Holds the line",
                "ladder": "hero_ladder_data/default",
                "affinity": "affinity_data/earth",
                "klass": "hero_class_data/warrior",
                "slots": [],
                "skills": ["skill_data/slash"],
                "quality": "quality_data/common"
            }]
        }"#,
    ),
    (
        "heroes/traits.json",
        r#"{
            "affinity": [{"id": "earth", "name": "Earth", "description": "steady"}],
            "hero_class": [{"id": "warrior", "name": "Warrior", "description": "melee"}],
            "quality": [{"id": "common", "name": "Common"}],
            "skills": [{"id": "slash", "name": "Slash"}]
        }"#,
    ),
    (
        "materials.json",
        r#"{"upgrade_materials": [
            {"id": "scroll", "type": "hero_upgrade_material", "name": "Scroll", "value": 10, "description": "xp"}
        ]}"#,
    ),
];
