//! The built-in RPG schema.
//!
//! Declares the game's read-only data catalog, its per-player models, the
//! reward struct hierarchy, and the `GameData` aggregate that data files are
//! loaded into.

use modelgen_foundation::{EntityTypeId, FieldType, LtVec, Result, Value};
use modelgen_schema::{EntitySchema, FieldSchema, ModelRegistry, RootKind};

/// Name of the aggregate catalog type.
pub const CATALOG: &str = "GameData";

/// Discriminator field of the upgrade-material union.
pub const TYPE_FIELD: &str = "type";

fn text(name: &str) -> FieldSchema {
    FieldSchema::required(name, FieldType::string())
}

fn int(name: &str) -> FieldSchema {
    FieldSchema::required(name, FieldType::int())
}

fn link(name: &str, target: EntityTypeId) -> FieldSchema {
    FieldSchema::required(name, FieldType::reference(target))
}

fn links(name: &str, target: EntityTypeId) -> FieldSchema {
    FieldSchema::required(name, FieldType::list(FieldType::reference(target)))
}

fn catalog_list(name: &str, element: EntityTypeId) -> FieldSchema {
    FieldSchema::optional(
        name,
        FieldType::list(FieldType::embedded(element)),
        Value::List(LtVec::new()),
    )
}

struct Builder {
    schema: ModelRegistry,
    base: EntityTypeId,
}

impl Builder {
    fn declare(&mut self, decl: EntitySchema) -> Result<EntityTypeId> {
        self.schema.declare(decl)
    }

    /// A concrete data type with `name` and, if `described`, `description`.
    fn data(&mut self, name: &str, described: bool) -> Result<EntityTypeId> {
        let mut decl = EntitySchema::new(name).with_parent(self.base).with_field(text("name"));
        if described {
            decl = decl.with_field(text("description"));
        }
        self.declare(decl)
    }

    /// A ladder type and its level struct, e.g. `HeroLadderData` and
    /// `HeroLevelLadderData`.
    fn ladder(&mut self, prefix: &str) -> Result<EntityTypeId> {
        let level = self.declare(
            EntitySchema::new(format!("{prefix}LevelLadderData")).with_field(int("experience")),
        )?;
        self.declare(
            EntitySchema::new(format!("{prefix}LadderData"))
                .with_parent(self.base)
                .ladder()
                .with_field(FieldSchema::required(
                    "levels",
                    FieldType::list(FieldType::embedded(level)),
                )),
        )
    }

    fn upgrade_material(&mut self, parent: EntityTypeId, target: &str) -> Result<EntityTypeId> {
        let tag = format!("{}_upgrade_material", target.to_ascii_lowercase());
        self.declare(
            EntitySchema::new(format!("{target}UpgradeMaterialData"))
                .with_parent(parent)
                .upgrade_material(target)
                .with_field(FieldSchema::constant(
                    TYPE_FIELD,
                    FieldType::string(),
                    Value::string(tag),
                )),
        )
    }
}

/// Declares the built-in game schema.
///
/// # Errors
///
/// Returns an error only if the declarations are inconsistent.
pub fn game_schema() -> Result<ModelRegistry> {
    let mut schema = ModelRegistry::new();
    let base = schema.declare(
        EntitySchema::new("BaseData")
            .as_abstract()
            .with_root(RootKind::DataCatalog)
            .with_field(text("id")),
    )?;
    let mut b = Builder { schema, base };

    // Catalog data
    let currency = b.declare(
        EntitySchema::new("CurrencyData")
            .with_parent(base)
            .tokenized()
            .with_field(text("name"))
            .with_field(text("ticker")),
    )?;
    let achievement = b.data("AchievementData", true)?;
    let affinity = b.data("AffinityData", true)?;
    let quality = b.data("QualityData", false)?;
    let faction = b.data("FactionData", true)?;
    let building = b.data("BuildingData", true)?;
    let hero_skin = b.data("HeroSkinData", true)?;
    let hero_class = b.data("HeroClassData", true)?;
    let hero_ladder = b.ladder("Hero")?;
    let hero_slot = b.data("HeroWeaponSlotData", false)?;
    let skill = b.data("SkillData", false)?;
    let hero = b.declare(
        EntitySchema::new("HeroData")
            .with_parent(base)
            .with_field(text("name"))
            .with_field(text("description"))
            .with_field(link("ladder", hero_ladder))
            .with_field(link("affinity", affinity))
            .with_field(link("klass", hero_class))
            .with_field(links("slots", hero_slot))
            .with_field(links("skills", skill))
            .with_field(link("quality", quality)),
    )?;
    let weapon_ladder = b.ladder("Weapon")?;
    let weapon = b.declare(
        EntitySchema::new("WeaponData")
            .with_parent(base)
            .with_field(text("name"))
            .with_field(text("description"))
            .with_field(link("ladder", weapon_ladder)),
    )?;
    let artifact_ladder = b.ladder("Artifact")?;
    let artifact = b.declare(
        EntitySchema::new("ArtifactData")
            .with_parent(base)
            .with_field(text("name"))
            .with_field(text("description"))
            .with_field(link("ladder", artifact_ladder)),
    )?;
    let expedition = b.data("ExpeditionData", true)?;

    // Upgrade materials share a union in the catalog, told apart by `type`.
    let material = b.declare(
        EntitySchema::new("UpgradeMaterialData")
            .with_parent(base)
            .as_abstract()
            .with_field(text("name"))
            .with_field(int("value"))
            .with_field(text("description")),
    )?;
    b.upgrade_material(material, "Hero")?;
    b.upgrade_material(material, "Weapon")?;
    b.upgrade_material(material, "Artifact")?;

    // Per-player models
    let model = b.declare(
        EntitySchema::new("DataModel")
            .as_abstract()
            .with_root(RootKind::Model),
    )?;
    let upgradeable = b.declare(
        EntitySchema::new("Upgradeable")
            .with_parent(model)
            .as_abstract()
            .with_field(int("level")),
    )?;
    let with_exp = b.declare(
        EntitySchema::new("UpgradeableWithExp")
            .with_parent(model)
            .as_abstract()
            .with_field(FieldSchema::optional("exp", FieldType::int(), Value::Int(0)))
            .with_field(FieldSchema::optional("level", FieldType::int(), Value::Int(0))),
    )?;
    b.declare(
        EntitySchema::new("SkillModel")
            .with_parent(upgradeable)
            .with_field(link("data", skill)),
    )?;
    let hero_model = b.declare(
        EntitySchema::new("HeroModel")
            .with_parent(with_exp)
            .nft()
            .with_field(link("data", hero)),
    )?;
    let weapon_model = b.declare(
        EntitySchema::new("WeaponModel")
            .with_parent(with_exp)
            .nft()
            .with_field(link("data", weapon)),
    )?;
    let artifact_model = b.declare(
        EntitySchema::new("ArtifactModel")
            .with_parent(with_exp)
            .nft()
            .with_field(link("data", artifact)),
    )?;
    let building_model = b.declare(
        EntitySchema::new("BuildingModel")
            .with_parent(upgradeable)
            .nft()
            .with_field(link("data", building)),
    )?;
    b.declare(
        EntitySchema::new("UserModel")
            .with_field(int("exp"))
            .with_field(int("level"))
            .with_field(FieldSchema::required(
                "buildings",
                FieldType::list(FieldType::embedded(building_model)),
            ))
            .with_field(FieldSchema::required(
                "heroes",
                FieldType::list(FieldType::embedded(hero_model)),
            ))
            .with_field(FieldSchema::required(
                "weapons",
                FieldType::list(FieldType::embedded(weapon_model)),
            ))
            .with_field(FieldSchema::required(
                "artifacts",
                FieldType::list(FieldType::embedded(artifact_model)),
            )),
    )?;

    // Rewards
    let reward = b.declare(EntitySchema::new("RewardBase").polymorphic_base())?;
    for (name, field, target) in [
        ("RewardHero", "hero", hero),
        ("RewardWeapon", "weapon", weapon),
        ("RewardArtifact", "artifact", artifact),
    ] {
        b.declare(
            EntitySchema::new(name)
                .with_parent(reward)
                .with_field(link(field, target))
                .with_field(int("amount")),
        )?;
    }

    // The aggregate every data file is merged into
    b.declare(
        EntitySchema::new(CATALOG)
            .with_root(RootKind::Catalog)
            .with_field(catalog_list("upgrade_materials", material))
            .with_field(catalog_list("currencies", currency))
            .with_field(catalog_list("buildings", building))
            .with_field(catalog_list("quality", quality))
            .with_field(catalog_list("affinity", affinity))
            .with_field(catalog_list("factions", faction))
            .with_field(catalog_list("hero_class", hero_class))
            .with_field(catalog_list("hero_slots", hero_slot))
            .with_field(catalog_list("hero_skins", hero_skin))
            .with_field(catalog_list("artifacts", artifact))
            .with_field(catalog_list("artifact_ladder", artifact_ladder))
            .with_field(catalog_list("heroes", hero))
            .with_field(catalog_list("hero_ladder", hero_ladder))
            .with_field(catalog_list("weapons", weapon))
            .with_field(catalog_list("weapon_ladder", weapon_ladder))
            .with_field(catalog_list("achievements", achievement))
            .with_field(catalog_list("expeditions", expedition))
            .with_field(catalog_list("skills", skill)),
    )?;

    b.schema.validate()?;
    Ok(b.schema)
}
