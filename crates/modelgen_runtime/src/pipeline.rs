//! The end-to-end generation run.
//!
//! Load, resolve, snapshot, emit, write. Every target is rendered in memory
//! before the first byte is written, so a failing run leaves earlier output
//! untouched.

use std::path::PathBuf;

use modelgen_engine::ResolvedModel;
use modelgen_foundation::Result;
use tracing::info;

use crate::config::GenerateConfig;
use crate::emit::{CSharpEmitter, ContractEmitter, Emitter, OutputTree, commit_all};
use crate::loader::DataLoader;
use crate::rpg::game_schema;
use crate::serialize::{self, ModelSnapshot};

/// What a run produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerateReport {
    /// Number of loaded instances.
    pub instances: usize,
    /// Number of classified entity types.
    pub types: usize,
    /// Files written per target, in emission order. Empty on a dry run.
    pub written: Vec<(&'static str, usize)>,
}

/// Loads the data directory and resolves the built-in schema against it.
///
/// # Errors
///
/// Returns the first load or resolution error.
pub fn resolve(config: &GenerateConfig) -> Result<ResolvedModel> {
    let schema = game_schema()?;
    let instances = DataLoader::new(&schema)?.load_dir(&config.data_dir)?;
    let model = ResolvedModel::build(schema, instances)?;
    info!(
        types = model.classification().len(),
        instances = model.instances().len(),
        "resolved model"
    );
    Ok(model)
}

/// One rendered target and the directory it replaces.
#[derive(Clone, Debug)]
pub struct RenderedTarget {
    /// Emitter name.
    pub name: &'static str,
    /// Output root of this target.
    pub root: PathBuf,
    /// Rendered files.
    pub tree: OutputTree,
}

/// Renders both targets.
///
/// # Errors
///
/// Returns the first emitter error.
pub fn render(config: &GenerateConfig, model: &ResolvedModel) -> Result<Vec<RenderedTarget>> {
    let emitters: [(Box<dyn Emitter>, &PathBuf); 2] = [
        (
            Box::new(CSharpEmitter::new(config.project_name.clone())),
            &config.out_dir,
        ),
        (Box::new(ContractEmitter::new()), &config.contract_out_dir),
    ];
    let mut targets = Vec::with_capacity(emitters.len());
    for (emitter, root) in &emitters {
        let tree = emitter.emit(model)?;
        info!(target = emitter.name(), files = tree.len(), "rendered target");
        targets.push(RenderedTarget {
            name: emitter.name(),
            root: (*root).clone(),
            tree,
        });
    }
    Ok(targets)
}

/// Runs a full generation.
///
/// # Errors
///
/// Returns the first error of any phase. Nothing is written unless the
/// configuration is valid and loading, resolution, and rendering all
/// succeeded. Output roots are replaced together or not at all.
pub fn run(config: &GenerateConfig) -> Result<GenerateReport> {
    config.validate()?;
    let model = resolve(config)?;
    let mut report = GenerateReport {
        instances: model.instances().len(),
        types: model.classification().len(),
        written: Vec::new(),
    };

    let targets = render(config, &model)?;

    if let Some(path) = &config.snapshot {
        serialize::save_to_file(&ModelSnapshot::capture(&model)?, path)?;
    }

    if config.dry_run {
        info!("dry run: no output written");
        return Ok(report);
    }

    let mut staged = Vec::with_capacity(targets.len());
    for target in &targets {
        match target.tree.stage(&target.root) {
            Ok(tree) => staged.push(tree),
            Err(e) => {
                for tree in &staged {
                    tree.discard();
                }
                return Err(e);
            }
        }
    }
    commit_all(staged)?;
    report.written = targets.iter().map(|t| (t.name, t.tree.len())).collect();
    Ok(report)
}
