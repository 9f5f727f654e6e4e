//! Configuration for a generation run.

use std::path::{Path, PathBuf};

use modelgen_foundation::{Error, Result};

/// Inputs and outputs of one generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateConfig {
    /// Namespace of the generated object-language classes.
    pub project_name: String,

    /// Directory searched recursively for `*.json` data files.
    pub data_dir: PathBuf,

    /// Output root of the object-language classes.
    pub out_dir: PathBuf,

    /// Output root of the contracts.
    pub contract_out_dir: PathBuf,

    /// Where to write a model snapshot, if anywhere.
    pub snapshot: Option<PathBuf>,

    /// Validate only; write nothing.
    pub dry_run: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            project_name: "AlienCell".to_string(),
            data_dir: PathBuf::from("data"),
            out_dir: PathBuf::from("generated/csharp"),
            contract_out_dir: PathBuf::from("generated/contracts"),
            snapshot: None,
            dry_run: false,
        }
    }
}

impl GenerateConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the project name.
    #[must_use]
    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    /// Builder method to set the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Builder method to set the object-language output directory.
    #[must_use]
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    /// Builder method to set the contract output directory.
    #[must_use]
    pub fn with_contract_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.contract_out_dir = dir.into();
        self
    }

    /// Builder method to set the snapshot path.
    #[must_use]
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    /// Builder method to set dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Checks that the output locations cannot clobber each other.
    ///
    /// Each output root is replaced wholesale, so the two roots must be
    /// disjoint and the snapshot must live outside both.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the overlapping paths.
    pub fn validate(&self) -> Result<()> {
        if overlaps(&self.out_dir, &self.contract_out_dir) {
            return Err(Error::invalid_config(format!(
                "output directories {} and {} overlap",
                self.out_dir.display(),
                self.contract_out_dir.display()
            )));
        }
        if let Some(snapshot) = &self.snapshot {
            for root in [&self.out_dir, &self.contract_out_dir] {
                if snapshot.starts_with(root) {
                    return Err(Error::invalid_config(format!(
                        "snapshot {} is inside output directory {}",
                        snapshot.display(),
                        root.display()
                    )));
                }
            }
        }
        Ok(())
    }
}

fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}
