//! Code emitters and atomic output.
//!
//! Emitters are thin: they read a [`ResolvedModel`] and render an in-memory
//! [`OutputTree`]. Nothing touches the filesystem until every emitter has
//! succeeded. Each tree is then staged next to its destination, and the
//! staged trees are renamed into place together by [`commit_all`].

pub mod contract;
pub mod csharp;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use modelgen_engine::ResolvedModel;
use modelgen_foundation::{Error, ErrorContext, ErrorKind, Result};
use tracing::{debug, info};

pub use contract::ContractEmitter;
pub use csharp::CSharpEmitter;

/// Renders generated sources from a resolved model.
pub trait Emitter {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Renders every file of this target.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is missing something the target needs.
    fn emit(&self, model: &ResolvedModel) -> Result<OutputTree>;
}

// =============================================================================
// Output Tree
// =============================================================================

/// Generated files keyed by path relative to the output root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputTree {
    files: BTreeMap<PathBuf, String>,
}

impl OutputTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file.
    ///
    /// # Errors
    ///
    /// Returns an internal error for absolute paths, paths leaving the root,
    /// and paths added twice.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: String) -> Result<()> {
        let path = path.into();
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(Error::internal(format!(
                "output path {} must be relative and stay inside the output root",
                path.display()
            )));
        }
        if self.files.contains_key(&path) {
            return Err(Error::internal(format!("output path {} emitted twice", path.display())));
        }
        self.files.insert(path, contents);
        Ok(())
    }

    /// Contents of a file.
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    /// Files in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().map(|(p, c)| (p.as_path(), c.as_str()))
    }

    /// Returns the number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes the tree to `root`, replacing whatever was there.
    ///
    /// Files are written into a staging directory beside `root` first; the
    /// previous contents of `root` are only removed once staging succeeded.
    ///
    /// # Errors
    ///
    /// Returns `Io` with the failing path attached.
    pub fn write_atomic(&self, root: &Path) -> Result<()> {
        commit_all(vec![self.stage(root)?])
    }

    /// Writes the tree into a staging directory beside `root` without
    /// touching `root` itself.
    ///
    /// # Errors
    ///
    /// Returns `Io` with the failing path attached. A partially written
    /// staging directory is removed.
    pub fn stage(&self, root: &Path) -> Result<StagedTree> {
        let staging = sibling(root, "staging")?;
        let backup = sibling(root, "previous")?;
        remove_if_exists(&staging)?;
        remove_if_exists(&backup)?;

        if let Err(e) = self.write_all(&staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }
        Ok(StagedTree {
            root: root.to_path_buf(),
            staging,
            backup,
            had_previous: false,
            files: self.len(),
        })
    }

    fn write_all(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| io_error(&e, dir))?;
        for (relative, contents) in &self.files {
            let path = dir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| io_error(&e, parent))?;
            }
            fs::write(&path, contents).map_err(|e| io_error(&e, &path))?;
            debug!(path = %relative.display(), bytes = contents.len(), "staged file");
        }
        Ok(())
    }
}

// =============================================================================
// Staged Output
// =============================================================================

/// An output tree written next to its destination, waiting to be swapped in.
#[derive(Debug)]
pub struct StagedTree {
    root: PathBuf,
    staging: PathBuf,
    backup: PathBuf,
    had_previous: bool,
    files: usize,
}

impl StagedTree {
    /// The destination this tree replaces.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Moves the current root aside and the staged tree into its place.
    fn swap_in(&mut self) -> Result<()> {
        self.had_previous = self.root.exists();
        if self.had_previous {
            fs::rename(&self.root, &self.backup).map_err(|e| io_error(&e, &self.root))?;
        }
        if let Err(e) = fs::rename(&self.staging, &self.root) {
            if self.had_previous {
                let _ = fs::rename(&self.backup, &self.root);
            }
            return Err(io_error(&e, &self.root));
        }
        Ok(())
    }

    /// Undoes a successful [`swap_in`](Self::swap_in).
    fn roll_back(&self) {
        let _ = fs::remove_dir_all(&self.root);
        if self.had_previous {
            let _ = fs::rename(&self.backup, &self.root);
        }
    }

    /// Removes the staging directory; the root is left untouched.
    pub fn discard(&self) {
        let _ = fs::remove_dir_all(&self.staging);
    }

    fn finish(self) -> Result<()> {
        remove_if_exists(&self.backup)?;
        info!(root = %self.root.display(), files = self.files, "wrote output tree");
        Ok(())
    }
}

/// Swaps every staged tree into place, or none of them.
///
/// If any swap fails, trees already swapped are restored to their previous
/// contents and the remaining staging directories are removed.
///
/// # Errors
///
/// Returns the `Io` error of the failing swap.
pub fn commit_all(mut staged: Vec<StagedTree>) -> Result<()> {
    for i in 0..staged.len() {
        if let Err(e) = staged[i].swap_in() {
            for done in staged[..i].iter().rev() {
                done.roll_back();
            }
            for pending in &staged[i..] {
                pending.discard();
            }
            return Err(e);
        }
    }
    for tree in staged {
        tree.finish()?;
    }
    Ok(())
}

fn sibling(root: &Path, suffix: &str) -> Result<PathBuf> {
    let name = root
        .file_name()
        .ok_or_else(|| Error::internal(format!("output root {} has no file name", root.display())))?;
    let mut sibling = name.to_os_string();
    sibling.push(format!(".modelgen-{suffix}"));
    Ok(root.with_file_name(sibling))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(io_error(&e, path)),
        _ => Ok(()),
    }
}

pub(crate) fn io_error(e: &io::Error, path: &Path) -> Error {
    Error::new(ErrorKind::Io(e.to_string()))
        .with_context(ErrorContext::new().with_source(path.display().to_string()))
}

// =============================================================================
// Source Builder
// =============================================================================

/// Line-oriented source text with block indentation.
#[derive(Clone, Debug, Default)]
pub struct SourceBuilder {
    text: String,
    depth: usize,
}

impl SourceBuilder {
    const INDENT: &'static str = "    ";

    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one line at the current depth.
    pub fn line(&mut self, line: impl AsRef<str>) -> &mut Self {
        let line = line.as_ref();
        if !line.is_empty() {
            for _ in 0..self.depth {
                self.text.push_str(Self::INDENT);
            }
            self.text.push_str(line);
        }
        self.text.push('\n');
        self
    }

    /// Appends an empty line.
    pub fn blank(&mut self) -> &mut Self {
        self.text.push('\n');
        self
    }

    /// Appends `line` and indents what follows.
    pub fn open(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.line(line);
        self.depth += 1;
        self
    }

    /// Dedents and appends `line`.
    pub fn close(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.line(line)
    }

    /// Returns the text.
    #[must_use]
    pub fn finish(self) -> String {
        self.text
    }
}
