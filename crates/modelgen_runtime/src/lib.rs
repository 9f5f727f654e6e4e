//! Data loading, emitters, snapshots, and CLI for modelgen.
//!
//! This crate provides:
//! - [`rpg::game_schema`] - The built-in game schema
//! - [`DataLoader`] - JSON data files into a sealed instance registry
//! - [`CSharpEmitter`] and [`ContractEmitter`] - The two generation targets
//! - [`ModelSnapshot`] - `MessagePack` summaries of a resolved model
//! - [`pipeline::run`] - The end-to-end generation run behind the CLI

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod emit;
pub mod loader;
pub mod pipeline;
pub mod rpg;
pub mod serialize;

pub use config::GenerateConfig;
pub use emit::{CSharpEmitter, ContractEmitter, Emitter, OutputTree, SourceBuilder, StagedTree};
pub use loader::{DataLoader, data_files};
pub use pipeline::{GenerateReport, RenderedTarget, run};
pub use serialize::{ModelSnapshot, load_from_file, save_to_file};
