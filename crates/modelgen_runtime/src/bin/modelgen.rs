//! Modelgen CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use modelgen_runtime::{GenerateConfig, pipeline};
use tracing::info;

/// Command line arguments. Each flag maps onto a [`GenerateConfig`] field.
#[derive(Parser, Debug)]
#[command(name = "modelgen", version)]
#[command(about = "Generate C# classes and Solidity contracts from game data")]
struct Args {
    /// Directory searched recursively for `*.json` data files
    #[arg(long, value_name = "DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Namespace of the generated C# classes
    #[arg(long, value_name = "NAME", default_value = "AlienCell")]
    project_name: String,

    /// Output directory of the C# classes
    #[arg(long, value_name = "DIR", default_value = "generated/csharp")]
    out_dir: PathBuf,

    /// Output directory of the Solidity contracts
    #[arg(long, value_name = "DIR", default_value = "generated/contracts")]
    contract_out_dir: PathBuf,

    /// Write a MessagePack model snapshot to FILE
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Validate data and schema without writing output
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> GenerateConfig {
        let config = GenerateConfig::new()
            .with_data_dir(self.data_dir)
            .with_project_name(self.project_name)
            .with_out_dir(self.out_dir)
            .with_contract_out_dir(self.contract_out_dir)
            .with_dry_run(self.dry_run);
        match self.snapshot {
            Some(path) => config.with_snapshot(path),
            None => config,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_tracing(args.verbose);

    match pipeline::run(&args.into_config()) {
        Ok(report) => {
            info!(
                instances = report.instances,
                types = report.types,
                "generation finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("MODELGEN_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
