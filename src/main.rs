//! lsif-index - CLI for the LSIF graph indexer
//!
//! Indexes a compiled-program snapshot into an LSIF dump.
//!
//! # Usage
//!
//! ```bash
//! # Dump to stdout
//! lsif-index program.json --project-root /path/to/project
//!
//! # Dump to a file, without embedded file contents
//! lsif-index program.json --project-root /path/to/project \
//!     --no-contents --output dump.lsif
//! ```
//!
//! The snapshot is the flattened view of a compiled program (files, syntax
//! nodes, symbols, types) that a compiler front-end exports; see
//! `lsif_index::ProgramSnapshot` for the schema. Errors go to stderr, the
//! dump to stdout or `--output`. Exit codes: 0 = success, 1 = error.

use anyhow::{Context, Result};
use clap::Parser;
use lsif_index::{
    DependentProject, IndexerOptions, JsonLineEmitter, ProgramSnapshot, index_program,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lsif-index")]
#[command(version)]
#[command(about = "Emit an LSIF dump for a compiled-program snapshot")]
struct Cli {
    /// Snapshot of the compiled program (JSON)
    snapshot: PathBuf,

    /// Absolute root directory of the project
    #[arg(long)]
    project_root: PathBuf,

    /// Project configuration file; relative rootDir/outDir values resolve
    /// against its directory
    #[arg(long)]
    config_file: Option<PathBuf>,

    /// Do not embed file contents in document vertices
    #[arg(long)]
    no_contents: bool,

    /// Dependent projects as JSON ({"rootDir": ..., "outDir": ...} entries)
    #[arg(long)]
    dependents: Option<PathBuf>,

    /// Write the dump here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logging goes to stderr so a stdout dump stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let snapshot = ProgramSnapshot::from_json_file(&cli.snapshot)?;
    let dependents = load_dependents(cli)?;
    let options = IndexerOptions {
        project_root: cli.project_root.clone(),
        no_contents: cli.no_contents,
        config_file: cli.config_file.clone(),
    };

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut emitter = JsonLineEmitter::new(BufWriter::new(file));
            index_program(&snapshot, &options, &dependents, &mut emitter)?;
            emitter.finish()?;
        }
        None => {
            let stdout = std::io::stdout().lock();
            let mut emitter = JsonLineEmitter::new(BufWriter::new(stdout));
            index_program(&snapshot, &options, &dependents, &mut emitter)?;
            emitter.finish()?;
        }
    }
    Ok(())
}

fn load_dependents(cli: &Cli) -> Result<Vec<DependentProject>> {
    let Some(path) = &cli.dependents else {
        return Ok(Vec::new());
    };
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read dependents file {}", path.display()))?;
    serde_json::from_slice(&data)
        .with_context(|| format!("Failed to parse dependents file {}", path.display()))
}
