//! atomshift: hierarchical mean-shift clustering of atom dumps
//!
//! One invocation is one request: progress goes to stderr, the single JSON
//! response line to stdout, so a host process can drive this binary over
//! the process boundary.

mod artifacts;
mod dump;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use atomshift_core::{ClusteringParams, ClusteringResponse, HierarchyController};
use clap::{Parser, Subcommand};
use console::style;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use artifacts::ArtifactWriter;

#[derive(Parser)]
#[command(name = "atomshift", version, about = "Hierarchical quality-gated mean-shift clustering for atom dumps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one clustering invocation from a JSON request
    Run {
        /// Request parameters as a JSON string
        params: Option<String>,
        /// Read the JSON request from a file instead
        #[arg(short, long, conflicts_with = "params")]
        file: Option<PathBuf>,
        /// Pretty-print the response
        #[arg(long)]
        pretty: bool,
    },
    /// Parse a dump and print a human-readable summary
    Inspect {
        /// Path to the atom dump
        dump: PathBuf,
    },
    /// Report engine version and build capabilities as JSON
    Check,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atomshift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { params, file, pretty } => run_command(params, file, pretty),
        Commands::Inspect { dump } => inspect_command(&dump),
        Commands::Check => check_command(),
    }
}

/// Setup failures (no usable request) exit non-zero; anything that fails
/// after a request exists is reported through the response payload with a
/// zero exit, so the host can always parse stdout.
fn run_command(params: Option<String>, file: Option<PathBuf>, pretty: bool) -> ExitCode {
    let params = match load_params(params, file) {
        Ok(params) => params,
        Err(e) => {
            tracing::error!("{e:#}");
            emit(&ClusteringResponse::failure(format!("{e:#}")), pretty);
            return ExitCode::from(2);
        }
    };

    let response = match execute(&params) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("clustering failed: {e}");
            ClusteringResponse::failure(format!("clustering failed: {e}"))
        }
    };
    emit(&response, pretty);
    ExitCode::SUCCESS
}

/// Construct the request from the argument or file
fn load_params(params: Option<String>, file: Option<PathBuf>) -> anyhow::Result<ClusteringParams> {
    let text = match (params, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read request file '{}'", path.display()))?,
        (None, None) => anyhow::bail!("no request given: pass a JSON string or --file"),
    };
    serde_json::from_str(&text).context("malformed request JSON")
}

/// Parse, cluster, write artifacts, assemble the response
fn execute(params: &ClusteringParams) -> atomshift_core::Result<ClusteringResponse> {
    params.validate()?;

    let snapshot = dump::read_dump(&params.input_file)?;
    tracing::info!(
        atoms = snapshot.points.len(),
        timestep = snapshot.timestep,
        "dump loaded"
    );

    let controller = HierarchyController::new(params.clone())?;
    let result = controller.run(&snapshot.points)?;

    let writer = ArtifactWriter::new(&params.output_dir, &snapshot)?;
    let written = writer.write_all(&result)?;
    if params.limpiar_intermedios {
        writer.remove_intermediates(&written)?;
    }

    let response = ClusteringResponse::success(result.records());
    writer.write_summary(&response)?;
    Ok(response)
}

fn emit(response: &ClusteringResponse, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    };
    match json {
        Ok(text) => println!("{text}"),
        Err(e) => {
            // stdout must stay parseable for the host
            println!(
                "{{\"success\":false,\"message\":\"response serialization failed: {e}\",\"clusters_found\":0,\"total_atoms\":0,\"clusters_info\":[]}}"
            );
        }
    }
}

fn inspect_command(path: &Path) -> ExitCode {
    let snapshot = match dump::read_dump(path) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("{} {e}", style("error:").red().bold());
            return ExitCode::FAILURE;
        }
    };

    let points = &snapshot.points;
    let mut species: Vec<u32> = (0..points.len()).map(|i| points.species(i)).collect();
    species.sort_unstable();
    species.dedup();

    println!("{}", style(path.display()).bold());
    println!("  timestep:  {}", snapshot.timestep);
    println!("  atoms:     {}", points.len());
    println!("  dims:      {}", points.dim());
    println!("  species:   {}", species.len());
    for (axis, (lo, hi)) in ["x", "y", "z"].iter().zip(&snapshot.box_bounds) {
        println!("  box {axis}:     [{lo}, {hi}]");
    }
    ExitCode::SUCCESS
}

fn check_command() -> ExitCode {
    #[derive(Serialize)]
    struct EngineStatus {
        version: String,
        engine_ok: bool,
        missing_components: Vec<String>,
    }

    let status = EngineStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine_ok: true,
        missing_components: Vec::new(),
    };
    match serde_json::to_string_pretty(&status) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {e}", style("error:").red().bold());
            ExitCode::FAILURE
        }
    }
}
