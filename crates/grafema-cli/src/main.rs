//! Thin example binary for `grafema-orchestrator`: parses a project root,
//! drives the five fixed phases over an in-memory `GraphBackend`, and
//! prints the resulting `Manifest` plus graph node/edge counts. Building a
//! product CLI around this pipeline (persistent backend, incremental
//! re-analysis daemon, MCP front-end) is explicitly out of scope — this
//! binary exists to exercise the library end to end.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use grafema_core::issue::Severity;
use grafema_core::types::{EdgeKind, NodeKind};
use grafema_graph::InMemoryGraphBackend;
use grafema_orchestrator::{Options, Orchestrator};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "grafema")]
#[command(about = "Grafema code-as-graph analysis engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose (debug-level) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full Discovery -> Indexing -> Analysis -> Enrichment -> Validation pipeline
    Analyze {
        /// Project root to analyze
        path: PathBuf,

        /// Clear the backend and re-analyze from scratch
        #[arg(long)]
        force: bool,

        /// Stop after the Indexing phase
        #[arg(long)]
        index_only: bool,

        /// Restrict the run to these discovered service names (repeatable)
        #[arg(long = "service")]
        services: Vec<String>,
    },

    /// Run only Discovery + Indexing and print the discovered module graph
    Index {
        /// Project root to index
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(filter).unwrap())
        .init();

    let output = match &cli.command {
        Commands::Analyze { path, force, index_only, services } => {
            run_pipeline(path, *force, *index_only, services.clone()).await?
        }
        Commands::Index { path } => run_pipeline(path, false, true, Vec::new()).await?,
    };

    print_output(&cli.output, &output)?;
    Ok(())
}

async fn run_pipeline(
    path: &PathBuf,
    force: bool,
    index_only: bool,
    services: Vec<String>,
) -> Result<serde_json::Value> {
    let project_root = path.canonicalize().with_context(|| format!("project root not found: {}", path.display()))?;

    let backend = Arc::new(InMemoryGraphBackend::new());
    let orchestrator = Orchestrator::new(backend.clone());

    let service_filter = if services.is_empty() { None } else { Some(services) };
    let options = Options { service_filter, force, index_only, on_progress: None, cancellation: None };

    let manifest = orchestrator
        .run(&project_root, options)
        .await
        .context("orchestrator run failed")?;

    let node_counts = backend.count_nodes_by_type(None).await.context("failed to read node counts")?;
    let edge_counts = backend.count_edges_by_type(None).await.context("failed to read edge counts")?;

    let errors = manifest.issues.iter().filter(|i| matches!(i.severity, Severity::Error)).count();
    let warnings = manifest.issues.iter().filter(|i| matches!(i.severity, Severity::Warning)).count();

    Ok(serde_json::json!({
        "project_root": project_root.display().to_string(),
        "cancelled": manifest.cancelled,
        "services": manifest.services.iter().map(|s| s.name.clone()).collect::<Vec<_>>(),
        "node_count": backend.node_count().await.unwrap_or(0),
        "edge_count": backend.edge_count().await.unwrap_or(0),
        "nodes_by_kind": node_kind_map(&node_counts),
        "edges_by_kind": edge_kind_map(&edge_counts),
        "errors": errors,
        "warnings": warnings,
        "issues": manifest.issues,
    }))
}

fn node_kind_map(counts: &std::collections::HashMap<NodeKind, usize>) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (kind, count) in counts {
        map.insert(kind.as_str().to_string(), serde_json::json!(count));
    }
    serde_json::Value::Object(map)
}

fn edge_kind_map(counts: &std::collections::HashMap<EdgeKind, usize>) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (kind, count) in counts {
        map.insert(kind.to_string(), serde_json::json!(count));
    }
    serde_json::Value::Object(map)
}

fn print_output(format: &OutputFormat, value: &serde_json::Value) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Pretty => print_pretty(value, 0)?,
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value, indent: usize) -> Result<()> {
    let pad = "  ".repeat(indent);
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                match val {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        println!("{pad}{}:", key.cyan().bold());
                        print_pretty(val, indent + 1)?;
                    }
                    serde_json::Value::String(s) => println!("{pad}{}: {}", key.cyan().bold(), s.green()),
                    serde_json::Value::Number(n) => println!("{pad}{}: {}", key.cyan().bold(), n.to_string().yellow()),
                    serde_json::Value::Bool(b) => {
                        let colored = if *b { "true".green() } else { "false".red() };
                        println!("{pad}{}: {}", key.cyan().bold(), colored);
                    }
                    _ => println!("{pad}{}: {}", key.cyan().bold(), val),
                }
            }
        }
        serde_json::Value::Array(arr) => {
            if arr.is_empty() {
                println!("{pad}(none)");
            }
            for item in arr {
                print_pretty(item, indent)?;
                println!();
            }
        }
        other => println!("{pad}{other}"),
    }
    Ok(())
}
