//! Lineage Graph CLI
//!
//! Runs the graph pipeline over a lineage payload file:
//! 1. Loading the payload (JSON `LineageResult`) from a file or stdin
//! 2. Loading options (YAML or JSON) when given
//! 3. Generating the visualization graph, or validating the payload
//!
//! Usage:
//!   cargo run --features cli --bin lineage_cli -- graph \
//!     --payload lineage.json \
//!     --options grouping.yaml
//!
//! Examples:
//!   # Nearest generation, printed as a summary table
//!   LINEAGE_OPTIONS=nearest.yaml lineage_cli graph --payload lineage.json --format summary
//!
//!   # Integrity check, non-zero exit on blocking issues
//!   lineage_cli validate --payload lineage.json

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use lineage_graph::{generate, validate, LineageOptions, LineageResult, VisGraphOptions};

/// Lineage graph generator
#[derive(Parser, Debug)]
#[command(name = "lineage_cli")]
#[command(about = "Filter, traverse and cluster lineage payloads into visualization graphs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the visualization graph
    Graph {
        /// Lineage payload (JSON). Reads stdin when omitted
        #[arg(long, short = 'p')]
        payload: Option<PathBuf>,

        /// Options file (.yaml, .yml or .json)
        #[arg(long, short = 'o', env = "LINEAGE_OPTIONS")]
        options: Option<PathBuf>,

        /// Override the payload's seed id
        #[arg(long, short = 's')]
        seed: Option<String>,

        /// Output format
        #[arg(long, short = 'f', value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Check payload integrity
    Validate {
        /// Lineage payload (JSON). Reads stdin when omitted
        #[arg(long, short = 'p')]
        payload: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Json,
    Summary,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Graph {
            payload,
            options,
            seed,
            format,
        } => {
            let mut result = load_payload(payload.as_deref())?;
            if let Some(seed) = seed {
                result = LineageResult::new(seed, result.nodes().values().cloned());
            }
            let options = match options {
                Some(path) => load_options(&path)?,
                None => LineageOptions::default(),
            };

            let graph = generate(&result, &options)
                .with_context(|| format!("generating graph for seed '{}'", result.seed()))?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&graph)?),
                OutputFormat::Summary => print_summary(&graph),
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate { payload } => {
            let result = load_payload(payload.as_deref())?;
            let report = validate(&result);

            for issue in &report.errors {
                println!("ERROR   [{}] {}", issue.code(), issue);
            }
            for issue in &report.warnings {
                println!("WARNING [{}] {}", issue.code(), issue);
            }
            println!(
                "{} node(s), {} error(s), {} warning(s)",
                result.len(),
                report.errors.len(),
                report.warnings.len()
            );

            Ok(if report.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

// =============================================================================
// INPUT
// =============================================================================

fn load_payload(path: Option<&Path>) -> Result<LineageResult> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading payload {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading payload from stdin")?;
            text
        }
    };
    serde_json::from_str(&text).context("parsing lineage payload")
}

fn load_options(path: &Path) -> Result<LineageOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading options {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let options = if is_json {
        LineageOptions::from_json_str(&text)
    } else {
        LineageOptions::from_yaml_str(&text)
    };
    options.with_context(|| format!("loading options {}", path.display()))
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_summary(graph: &VisGraphOptions) {
    println!("{:<48} {:<10} LABEL", "ID", "KIND");
    for node in graph.nodes() {
        let kind = match node.as_combined() {
            Some(_) => "combined",
            None => "basic",
        };
        println!("{:<48} {:<10} {}", node.id(), kind, node.label());
    }
    println!();
    for edge in graph.edges() {
        println!("{} -> {}", edge.from, edge.to);
    }
    println!(
        "{} node(s), {} edge(s), {} combined",
        graph.node_count(),
        graph.edge_count(),
        graph.get_combined_nodes().len()
    );
}
