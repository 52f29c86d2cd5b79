//! Node rig command-line tools.
//!
//! Provides the `noderig` binary, which loads a JSON document of node
//! graphs into an in-memory host and runs the rewrite machinery over it:
//!
//! - `process`: replay the document through the dispatcher until the
//!   rewrites settle, then print the resulting document.
//! - `locate`: print the estimated canvas position of one socket.
//! - `fit`: fit node widths to their collapsed state.
//! - `match-interface`: mirror a parent graph's inputs in the interface of
//!   the graph a group node instances.
//!
//! Configuration comes from `NODERIG_CONFIG` / `NODERIG_DEFER_TICKS`;
//! command-line flags override both. Logs go to stderr so stdout stays
//! machine-readable.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use noderig_core::{GraphHost, HostGraph, InMemoryHost, NodeId, SocketDirection};
use noderig_dispatch::{DispatchConfig, DispatchError, Driver, HandlerRegistry};
use noderig_rewrite::{fit_widths, locate, match_group_interface};

/// Node graph rewrite tools.
#[derive(Parser)]
#[command(name = "noderig", about = "Node graph rewrite tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run the rewrite handlers over a document until it settles.
    Process {
        /// Path to the input document.
        #[arg(short, long)]
        input: PathBuf,

        /// Write the result here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (default: $NODERIG_CONFIG).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host cycles between a change and its rewrite.
        #[arg(long)]
        defer_ticks: Option<u64>,

        /// Give up after this many host cycles.
        #[arg(long)]
        max_cycles: Option<usize>,

        /// Handlers to disable, by name.
        #[arg(long = "disable")]
        disabled: Vec<String>,
    },

    /// Print the estimated canvas position of a socket.
    Locate {
        /// Path to the input document.
        #[arg(short, long)]
        input: PathBuf,

        /// Graph name.
        #[arg(short, long)]
        graph: String,

        /// Node index within the graph.
        #[arg(short, long)]
        node: u32,

        /// Socket name.
        #[arg(short, long)]
        socket: String,

        /// Socket side: input or output.
        #[arg(short, long, default_value = "input")]
        direction: String,
    },

    /// Fit every node of a graph to its minimum or default width.
    Fit {
        /// Path to the input document.
        #[arg(short, long)]
        input: PathBuf,

        /// Graph name.
        #[arg(short, long)]
        graph: String,

        /// Write the result here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Match an instanced graph's interface to the inputs feeding its group node.
    MatchInterface {
        /// Path to the input document.
        #[arg(short, long)]
        input: PathBuf,

        /// Graph holding the group node.
        #[arg(short, long)]
        graph: String,

        /// Index of the group node within that graph.
        #[arg(short, long)]
        node: u32,

        /// Write the result here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Process {
            input,
            output,
            config,
            defer_ticks,
            max_cycles,
            disabled,
        } => run_process(
            &input,
            output.as_deref(),
            config.as_deref(),
            defer_ticks,
            max_cycles,
            &disabled,
        ),
        Commands::Locate {
            input,
            graph,
            node,
            socket,
            direction,
        } => run_locate(&input, &graph, NodeId(node), &socket, &direction),
        Commands::Fit {
            input,
            graph,
            output,
        } => run_fit(&input, &graph, output.as_deref()),
        Commands::MatchInterface {
            input,
            graph,
            node,
            output,
        } => run_match_interface(&input, &graph, NodeId(node), output.as_deref()),
    };
    process::exit(exit_code);
}

/// Execute the process subcommand.
///
/// Returns exit code: 0 = success, 1 = invalid input or config,
/// 2 = rewrites did not settle, 3 = I/O error.
fn run_process(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    defer_ticks: Option<u64>,
    max_cycles: Option<usize>,
    disabled: &[String],
) -> i32 {
    let host = match load_host(input) {
        Ok(host) => host,
        Err(code) => return code,
    };

    let loaded = match config_path {
        Some(path) => DispatchConfig::load(path),
        None => DispatchConfig::from_env(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(DispatchError::ConfigIo { path, source }) => {
            eprintln!("Error: failed to read config '{}': {}", path.display(), source);
            return 3;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Some(ticks) = defer_ticks {
        config.defer_ticks = ticks;
    }
    if let Some(cycles) = max_cycles {
        config.max_cycles = cycles;
    }
    for name in disabled {
        config.set_enabled(name, false);
    }

    let registry = HandlerRegistry::with_default_handlers(config);
    let mut driver = Driver::new(host, registry);
    let code = match driver.settle() {
        Ok(report) => {
            for task in report.failed() {
                eprintln!("Warning: {} failed on '{}'", task.handler, task.graph);
            }
            tracing::info!(
                cycles = report.cycles,
                applied = report.applied(),
                "processed {}",
                input.display()
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            2
        }
    };

    match write_host(&driver.into_host(), output) {
        Ok(()) => code,
        Err(io_code) => io_code,
    }
}

/// Execute the locate subcommand.
///
/// Returns exit code: 0 = success, 1 = unknown graph, node, socket or
/// direction, 3 = I/O error.
fn run_locate(input: &Path, graph_name: &str, node: NodeId, socket: &str, direction: &str) -> i32 {
    let direction = match parse_direction(direction) {
        Ok(direction) => direction,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return 1;
        }
    };
    let host = match load_host(input) {
        Ok(host) => host,
        Err(code) => return code,
    };
    let Some(graph) = host.graph(graph_name) else {
        eprintln!("Error: no graph named '{}'", graph_name);
        return 1;
    };
    let Some(node_ref) = graph.node(node) else {
        eprintln!("Error: graph '{}' has no node {}", graph_name, node);
        return 1;
    };

    match locate(node_ref, socket, direction) {
        Some(at) => {
            let json = serde_json::to_string_pretty(&at).unwrap_or_else(|e| {
                format!("{{\"error\": \"failed to serialize location: {}\"}}", e)
            });
            println!("{}", json);
            0
        }
        None => {
            eprintln!(
                "Error: {} socket '{}' of node {} is not drawn",
                direction, socket, node
            );
            1
        }
    }
}

/// Execute the fit subcommand.
///
/// Returns exit code: 0 = success, 1 = unknown graph, 3 = I/O error.
fn run_fit(input: &Path, graph_name: &str, output: Option<&Path>) -> i32 {
    let mut host = match load_host(input) {
        Ok(host) => host,
        Err(code) => return code,
    };
    let Some(graph) = host.graph_mut(graph_name) else {
        eprintln!("Error: no graph named '{}'", graph_name);
        return 1;
    };
    let nodes = graph.node_ids();
    let resized = fit_widths(graph, &nodes);
    tracing::info!(graph = graph_name, resized, "fitted node widths");

    match write_host(&host, output) {
        Ok(()) => 0,
        Err(code) => code,
    }
}

/// Execute the match-interface subcommand.
///
/// Returns exit code: 0 = success, 1 = unknown graph or node, or not a
/// group node, 3 = I/O error.
fn run_match_interface(
    input: &Path,
    graph_name: &str,
    node: NodeId,
    output: Option<&Path>,
) -> i32 {
    let mut host = match load_host(input) {
        Ok(host) => host,
        Err(code) => return code,
    };
    match match_group_interface(&mut host, graph_name, node) {
        Ok(summary) => tracing::info!(
            graph = graph_name,
            node = %node,
            items = summary.interface_items_changed,
            "matched group interface"
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    match write_host(&host, output) {
        Ok(()) => 0,
        Err(code) => code,
    }
}

/// Reads a host document, mapping failures to exit codes.
fn load_host(path: &Path) -> Result<InMemoryHost, i32> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read '{}': {}", path.display(), e);
        3
    })?;
    serde_json::from_str(&text).map_err(|e| {
        eprintln!("Error: invalid document '{}': {}", path.display(), e);
        1
    })
}

/// Writes a host document to `output`, or stdout.
fn write_host(host: &InMemoryHost, output: Option<&Path>) -> Result<(), i32> {
    let json = serde_json::to_string_pretty(host).map_err(|e| {
        eprintln!("Error: failed to serialize document: {}", e);
        1
    })?;
    match output {
        Some(path) => std::fs::write(path, json).map_err(|e| {
            eprintln!("Error: failed to write '{}': {}", path.display(), e);
            3
        }),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

/// Parse a socket side.
fn parse_direction(s: &str) -> Result<SocketDirection, String> {
    match s {
        "input" | "in" => Ok(SocketDirection::Input),
        "output" | "out" => Ok(SocketDirection::Output),
        _ => Err(format!(
            "invalid direction '{}', expected input or output",
            s
        )),
    }
}
