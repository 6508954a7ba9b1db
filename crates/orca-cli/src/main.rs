use clap::Parser;
use orca::{
    BasicProgressMonitor, CoreOptions, CycleBreakingStrategy, Direction, HierarchyHandling,
    LayeredOptions, LayoutGraph, LayoutResult, NodeId, OrderingStrategy, set_property,
};
use orca::options::LAYERED_ALGORITHM_ID;
use serde::Serialize;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, prelude::*};

/// Lays out a nested chain (root -> A -> B -> ...) and prints the positions as JSON.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Number of nodes below the root; every node but the last is a container.
    #[arg(long, default_value_t = 2)]
    depth: usize,

    #[arg(long, default_value = "model-order")]
    cycle_breaking: CycleBreakingStrategy,

    #[arg(long, default_value = "prefer-nodes")]
    model_order: OrderingStrategy,

    #[arg(long, default_value = "include-children")]
    hierarchy: HierarchyHandling,

    #[arg(long, default_value = "undefined")]
    direction: Direction,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Output<'a> {
    Ok { nodes: Vec<NodeOut> },
    Error { kind: &'a str, message: String },
}

#[derive(Serialize)]
struct NodeOut {
    name: String,
    parent: Option<String>,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

fn node_name(depth: usize) -> String {
    match depth {
        0 => "root".to_string(),
        1..=26 => char::from(b'A' + (depth - 1) as u8).to_string(),
        _ => format!("N{depth}"),
    }
}

fn build_chain(args: &Args) -> orca::Result<(LayoutGraph, Vec<NodeId>)> {
    let mut g = LayoutGraph::new();
    let mut chain = vec![g.root()];
    for _ in 0..args.depth {
        let parent = chain[chain.len() - 1];
        chain.push(g.create_node(parent)?);
    }
    // The last node is the leaf.
    for &node in &chain[..chain.len().saturating_sub(1).max(1)] {
        set_property(&mut g, node, &CoreOptions::ALGORITHM, LAYERED_ALGORITHM_ID.to_string())?;
        set_property(&mut g, node, &LayeredOptions::CYCLE_BREAKING_STRATEGY, args.cycle_breaking)?;
        set_property(&mut g, node, &LayeredOptions::CONSIDER_MODEL_ORDER_STRATEGY, args.model_order)?;
        set_property(&mut g, node, &CoreOptions::HIERARCHY_HANDLING, args.hierarchy)?;
        set_property(&mut g, node, &CoreOptions::DIRECTION, args.direction)?;
    }
    Ok((g, chain))
}

fn render(result: &LayoutResult, chain: &[NodeId]) -> Vec<NodeOut> {
    let name_of = |node: NodeId| {
        chain
            .iter()
            .position(|&n| n == node)
            .map_or_else(|| node.to_string(), node_name)
    };
    result
        .entries()
        .iter()
        .map(|e| NodeOut {
            name: name_of(e.node),
            parent: e.parent.map(name_of),
            x: e.bounds.x,
            y: e.bounds.y,
            width: e.bounds.width,
            height: e.bounds.height,
        })
        .collect()
}

fn run(args: &Args) -> orca::Result<Vec<NodeOut>> {
    let (mut g, chain) = build_chain(args)?;
    let mut monitor = BasicProgressMonitor::new();
    let result = orca::layout(&mut g, &mut monitor)?;
    for task in monitor.tasks() {
        debug!(task = %task.name, seconds = task.elapsed.as_secs_f64(), "task finished");
    }
    Ok(render(&result, &chain))
}

fn print(output: &Output<'_>, pretty: bool) -> Result<(), serde_json::Error> {
    let text = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    println!("{text}");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(nodes) => match print(&Output::Ok { nodes }, args.pretty) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("JSON error: {err}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            warn!(kind = err.kind(), "layout failed: {err}");
            let output = Output::Error {
                kind: err.kind(),
                message: err.to_string(),
            };
            if let Err(json) = print(&output, args.pretty) {
                eprintln!("JSON error: {json}");
            }
            ExitCode::FAILURE
        }
    }
}
