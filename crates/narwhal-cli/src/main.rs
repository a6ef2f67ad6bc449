use futures::executor::block_on;
use narwhal::{Metric, Phase, ProjectionConfig, ProjectionOptions, ProjectionTask, ProjectionType};
use narwhal::{SpanningTree, reorder};
use narwhal_graph::{GraphAccess, GraphDocument, VertexId, WeightedGraph};
use serde::Serialize;
use std::io::Read;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Graph(narwhal_graph::GraphError),
    Projection(narwhal::Error),
    Json(serde_json::Error),
    UnknownLabel(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Graph(err) => write!(f, "{err}"),
            CliError::Projection(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::UnknownLabel(label) => write!(f, "graph has no vertex labelled `{label}`"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<narwhal_graph::GraphError> for CliError {
    fn from(value: narwhal_graph::GraphError) -> Self {
        Self::Graph(value)
    }
}

impl From<narwhal::Error> for CliError {
    fn from(value: narwhal::Error) -> Self {
        Self::Projection(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Project,
    Tree,
    Reorder,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<String>,
    pretty: bool,
    verbose: bool,
    dims: Option<i64>,
    start: Option<String>,
    finish: Option<String>,
    iterations: Option<i64>,
    columns: Option<Vec<i64>>,
    nodes: Option<usize>,
    minimum_area: bool,
    minimum_perimeter: bool,
    no_minimum_distance: bool,
    map_nnc: bool,
    map_emanating_edges: bool,
    reorder: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlacedOut<'a> {
    id: &'a str,
    coordinates: &'a [f64],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TreeEdgeOut<'a> {
    vertex: &'a str,
    parent: &'a str,
    weight: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TreeOut<'a> {
    root: &'a str,
    total_weight: f64,
    edges: Vec<TreeEdgeOut<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionOut<'a> {
    dimensions: usize,
    vertices: Vec<PlacedOut<'a>>,
    order: Vec<&'a str>,
    tree: TreeOut<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nnc: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emanating_edges: Option<Vec<&'a str>>,
    iterations: usize,
    lambdas: &'a [f64],
    initial_stress: f64,
    stress: f64,
}

#[derive(Serialize)]
struct ReorderOut<'a> {
    order: Vec<&'a str>,
}

fn usage() -> &'static str {
    "narwhal\n\
\n\
USAGE:\n\
  narwhal [project] [--dims <n>] [--start <id>] [--finish <id>] [--iterations <n>] [--columns <i,j,..>] [--minimum-area] [--minimum-perimeter] [--no-minimum-distance] [--map-nnc] [--map-emanating-edges] [--reorder] [--config <path>] [--pretty] [--verbose] [<path>|-]\n\
  narwhal tree [--start <id>] [--finish <id>] [--columns <i,j,..>] [--pretty] [<path>|-]\n\
  narwhal reorder [--dims <n>] [--nodes <n>] [--pretty] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', the graph document is read from stdin.\n\
  - Vertices are named by their document ids; --start defaults to the first vertex.\n\
  - --config reads a JSON projection config; flags given on the command line override it.\n\
  - Logs go to stderr (RUST_LOG, default warn; --verbose means debug).\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "project" => args.command = Command::Project,
            "tree" => args.command = Command::Tree,
            "reorder" => args.command = Command::Reorder,
            "--pretty" => args.pretty = true,
            "--verbose" | "-v" => args.verbose = true,
            "--minimum-area" => args.minimum_area = true,
            "--minimum-perimeter" => args.minimum_perimeter = true,
            "--no-minimum-distance" => args.no_minimum_distance = true,
            "--map-nnc" => args.map_nnc = true,
            "--map-emanating-edges" => args.map_emanating_edges = true,
            "--reorder" => args.reorder = true,
            "--dims" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.dims = Some(n.parse::<i64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--iterations" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.iterations = Some(n.parse::<i64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--nodes" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.nodes = Some(n.parse::<usize>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--columns" => {
                let Some(list) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let columns = list
                    .split(',')
                    .filter(|c| !c.trim().is_empty())
                    .map(|c| c.trim().parse::<i64>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| CliError::Usage(usage()))?;
                args.columns = Some(columns);
            }
            "--start" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.start = Some(id.clone());
            }
            "--finish" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.finish = Some(id.clone());
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn resolve(graph: &WeightedGraph, label: &str) -> Result<VertexId, CliError> {
    graph
        .vertex_id(label)
        .ok_or_else(|| CliError::UnknownLabel(label.to_string()))
}

fn label(graph: &WeightedGraph, v: VertexId) -> &str {
    graph.label(v).unwrap_or_default()
}

fn labels<'g>(graph: &'g WeightedGraph, ids: &[VertexId]) -> Vec<&'g str> {
    ids.iter().map(|&v| label(graph, v)).collect()
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(args: &Args) -> Result<ProjectionConfig, CliError> {
    let mut cfg = match &args.config {
        Some(path) => serde_json::from_str::<ProjectionConfig>(&std::fs::read_to_string(path)?)?,
        None => ProjectionConfig::default(),
    };
    if let Some(dims) = args.dims {
        cfg.projection_type = match dims {
            2 => ProjectionType::TwoDimensional,
            3 => ProjectionType::ThreeDimensional,
            _ => ProjectionType::NDimensional,
        };
        cfg.number_of_dimensions = Some(dims);
    }
    if let Some(n) = args.iterations {
        cfg.number_of_iterations = n;
    }
    if let Some(columns) = &args.columns {
        cfg.dimensions = columns.clone();
    }
    cfg.minimum_area |= args.minimum_area;
    cfg.minimum_perimeter |= args.minimum_perimeter;
    cfg.minimum_distance &= !args.no_minimum_distance;
    cfg.map_nnc |= args.map_nnc;
    cfg.map_emanating_edges |= args.map_emanating_edges;
    cfg.reorder |= args.reorder;
    Ok(cfg)
}

fn build_options(args: &Args, graph: &WeightedGraph) -> Result<ProjectionOptions, CliError> {
    let mut options = ProjectionOptions::try_from(build_config(args)?)?;
    if let Some(start) = &args.start {
        options.start = resolve(graph, start)?;
    }
    if let Some(finish) = &args.finish {
        options.finish = Some(resolve(graph, finish)?);
    }
    Ok(options)
}

fn tree_out<'g>(graph: &'g WeightedGraph, tree: &SpanningTree) -> TreeOut<'g> {
    let edges = tree
        .entries()
        .map(|(v, entry)| TreeEdgeOut {
            vertex: label(graph, v),
            parent: label(graph, entry.parent),
            weight: entry.weight,
        })
        .collect();
    TreeOut {
        root: label(graph, tree.root()),
        total_weight: tree.total_weight(),
        edges,
    }
}

fn run_project(args: &Args, mut graph: WeightedGraph) -> Result<(), CliError> {
    let options = build_options(args, &graph)?;
    let task = ProjectionTask::new(&mut graph, options).on_progress(|phase| match phase {
        Phase::Refined { iteration } => tracing::trace!(iteration, "refinement pass done"),
        other => tracing::debug!(phase = ?other, "projection progress"),
    });
    let projection = block_on(task.run_async())?;

    let vertices = projection
        .coordinates
        .iter()
        .map(|(&v, coordinates)| PlacedOut {
            id: label(&graph, v),
            coordinates,
        })
        .collect();
    let out = ProjectionOut {
        dimensions: projection.dimensions,
        vertices,
        order: labels(&graph, &projection.order),
        tree: tree_out(&graph, &projection.tree),
        nnc: projection.nnc.as_deref().map(|ids| labels(&graph, ids)),
        emanating_edges: projection
            .emanating_edges
            .as_deref()
            .map(|ids| labels(&graph, ids)),
        iterations: projection.iterations(),
        lambdas: &projection.lambdas,
        initial_stress: projection.initial_stress,
        stress: projection.stress(),
    };
    write_json(&out, args.pretty)
}

fn run_tree(args: &Args, graph: WeightedGraph) -> Result<(), CliError> {
    let start = match &args.start {
        Some(label) => resolve(&graph, label)?,
        None => 0,
    };
    let finish = args
        .finish
        .as_deref()
        .map(|label| resolve(&graph, label))
        .transpose()?;
    let columns = match &args.columns {
        Some(columns) => columns
            .iter()
            .map(|&c| usize::try_from(c).map_err(|_| CliError::Usage(usage())))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    let tree = SpanningTree::build(&Metric::new(&graph, &columns), start, finish)?;
    write_json(&tree_out(&graph, &tree), args.pretty)
}

fn run_reorder(args: &Args, graph: WeightedGraph) -> Result<(), CliError> {
    let dims = match args.dims {
        Some(n) => usize::try_from(n).map_err(|_| CliError::Usage(usage()))?,
        None => 2,
    };
    let nodes = args.nodes.unwrap_or(graph.vertex_count());
    let ordering = reorder(&graph, nodes, dims)?;
    let out = ReorderOut {
        order: labels(&graph, ordering.as_slice()),
    };
    write_json(&out, args.pretty)
}

fn run(args: Args) -> Result<(), CliError> {
    init_tracing(args.verbose);

    let text = read_input(args.input.as_deref())?;
    let document: GraphDocument = serde_json::from_str(&text)?;
    let graph = document.into_graph()?;
    tracing::debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );

    match args.command {
        Command::Project => run_project(&args, graph),
        Command::Tree => run_tree(&args, graph),
        Command::Reorder => run_reorder(&args, graph),
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
