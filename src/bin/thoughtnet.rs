//! Thoughtnet CLI: card summaries and concept maps as JSON.
//!
//! Usage:
//!   thoughtnet summary  --data <dir> | --mongo
//!   thoughtnet graph    --data <dir> --vectors <file> [--focus <name>]
//!   thoughtnet clusters --data <dir> --vectors <file>
//!   thoughtnet search   --data <dir> <query>

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use thoughtnet::pipeline::concept_names;
use thoughtnet::{
    search_concepts, CachedEmbedder, Config, Dashboard, Embedder, JsonFileSource,
    PrecomputedEmbedder, ProgressUpdate, RecordSource, SearchMatch,
};
use tracing::{debug, Level};

#[derive(Parser)]
#[command(
    name = "thoughtnet",
    version,
    about = "Concept similarity graphs and chart data for card collections"
)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Directory of exported collections (<dir>/<database>/<collection>.json)
    #[arg(long, conflicts_with = "mongo")]
    data: Option<PathBuf>,
    /// Read from MongoDB using MONGO_URI
    #[arg(long)]
    mongo: bool,
}

#[derive(Args)]
struct ModelArgs {
    /// JSON file mapping each concept to its vector
    #[arg(long)]
    vectors: Option<PathBuf>,
    /// Similarity threshold (overrides config)
    #[arg(long)]
    threshold: Option<f32>,
    /// Maximum number of edges (overrides config)
    #[arg(long)]
    max_edges: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Headline numbers and chart data
    Summary {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Similarity graph, optionally focused on one concept
    Graph {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        model: ModelArgs,
        /// Highlight this concept and its neighbours
        #[arg(long)]
        focus: Option<String>,
    },
    /// Cluster ids and 2D points per concept
    Clusters {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        model: ModelArgs,
        /// Number of clusters (overrides config)
        #[arg(long)]
        clusters: Option<usize>,
    },
    /// Find concepts by name
    Search {
        #[command(flatten)]
        data: DataArgs,
        /// Text to look for
        query: String,
    },
}

fn open_source(config: &Config, args: &DataArgs) -> Result<Box<dyn RecordSource>, String> {
    if args.mongo {
        return open_mongo(config);
    }
    match &args.data {
        Some(dir) => Ok(Box::new(JsonFileSource::new(dir))),
        None => Err("no data source: pass --data <dir> or --mongo".to_string()),
    }
}

#[cfg(feature = "mongo")]
fn open_mongo(config: &Config) -> Result<Box<dyn RecordSource>, String> {
    let uri = config.require_mongo_uri().map_err(|e| e.to_string())?;
    let source = thoughtnet::MongoSource::connect(uri).map_err(|e| e.to_string())?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "mongo"))]
fn open_mongo(_config: &Config) -> Result<Box<dyn RecordSource>, String> {
    Err("built without MongoDB support (enable the `mongo` feature)".to_string())
}

fn open_embedder(config: &Config, vectors: Option<&Path>) -> Result<Box<dyn Embedder>, String> {
    if let Some(path) = vectors {
        let embedder = PrecomputedEmbedder::from_file(path).map_err(|e| e.to_string())?;
        return Ok(Box::new(embedder));
    }
    open_model(config)
}

#[cfg(feature = "embeddings")]
fn open_model(config: &Config) -> Result<Box<dyn Embedder>, String> {
    let embedder = thoughtnet::FastEmbedEmbedder::from_name(&config.embedding_model)
        .map_err(|e| e.to_string())?;
    Ok(Box::new(embedder))
}

#[cfg(not(feature = "embeddings"))]
fn open_model(_config: &Config) -> Result<Box<dyn Embedder>, String> {
    Err("no embedder: pass --vectors <file> or enable the `embeddings` feature".to_string())
}

fn apply_model_overrides(config: &mut Config, model: &ModelArgs) {
    if let Some(threshold) = model.threshold {
        config.graph.threshold = threshold;
    }
    if let Some(max_edges) = model.max_edges {
        config.graph.max_edges = max_edges;
    }
}

fn log_progress(update: &ProgressUpdate) {
    debug!(stage = ?update.stage, fraction = update.fraction, "progress");
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

fn cmd_summary(config: &Config, data: &DataArgs) -> Result<(), String> {
    let source = open_source(config, data)?;
    // Summaries never embed
    let embedder = PrecomputedEmbedder::default();
    let dashboard = Dashboard::new(config, source.as_ref(), &embedder);
    let table = dashboard.load();
    print_json(&dashboard.summary(&table))
}

fn cmd_graph(
    mut config: Config,
    data: &DataArgs,
    model: &ModelArgs,
    focus: Option<&str>,
) -> Result<(), String> {
    apply_model_overrides(&mut config, model);
    let source = open_source(&config, data)?;
    let embedder = CachedEmbedder::new(open_embedder(&config, model.vectors.as_deref())?);
    let progress = log_progress;
    let dashboard = Dashboard::new(&config, source.as_ref(), &embedder).with_progress(&progress);

    let table = dashboard.load();
    let map = dashboard.concept_map(&table, focus).map_err(|e| e.to_string())?;
    print_json(&json!({
        "nodes": map.graph.node_count(),
        "edges": map.graph.edge_count(),
        "components": map.graph.connected_components().len(),
        "search": map.search,
        "view": map.view,
    }))
}

fn cmd_clusters(
    mut config: Config,
    data: &DataArgs,
    model: &ModelArgs,
    clusters: Option<usize>,
) -> Result<(), String> {
    apply_model_overrides(&mut config, model);
    if let Some(k) = clusters {
        config.clustering.num_clusters = k;
    }
    let source = open_source(&config, data)?;
    let embedder = CachedEmbedder::new(open_embedder(&config, model.vectors.as_deref())?);
    let progress = log_progress;
    let dashboard = Dashboard::new(&config, source.as_ref(), &embedder).with_progress(&progress);

    let table = dashboard.load();
    let map = dashboard.concept_map(&table, None).map_err(|e| e.to_string())?;
    let rows: Vec<_> = map
        .concepts
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "concept": name,
                "cluster": map.clusters.as_ref().map(|c| c.labels[i]),
                "point": map.projection.as_ref().map(|p| p[i]),
            })
        })
        .collect();
    print_json(&json!({
        "converged": map.clusters.as_ref().map(|c| c.converged),
        "inertia": map.clusters.as_ref().map(|c| c.inertia),
        "concepts": rows,
    }))
}

fn cmd_search(config: &Config, data: &DataArgs, query: &str) -> Result<(), String> {
    let source = open_source(config, data)?;
    let table = thoughtnet::load_cards(source.as_ref(), &config.sources);
    let concepts = concept_names(&table);
    let outcome = search_concepts(query, &concepts, config.search_max_len);

    let names: Vec<&str> = match &outcome.result {
        SearchMatch::Exact(i) => vec![concepts[*i].as_str()],
        SearchMatch::Partial { matches, .. } => {
            matches.iter().map(|&i| concepts[i].as_str()).collect()
        }
        SearchMatch::NotFound => Vec::new(),
    };
    if outcome.truncated {
        eprintln!(
            "Warning: query truncated to {} characters",
            config.search_max_len
        );
    }
    if outcome.capped() {
        eprintln!("Showing the first {} matches", names.len());
    }
    print_json(&json!({ "outcome": outcome, "names": names }))
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Summary { data } => cmd_summary(&config, &data),
        Commands::Graph { data, model, focus } => cmd_graph(config, &data, &model, focus.as_deref()),
        Commands::Clusters {
            data,
            model,
            clusters,
        } => cmd_clusters(config, &data, &model, clusters),
        Commands::Search { data, query } => cmd_search(&config, &data, &query),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
