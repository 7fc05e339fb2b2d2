//! The dashboard pipeline: load cards, summarise them, map their concepts
//!
//! `Dashboard` is the composition root. It borrows the source, embedder and
//! progress observer it is given and owns nothing long-lived, so a run is
//! one blocking pass: fetch, normalize, embed, graph, cluster, project.

use crate::aggregate::{
    cell_text, count_primary_colors, line_data, pie_data, top_concepts, ChartData, CountRow, Kpis,
    LinePoint, Table, TOP_CONCEPTS,
};
use crate::cluster::{ClusterAssignment, ClusterError, KMeans, KMeansConfig, Point2, Tsne};
use crate::config::Config;
use crate::embedding::{embed_all, Embedder, EmbeddingError};
use crate::graph::{
    build_similarity_graph, GraphError, GraphView, NoProgress, ProgressObserver, ProgressUpdate,
    SimilarityGraph, Stage,
};
use crate::normalize::{color_hex, COLORLESS};
use crate::search::{search_concepts, SearchMatch, SearchOutcome};
use crate::source::{load_cards, RecordSource};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can stop a concept map
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Clustering error: {0}")]
    Cluster(#[from] ClusterError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// One slice of the colour pie
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorShare {
    pub label: String,
    pub count: u64,
    /// Chart colour, when the combination has one
    pub color: Option<&'static str>,
}

/// Everything the overview page shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub kpis: Kpis,
    /// Most frequent concept names, for the horizontal bar
    pub top_concepts: Vec<CountRow>,
    pub colors: Vec<ColorShare>,
    pub primary_colors: Vec<CountRow>,
    pub types: Vec<CountRow>,
    /// Cards created per day
    pub cards_over_time: Vec<LinePoint>,
    /// Named concepts updated per day
    pub concepts_over_time: Vec<LinePoint>,
}

/// The concept graph with its clusters and 2D layout
#[derive(Debug, Clone, Serialize)]
pub struct ConceptMap {
    /// Sorted, distinct concept names; index `i` is node `i`
    pub concepts: Vec<String>,
    pub graph: SimilarityGraph,
    /// `None` when there are no concepts
    pub clusters: Option<ClusterAssignment>,
    /// `None` when there are too few concepts for the configured perplexity
    pub projection: Option<Vec<Point2>>,
    pub view: GraphView,
    pub search: Option<SearchOutcome>,
}

/// Sorted, distinct, non-null `name` values
pub fn concept_names(table: &Table) -> Vec<String> {
    table
        .column("name")
        .into_iter()
        .filter_map(cell_text)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub struct Dashboard<'a> {
    config: &'a Config,
    source: &'a dyn RecordSource,
    embedder: &'a dyn Embedder,
    progress: &'a dyn ProgressObserver,
}

impl<'a> Dashboard<'a> {
    pub fn new(config: &'a Config, source: &'a dyn RecordSource, embedder: &'a dyn Embedder) -> Self {
        Self {
            config,
            source,
            embedder,
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressObserver) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// Fetch and normalize cards from every configured collection
    pub fn load(&self) -> Table {
        load_cards(self.source, &self.config.sources)
    }

    pub fn summary(&self, table: &Table) -> DashboardSummary {
        let data = ChartData::Table(table.clone());

        let colors = match pie_data(Some(&data), Some("colors")) {
            Ok(rows) => rows
                .into_iter()
                .map(|row| ColorShare {
                    color: share_color(&row.label),
                    label: row.label,
                    count: row.count,
                })
                .collect(),
            Err(e) => {
                warn!("colour chart skipped: {}", e);
                Vec::new()
            }
        };

        let types = pie_data(Some(&data), Some("type")).unwrap_or_else(|e| {
            warn!("type chart skipped: {}", e);
            Vec::new()
        });

        let cards_over_time = line_data(table, "_id", "createdAt").unwrap_or_else(|e| {
            warn!("cards timeline skipped: {}", e);
            Vec::new()
        });
        let concepts_over_time = line_data(table, "name", "updatedAt").unwrap_or_else(|e| {
            warn!("concepts timeline skipped: {}", e);
            Vec::new()
        });

        DashboardSummary {
            kpis: Kpis::from_table(table),
            top_concepts: top_concepts(table, TOP_CONCEPTS),
            colors,
            primary_colors: count_primary_colors(table, "colors"),
            types,
            cards_over_time,
            concepts_over_time,
        }
    }

    /// Embed the concepts, in configured batches
    pub fn embed(&self, concepts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        let texts: Vec<&str> = concepts.iter().map(String::as_str).collect();
        Ok(embed_all(
            self.embedder,
            &texts,
            self.config.embedding_batch_size,
            self.progress,
        )?)
    }

    pub fn graph(&self, concepts: &[String], embeddings: &[Vec<f32>]) -> PipelineResult<SimilarityGraph> {
        Ok(build_similarity_graph(
            concepts,
            embeddings,
            &self.config.graph,
            self.progress,
        )?)
    }

    /// k-means with `min(num_clusters, N)` clusters; `None` for no input
    pub fn clusters(&self, embeddings: &[Vec<f32>]) -> PipelineResult<Option<ClusterAssignment>> {
        if embeddings.is_empty() {
            return Ok(None);
        }
        let config = KMeansConfig {
            num_clusters: self.config.clustering.num_clusters.min(embeddings.len()),
            ..self.config.clustering.clone()
        };
        Ok(Some(
            KMeans::new(config).fit_with_progress(embeddings, self.progress)?,
        ))
    }

    /// t-SNE layout; `None` when there are too few points for the perplexity
    pub fn projection(&self, embeddings: &[Vec<f32>]) -> PipelineResult<Option<Vec<Point2>>> {
        match Tsne::new(self.config.projection.clone()).project_with_progress(embeddings, self.progress) {
            Ok(points) => Ok(Some(points)),
            Err(ClusterError::PerplexityTooLarge { perplexity, n }) => {
                warn!(perplexity, n, "too few concepts for t-SNE, projection skipped");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run the whole concept pipeline, focusing the view on `search` when it
    /// picks out a single concept
    pub fn concept_map(&self, table: &Table, search: Option<&str>) -> PipelineResult<ConceptMap> {
        let concepts = concept_names(table);
        info!(concepts = concepts.len(), "building concept map");

        let embeddings = self.embed(&concepts)?;
        let graph = self.graph(&concepts, &embeddings)?;
        let clusters = self.clusters(&embeddings)?;
        let projection = self.projection(&embeddings)?;

        let search = search.map(|q| search_concepts(q, &concepts, self.config.search_max_len));
        let view = match search.as_ref().map(|s| &s.result) {
            Some(SearchMatch::Exact(index)) => GraphView::focus(&graph, *index)?,
            Some(SearchMatch::Partial { matches, total: 1 }) if !matches.is_empty() => {
                GraphView::focus(&graph, matches[0])?
            }
            _ => GraphView::overview(&graph, self.config.overview_node_limit),
        };

        self.progress.on_progress(&ProgressUpdate::new(Stage::Done, 1.0));
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            shown = view.node_count(),
            "concept map ready"
        );

        Ok(ConceptMap {
            concepts,
            graph,
            clusters,
            projection,
            view,
            search,
        })
    }
}

fn share_color(label: &str) -> Option<&'static str> {
    if label == COLORLESS {
        return color_hex("C");
    }
    color_hex(label)
}
