// Topic pipeline: cluster -> rank -> name -> (optional) refine.
//
// Every stage takes the state by value, checks the stage it depends on and
// returns the advanced state. Re-running an earlier stage on a later state
// is allowed and discards everything downstream of it.

use anyhow::Result;
use tracing::{info, warn};

use crate::llm::TextGenerator;
use crate::state::{PipelineState, Stage};
use crate::topics::cluster::{cluster_documents, KMeans};
use crate::topics::naming::{auto_name, select_top_terms};
use crate::topics::params::{ResolvedTopicParams, TopicParams};
use crate::topics::ranking::rank_documents;
use crate::topics::refine::{RefineReport, TopicRefiner};

/// Resolve `params` and run clustering, ranking and naming in one go.
pub fn fit_topics(state: PipelineState, params: &TopicParams) -> Result<PipelineState> {
    state.require(Stage::Fitted, "build topics")?;
    let resolved = params.resolve(state.docs.len())?;
    let state = cluster_stage(state, resolved)?;
    let state = rank_stage(state)?;
    name_stage(state)
}

/// Cluster documents on the 2D map and select each topic's top terms.
pub fn cluster_stage(mut state: PipelineState, params: ResolvedTopicParams) -> Result<PipelineState> {
    state.require(Stage::Fitted, "cluster documents")?;
    if state.docs.is_empty() {
        anyhow::bail!("Cannot cluster documents: the corpus is empty");
    }

    let kmeans = KMeans::new(params.n_clusters).seed(params.seed);
    let (docs, topics, summary) = cluster_documents(std::mem::take(&mut state.docs), &kmeans)?;
    if summary.is_degenerate() {
        warn!(
            requested = summary.requested,
            produced = summary.produced,
            "Fewer distinct points than requested clusters; produced fewer topics"
        );
    }

    let vocabulary = state.terms.vocabulary(&params);
    let topics = select_top_terms(topics, &docs, &vocabulary, params.ranking_terms);

    info!(
        topics = topics.len(),
        vocabulary = vocabulary.len(),
        "Clustered documents"
    );

    state.docs = docs;
    state.topics = topics;
    state.clustering = Some(summary);
    state.params = Some(params);
    Ok(state.advance(Stage::Clustered))
}

/// Rank documents within their topics by overlap with the topic's top terms.
pub fn rank_stage(mut state: PipelineState) -> Result<PipelineState> {
    state.require(Stage::Clustered, "rank documents")?;
    let top_docs = state.resolved_params("rank documents")?.top_docs;

    let (docs, topics) = rank_documents(
        std::mem::take(&mut state.docs),
        std::mem::take(&mut state.topics),
        top_docs,
    );
    state.docs = docs;
    state.topics = topics;
    Ok(state.advance(Stage::Ranked))
}

/// Give every topic its auto-generated name.
pub fn name_stage(mut state: PipelineState) -> Result<PipelineState> {
    state.require(Stage::Ranked, "name topics")?;
    let name_length = state.resolved_params("name topics")?.name_length;

    state.topics = auto_name(std::mem::take(&mut state.topics), name_length);
    Ok(state.advance(Stage::Named))
}

/// Rewrite topic names with a generative model.
///
/// Per-topic failures keep the previous name and are listed in the report.
/// The state reaches Refined only if at least one topic was renamed.
pub async fn refine_stage(
    mut state: PipelineState,
    refiner: &TopicRefiner,
    generator: &dyn TextGenerator,
) -> Result<(PipelineState, RefineReport)> {
    state.require(Stage::Named, "clean topic names")?;

    let (topics, report) = refiner
        .refine(generator, std::mem::take(&mut state.topics), &state.docs)
        .await;
    state.topics = topics;

    info!(
        refined = report.refined.len(),
        failed = report.failed.len(),
        "Topic name cleaning finished"
    );

    let stage = if report.refined.is_empty() {
        state.stage
    } else {
        Stage::Refined
    };
    Ok((state.advance(stage), report))
}
