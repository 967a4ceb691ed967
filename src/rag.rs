// Retrieval-augmented answers over the fitted corpus.
//
// The query is embedded with the same model as the documents, the closest
// documents by cosine similarity become the context, and the generator
// answers from that context only.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::embeddings::{cosine_similarity, Embedder};
use crate::llm::TextGenerator;
use crate::models::{DocId, TopicId};
use crate::output::truncate_chars;
use crate::state::PipelineState;

/// Per-source character budget inside the prompt.
const MAX_SOURCE_CHARS: usize = 1500;

/// A retrieved document used as context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RagSource {
    pub doc_id: DocId,
    pub topic_id: Option<TopicId>,
    pub similarity: f64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    /// Most similar first
    pub sources: Vec<RagSource>,
}

/// The `top_doc` documents most similar to `query_embedding`.
/// Ties keep corpus order.
pub fn retrieve(state: &PipelineState, query_embedding: &[f32], top_doc: usize) -> Vec<RagSource> {
    let mut scored: Vec<(usize, f64)> = state
        .docs
        .iter()
        .enumerate()
        .map(|(i, d)| (i, cosine_similarity(query_embedding, &d.embedding)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .take(top_doc)
        .map(|(i, similarity)| {
            let doc = &state.docs[i];
            RagSource {
                doc_id: doc.doc_id.clone(),
                topic_id: doc.topic_id.clone(),
                similarity,
                content: doc.content.clone(),
            }
        })
        .collect()
}

pub fn build_prompt(query: &str, sources: &[RagSource]) -> String {
    let context = sources
        .iter()
        .map(|s| truncate_chars(s.content.trim(), MAX_SOURCE_CHARS))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Use the following documents to answer the question at the end. \
         If the documents do not contain the answer, say that you don't know.\n\n\
         {context}\n\n\
         Question: {query}\n\
         Answer:"
    )
}

/// Answer `query` from the `top_doc` most similar documents.
///
/// Embedding and generation errors propagate.
pub async fn answer(
    query: &str,
    state: &PipelineState,
    embedder: &dyn Embedder,
    generator: &dyn TextGenerator,
    top_doc: usize,
) -> Result<RagAnswer> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("Query is empty");
    }
    if top_doc == 0 {
        anyhow::bail!("top_doc must be at least 1");
    }
    if state.docs.is_empty() {
        anyhow::bail!("No documents to search; run `topicmap fit` first");
    }

    info!("Answering your query, please wait a few seconds");
    let query_embedding = embedder.embed_one(query).await?;
    let sources = retrieve(state, &query_embedding, top_doc);

    let prompt = build_prompt(query, &sources);
    let answer = generator.generate(&prompt).await?.trim().to_string();

    Ok(RagAnswer { answer, sources })
}
