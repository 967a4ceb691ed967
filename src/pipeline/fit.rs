// Fit pipeline: raw documents -> embedded, projected, term-annotated state.
//
// Steps:
// 1. Settle document ids (validate caller ids, generate the missing ones)
// 2. Drop blank documents
// 3. Embed every document and project the embeddings to 2D
// 4. Extract candidate terms (every n-gram size, so topic runs never need
//    to re-extract)

use std::collections::HashSet;

use anyhow::Result;
use rand::Rng;
use tracing::{info, warn};

use crate::config::Language;
use crate::embeddings::Embedder;
use crate::models::{DocId, Document, InputDocument};
use crate::projection::Projector;
use crate::state::PipelineState;
use crate::topics::terms::TermExtractor;

/// Build a Fitted pipeline state from raw documents.
pub async fn fit(
    inputs: Vec<InputDocument>,
    language: Language,
    embedder: &dyn Embedder,
    projector: &dyn Projector,
) -> Result<PipelineState> {
    let mut docs = assign_ids(inputs)?;

    let before = docs.len();
    docs.retain(|d| !d.content.trim().is_empty());
    if docs.len() < before {
        warn!(dropped = before - docs.len(), "Dropped blank documents");
    }
    if docs.is_empty() {
        anyhow::bail!("No documents to fit: the corpus is empty");
    }

    let texts: Vec<String> = docs.iter().map(|d| d.content.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;
    if embeddings.len() != docs.len() {
        anyhow::bail!(
            "Embedder returned {} vectors for {} documents",
            embeddings.len(),
            docs.len()
        );
    }

    let coords = projector.project(&embeddings)?;
    if coords.len() != docs.len() {
        anyhow::bail!(
            "Projector returned {} points for {} documents",
            coords.len(),
            docs.len()
        );
    }

    let ids: Vec<DocId> = docs.iter().map(|d| d.doc_id.clone()).collect();
    let mut extraction = TermExtractor::new(language).extract(&ids, &texts)?;

    for ((doc, embedding), (x, y)) in docs.iter_mut().zip(embeddings).zip(coords) {
        doc.embedding = embedding;
        doc.x = x;
        doc.y = y;
        doc.term_ids = extraction.doc_terms.remove(&doc.doc_id).unwrap_or_default();
    }

    info!(
        documents = docs.len(),
        terms = extraction.terms.len(),
        %language,
        "Fitted corpus"
    );

    Ok(PipelineState::fitted(language, docs, extraction.terms))
}

/// Turn inputs into documents with unique, non-empty ids.
///
/// Caller ids are trimmed and must be non-empty and unique. Documents without
/// one get a generated 8-character hex id that collides with nothing else.
pub fn assign_ids(inputs: Vec<InputDocument>) -> Result<Vec<Document>> {
    let mut taken: HashSet<String> = HashSet::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        if let Some(id) = &input.id {
            let id = id.trim();
            if id.is_empty() {
                anyhow::bail!("Document {i} has an empty id");
            }
            if !taken.insert(id.to_string()) {
                anyhow::bail!("Duplicate document id '{id}'");
            }
        }
    }

    let mut rng = rand::rng();
    let docs = inputs
        .into_iter()
        .map(|input| {
            let id = match input.id {
                Some(id) => id.trim().to_string(),
                None => loop {
                    let candidate = format!("{:08x}", rng.random::<u32>());
                    if taken.insert(candidate.clone()) {
                        break candidate;
                    }
                },
            };
            Document::new(id, input.content)
        })
        .collect();
    Ok(docs)
}
