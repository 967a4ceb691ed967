// Topic parameters and their resolution into a fully-specified run config.
//
// Every adjustment the pipeline makes to caller input happens here, once,
// before any stage runs. Stages only ever see `ResolvedTopicParams`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Corpora at or below this many documents get `min_count_terms` relaxed to 1.
pub const SMALL_CORPUS_THRESHOLD: usize = 500;

/// Largest n-gram size the term extractor produces.
pub const MAX_NGRAM: usize = 3;

/// Caller-facing topic parameters for one `topics` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicParams {
    /// Requested number of clusters (an upper bound on topics produced)
    pub n_clusters: usize,
    /// N-gram sizes considered for naming and ranking
    pub ngrams: Vec<usize>,
    /// Number of terms in an auto-generated topic name
    pub name_length: usize,
    /// Cap on the overall vocabulary size
    pub top_terms_overall: usize,
    /// Minimum corpus occurrences for a term to enter the vocabulary
    pub min_count_terms: usize,
    /// Number of top terms kept per topic and used for ranking
    pub ranking_terms: usize,
    /// Number of representative documents kept per topic
    pub top_docs: usize,
    /// Seed for k-means initialization
    pub seed: u64,
}

impl Default for TopicParams {
    fn default() -> Self {
        Self {
            n_clusters: 5,
            ngrams: vec![1, 2],
            name_length: 5,
            top_terms_overall: 2000,
            min_count_terms: 2,
            ranking_terms: 20,
            top_docs: 10,
            seed: 42,
        }
    }
}

/// Topic parameters after validation and corpus-size adjustments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTopicParams {
    pub n_clusters: usize,
    /// Sorted, deduplicated
    pub ngrams: Vec<usize>,
    pub name_length: usize,
    pub top_terms_overall: usize,
    /// Effective threshold actually applied
    pub min_count_terms: usize,
    /// The threshold the caller asked for
    pub requested_min_count_terms: usize,
    /// True when the small-corpus fallback lowered the threshold to 1
    pub min_count_relaxed: bool,
    pub ranking_terms: usize,
    pub top_docs: usize,
    pub seed: u64,
}

impl TopicParams {
    /// Validate and resolve against a corpus of `corpus_size` documents.
    pub fn resolve(&self, corpus_size: usize) -> Result<ResolvedTopicParams> {
        if self.n_clusters == 0 {
            anyhow::bail!("n_clusters must be at least 1");
        }
        if self.name_length == 0 {
            anyhow::bail!("name_length must be at least 1");
        }
        if self.top_terms_overall == 0 {
            anyhow::bail!("top_terms_overall must be at least 1");
        }
        if self.ranking_terms == 0 {
            anyhow::bail!("ranking_terms must be at least 1");
        }

        let mut ngrams = self.ngrams.clone();
        ngrams.sort_unstable();
        ngrams.dedup();
        if ngrams.is_empty() {
            anyhow::bail!("ngrams must contain at least one size");
        }
        if let Some(bad) = ngrams.iter().find(|&&n| n == 0 || n > MAX_NGRAM) {
            anyhow::bail!("n-gram size {bad} is out of range (1..={MAX_NGRAM})");
        }

        let min_count = self.min_count_terms.max(1);
        let relax = min_count > 1 && corpus_size <= SMALL_CORPUS_THRESHOLD;
        if relax {
            info!(
                requested = min_count,
                corpus_size,
                "Not enough documents to require a minimum term occurrence of {}. Setting min_count_terms to 1",
                min_count
            );
        }

        Ok(ResolvedTopicParams {
            n_clusters: self.n_clusters,
            ngrams,
            name_length: self.name_length,
            top_terms_overall: self.top_terms_overall,
            min_count_terms: if relax { 1 } else { min_count },
            requested_min_count_terms: self.min_count_terms,
            min_count_relaxed: relax,
            ranking_terms: self.ranking_terms,
            top_docs: self.top_docs,
            seed: self.seed,
        })
    }
}
