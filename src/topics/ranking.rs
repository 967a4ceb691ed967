// Document ranking within topics by term overlap.
//
// A document's relevance is the number of its terms that appear among its
// topic's top terms. Members are ordered by relevance, highest first, with
// ties kept in corpus order, so identical inputs always give the same order.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::{Document, Topic};

/// Overlap between a document's terms and a topic's top terms.
pub fn overlap_score(doc_terms: &[String], topic_terms: &HashSet<&str>) -> f64 {
    doc_terms
        .iter()
        .filter(|t| topic_terms.contains(t.as_str()))
        .count() as f64
}

/// Rank every topic's members and keep the first `top_docs` as its
/// representative documents.
///
/// Full membership stays in `member_ids`; `top_doc_ids` is its prefix.
/// Documents get a 1-based `rank` and their `relevance` score. Documents
/// without a topic are left untouched.
pub fn rank_documents(
    mut docs: Vec<Document>,
    mut topics: Vec<Topic>,
    top_docs: usize,
) -> (Vec<Document>, Vec<Topic>) {
    let mut by_topic: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, doc) in docs.iter().enumerate() {
        if let Some(topic_id) = &doc.topic_id {
            by_topic.entry(topic_id.clone()).or_default().push(i);
        }
    }

    for topic in &mut topics {
        let members = by_topic.remove(&topic.topic_id).unwrap_or_default();
        let terms: HashSet<&str> = topic.term_ids.iter().map(String::as_str).collect();

        let mut scored: Vec<(usize, f64)> = members
            .into_iter()
            .map(|i| (i, overlap_score(&docs[i].term_ids, &terms)))
            .collect();
        // sort_by is stable: equal scores keep corpus order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        topic.member_ids = scored.iter().map(|&(i, _)| docs[i].doc_id.clone()).collect();
        topic.size = topic.member_ids.len();
        topic.top_doc_ids = topic.member_ids.iter().take(top_docs).cloned().collect();

        for (position, &(i, score)) in scored.iter().enumerate() {
            docs[i].rank = Some(position + 1);
            docs[i].relevance = Some(score);
        }

        debug!(
            topic = %topic.topic_id,
            members = topic.size,
            top = topic.top_doc_ids.len(),
            "Ranked topic documents"
        );
    }

    (docs, topics)
}
