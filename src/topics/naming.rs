// Topic naming from member-document term frequencies.
//
// Naming happens in two steps around ranking: `select_top_terms` picks each
// topic's top terms (which the ranker then scores against), and `auto_name`
// turns the leading terms into the topic's initial name.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::terms::TermTable;
use crate::models::{Document, NameOrigin, Topic};

/// Separator between terms in an auto-generated name.
pub const NAME_SEPARATOR: &str = " | ";

/// Set each topic's `term_ids` to its `ranking_terms` most frequent
/// vocabulary terms.
///
/// Frequency is the number of member documents containing the term. Ties go
/// to the term with the higher corpus count, then to lexical order, so the
/// selection is stable for identical inputs.
pub fn select_top_terms(
    mut topics: Vec<Topic>,
    docs: &[Document],
    vocabulary: &TermTable,
    ranking_terms: usize,
) -> Vec<Topic> {
    let corpus_counts = vocabulary.counts();

    let mut per_topic: HashMap<&str, HashMap<&str, usize>> = HashMap::new();
    for doc in docs {
        let Some(topic_id) = doc.topic_id.as_deref() else {
            continue;
        };
        let counts = per_topic.entry(topic_id).or_default();
        // term_ids are unique per document, but guard against hand-built input
        let mut seen = HashSet::new();
        for term in &doc.term_ids {
            if corpus_counts.contains_key(term.as_str()) && seen.insert(term.as_str()) {
                *counts.entry(term.as_str()).or_insert(0) += 1;
            }
        }
    }

    for topic in &mut topics {
        let mut ranked: Vec<(&str, usize)> = per_topic
            .get(topic.topic_id.as_str())
            .map(|counts| counts.iter().map(|(t, c)| (*t, *c)).collect())
            .unwrap_or_default();

        ranked.sort_by(|a, b| compare_terms(a, b, &corpus_counts));
        topic.term_ids = ranked
            .into_iter()
            .take(ranking_terms)
            .map(|(t, _)| t.to_string())
            .collect();

        debug!(
            topic = %topic.topic_id,
            terms = topic.term_ids.len(),
            "Selected topic terms"
        );
    }

    topics
}

fn compare_terms(a: &(&str, usize), b: &(&str, usize), corpus: &HashMap<&str, usize>) -> Ordering {
    b.1.cmp(&a.1)
        .then_with(|| {
            let ca = corpus.get(a.0).copied().unwrap_or(0);
            let cb = corpus.get(b.0).copied().unwrap_or(0);
            cb.cmp(&ca)
        })
        .then_with(|| a.0.cmp(b.0))
}

/// Name every topic from its first `name_length` top terms.
pub fn auto_name(mut topics: Vec<Topic>, name_length: usize) -> Vec<Topic> {
    for topic in &mut topics {
        topic.name = name_from_terms(&topic.topic_id, &topic.term_ids, name_length);
        topic.name_origin = NameOrigin::Auto;
    }
    topics
}

/// Join the leading terms into a name; falls back to the topic id.
pub fn name_from_terms(topic_id: &str, terms: &[String], name_length: usize) -> String {
    if terms.is_empty() {
        return format!("Topic {topic_id}");
    }
    terms
        .iter()
        .take(name_length)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}
