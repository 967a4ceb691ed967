// UMass topic coherence over document co-occurrence of term ids.
//
// For a topic's ordered top terms w1..wN the score averages
//   ln((D(wm, wl) + 1) / D(wl))   for every l < m
// where D counts documents containing the term(s). Values are <= 0 in
// practice; closer to zero means the top terms tend to show up together.

use std::collections::{HashMap, HashSet};

use crate::models::{Document, Topic, TopicId};

#[derive(Debug, Clone, PartialEq)]
pub struct CoherenceReport {
    /// Per topic; `None` when a topic has fewer than two scorable terms
    pub per_topic: Vec<(TopicId, Option<f64>)>,
    /// Mean over topics that have a score
    pub mean: Option<f64>,
}

/// Compute UMass coherence for each topic's first `top_n` terms.
pub fn umass_coherence(topics: &[Topic], docs: &[Document], top_n: usize) -> CoherenceReport {
    let doc_sets: Vec<HashSet<&str>> = docs
        .iter()
        .map(|d| d.term_ids.iter().map(String::as_str).collect())
        .collect();

    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for set in &doc_sets {
        for &term in set {
            *doc_freq.entry(term).or_insert(0) += 1;
        }
    }

    let per_topic: Vec<(TopicId, Option<f64>)> = topics
        .iter()
        .map(|topic| {
            let terms: Vec<&str> = topic
                .term_ids
                .iter()
                .map(String::as_str)
                .filter(|t| doc_freq.contains_key(t))
                .take(top_n)
                .collect();
            (topic.topic_id.clone(), topic_score(&terms, &doc_sets, &doc_freq))
        })
        .collect();

    let scored: Vec<f64> = per_topic.iter().filter_map(|(_, s)| *s).collect();
    let mean = if scored.is_empty() {
        None
    } else {
        Some(scored.iter().sum::<f64>() / scored.len() as f64)
    };

    CoherenceReport { per_topic, mean }
}

fn topic_score(
    terms: &[&str],
    doc_sets: &[HashSet<&str>],
    doc_freq: &HashMap<&str, usize>,
) -> Option<f64> {
    if terms.len() < 2 {
        return None;
    }

    let mut total = 0.0;
    let mut pairs = 0usize;
    for m in 1..terms.len() {
        for l in 0..m {
            let d_l = doc_freq.get(terms[l]).copied().unwrap_or(0);
            if d_l == 0 {
                continue;
            }
            let co = doc_sets
                .iter()
                .filter(|s| s.contains(terms[m]) && s.contains(terms[l]))
                .count();
            total += ((co as f64 + 1.0) / d_l as f64).ln();
            pairs += 1;
        }
    }

    (pairs > 0).then(|| total / pairs as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(terms: &[&str]) -> Document {
        let mut d = Document::new("d", "");
        d.term_ids = terms.iter().map(|s| s.to_string()).collect();
        d
    }

    fn topic(id: &str, terms: &[&str]) -> Topic {
        let mut t = Topic::from_cluster(id.into(), (0.0, 0.0), vec![]);
        t.term_ids = terms.iter().map(|s| s.to_string()).collect();
        t
    }

    #[test]
    fn test_cooccurring_terms_score_higher() {
        let docs = vec![
            doc(&["solar", "panel"]),
            doc(&["solar", "panel"]),
            doc(&["wind"]),
            doc(&["tax"]),
        ];
        let topics = vec![topic("together", &["solar", "panel"]), topic("apart", &["wind", "tax"])];
        let report = umass_coherence(&topics, &docs, 10);

        let together = report.per_topic[0].1.unwrap();
        let apart = report.per_topic[1].1.unwrap();
        assert!(together > apart, "{together} should beat {apart}");
        // ln((2 + 1) / 2)
        assert!((together - (1.5f64).ln()).abs() < 1e-9);
    }

    #[test]
    fn test_single_term_topic_has_no_score() {
        let docs = vec![doc(&["solar"])];
        let report = umass_coherence(&[topic("t", &["solar", "unknown"])], &docs, 10);
        assert_eq!(report.per_topic[0].1, None);
        assert_eq!(report.mean, None);
    }
}
