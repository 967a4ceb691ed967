// Tabular views over topics and their ranked documents.
//
// Sizes are recomputed from the documents actually present rather than read
// from `Topic::size`, so tables stay correct after documents are filtered
// out. A topic that lost all its documents still gets a row with size 0.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{DocId, Document, Topic, TopicId};

/// One row per topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRow {
    pub topic_id: TopicId,
    pub name: String,
    pub size: usize,
    pub x_centroid: f64,
    pub y_centroid: f64,
    pub top_terms: Vec<String>,
}

/// One row per (topic, representative document) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDocRow {
    pub topic_id: TopicId,
    pub topic_name: String,
    pub doc_id: DocId,
    pub rank: usize,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicTables {
    /// Sorted by size descending, then topic id
    pub topics: Vec<TopicRow>,
    /// Grouped in the same topic order, then by rank
    pub top_docs: Vec<TopDocRow>,
}

/// A topic's share of the clustered documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Repartition {
    pub topic_id: TopicId,
    pub name: String,
    pub size: usize,
    /// 0.0 to 1.0
    pub share: f64,
}

/// Build the topic table and the top-document table.
pub fn build_tables(topics: &[Topic], docs: &[Document]) -> TopicTables {
    let mut sizes: HashMap<&str, usize> = HashMap::new();
    for doc in docs {
        if let Some(topic_id) = doc.topic_id.as_deref() {
            *sizes.entry(topic_id).or_insert(0) += 1;
        }
    }
    let by_id: HashMap<&str, &Document> = docs.iter().map(|d| (d.doc_id.as_str(), d)).collect();

    let mut ordered: Vec<&Topic> = topics.iter().collect();
    ordered.sort_by(|a, b| {
        let sa = sizes.get(a.topic_id.as_str()).copied().unwrap_or(0);
        let sb = sizes.get(b.topic_id.as_str()).copied().unwrap_or(0);
        sb.cmp(&sa).then_with(|| a.topic_id.cmp(&b.topic_id))
    });

    let mut tables = TopicTables::default();
    for topic in ordered {
        tables.topics.push(TopicRow {
            topic_id: topic.topic_id.clone(),
            name: topic.name.clone(),
            size: sizes.get(topic.topic_id.as_str()).copied().unwrap_or(0),
            x_centroid: topic.x_centroid,
            y_centroid: topic.y_centroid,
            top_terms: topic.term_ids.clone(),
        });

        let present = topic
            .top_doc_ids
            .iter()
            .filter_map(|id| by_id.get(id.as_str()))
            .filter(|d| d.topic_id.as_deref() == Some(topic.topic_id.as_str()));
        for (i, doc) in present.enumerate() {
            tables.top_docs.push(TopDocRow {
                topic_id: topic.topic_id.clone(),
                topic_name: topic.name.clone(),
                doc_id: doc.doc_id.clone(),
                rank: doc.rank.unwrap_or(i + 1),
                content: doc.content.clone(),
            });
        }
    }

    tables
}

/// Topic sizes and shares, largest first.
pub fn topic_repartition(tables: &TopicTables) -> Vec<Repartition> {
    let total: usize = tables.topics.iter().map(|t| t.size).sum();
    tables
        .topics
        .iter()
        .map(|t| Repartition {
            topic_id: t.topic_id.clone(),
            name: t.name.clone(),
            size: t.size,
            share: if total == 0 {
                0.0
            } else {
                t.size as f64 / total as f64
            },
        })
        .collect()
}
