// Manual cleanup: renaming topics and keeping only selected topics.
//
// Both take an explicit selection instead of prompting, so a CLI, a web UI
// or a test can drive them the same way.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{DocId, Document, NameOrigin, Topic, TopicId};

/// A document that survived topic filtering, joined with its topic name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRow {
    pub doc_id: DocId,
    pub content: String,
    pub topic_id: TopicId,
    pub topic_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedCorpus {
    pub rows: Vec<CleanedRow>,
    /// Share of all documents kept, 0.0 to 100.0
    pub percent_kept: f64,
}

/// Apply `topic_id → new name`. Blank names leave the topic as it was.
/// Every id must exist; nothing is changed if one does not.
pub fn rename_topics(mut topics: Vec<Topic>, renames: &HashMap<TopicId, String>) -> Result<Vec<Topic>> {
    let known: HashSet<&str> = topics.iter().map(|t| t.topic_id.as_str()).collect();
    let mut unknown: Vec<&str> = renames
        .keys()
        .map(String::as_str)
        .filter(|id| !known.contains(id))
        .collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        anyhow::bail!("Unknown topic id(s): {}", unknown.join(", "));
    }

    let mut changed = 0;
    for topic in &mut topics {
        if let Some(name) = renames.get(&topic.topic_id) {
            let name = name.trim();
            if !name.is_empty() && name != topic.name {
                topic.name = name.to_string();
                topic.name_origin = NameOrigin::Manual;
                changed += 1;
            }
        }
    }
    info!(changed, "Applied topic renames");

    Ok(topics)
}

/// Keep only documents belonging to `keep`, joined with their topic names.
pub fn filter_by_topics(docs: &[Document], topics: &[Topic], keep: &[TopicId]) -> CleanedCorpus {
    let names: HashMap<&str, &str> = topics
        .iter()
        .filter(|t| keep.contains(&t.topic_id))
        .map(|t| (t.topic_id.as_str(), t.name.as_str()))
        .collect();

    let rows: Vec<CleanedRow> = docs
        .iter()
        .filter_map(|d| {
            let topic_id = d.topic_id.as_deref()?;
            let topic_name = names.get(topic_id)?;
            Some(CleanedRow {
                doc_id: d.doc_id.clone(),
                content: d.content.clone(),
                topic_id: topic_id.to_string(),
                topic_name: topic_name.to_string(),
            })
        })
        .collect();

    let percent_kept = if docs.is_empty() {
        0.0
    } else {
        (rows.len() as f64 / docs.len() as f64 * 10000.0).round() / 100.0
    };
    info!("After cleaning, you've kept {percent_kept}% of your data");

    CleanedCorpus { rows, percent_kept }
}
