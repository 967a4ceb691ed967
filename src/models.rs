// Core records shared by every pipeline stage.
//
// These are plain serializable structs. Stages never hold references into
// each other's data; they receive owned vectors and hand back owned vectors,
// so the same records can be written straight to the state file and to the
// web export.

use serde::{Deserialize, Serialize};

/// Identifier of a document. Either supplied by the caller or generated.
pub type DocId = String;

/// Identifier of a topic, `bt-<n>`.
pub type TopicId = String;

/// A single document moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: DocId,
    pub content: String,
    /// Projected 2D coordinates. Zero until the projection stage runs.
    pub x: f64,
    pub y: f64,
    pub embedding: Vec<f32>,
    /// Unique terms of this document, in order of first appearance.
    pub term_ids: Vec<String>,
    pub topic_id: Option<TopicId>,
    /// 1-based position within its topic after ranking.
    pub rank: Option<usize>,
    /// Term-overlap score with its topic's top terms.
    pub relevance: Option<f64>,
}

impl Document {
    /// A freshly ingested document with nothing computed yet.
    pub fn new(doc_id: impl Into<DocId>, content: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            content: content.into(),
            x: 0.0,
            y: 0.0,
            embedding: Vec::new(),
            term_ids: Vec::new(),
            topic_id: None,
            rank: None,
            relevance: None,
        }
    }
}

/// A normalized n-gram from the corpus term table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// The normalized n-gram itself; unique within a corpus.
    pub term_id: String,
    /// Number of words in the n-gram.
    pub ngram: usize,
    /// Total occurrences across the corpus.
    pub count: usize,
}

/// Where a topic's current name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameOrigin {
    /// Built from the topic's top terms.
    Auto,
    /// Rewritten by a generative model.
    Refined,
    /// Set by hand through `rename_topics`.
    Manual,
}

/// A named cluster of documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: TopicId,
    pub name: String,
    pub name_origin: NameOrigin,
    pub x_centroid: f64,
    pub y_centroid: f64,
    pub size: usize,
    /// Every member, best ranked first.
    pub member_ids: Vec<DocId>,
    /// Prefix of `member_ids` kept as representative documents.
    pub top_doc_ids: Vec<DocId>,
    /// Most frequent vocabulary terms among the members.
    pub term_ids: Vec<String>,
}

impl Topic {
    /// An unnamed topic straight out of the clusterer.
    pub fn from_cluster(topic_id: TopicId, centroid: (f64, f64), member_ids: Vec<DocId>) -> Self {
        Self {
            name: String::new(),
            name_origin: NameOrigin::Auto,
            x_centroid: centroid.0,
            y_centroid: centroid.1,
            size: member_ids.len(),
            member_ids,
            top_doc_ids: Vec::new(),
            term_ids: Vec::new(),
            topic_id,
        }
    }
}

/// A raw document as handed to `fit`, before ids are settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDocument {
    #[serde(default)]
    pub id: Option<DocId>,
    pub content: String,
}

impl InputDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
        }
    }

    pub fn with_id(id: impl Into<DocId>, content: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            content: content.into(),
        }
    }
}
