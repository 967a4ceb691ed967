// Explicit pipeline state, threaded through every stage by value.
//
// Each stage takes a PipelineState, checks it has reached the stage it
// depends on, and returns the advanced state. Between CLI commands the state
// lives in a JSON file.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Language;
use crate::models::{Document, Topic};
use crate::topics::cluster::ClusterSummary;
use crate::topics::params::ResolvedTopicParams;
use crate::topics::terms::TermTable;

/// How far the pipeline has progressed. Ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Documents embedded, projected and their terms extracted
    Fitted,
    /// Documents assigned to clusters, top terms selected
    Clustered,
    /// Documents ranked within their topics
    Ranked,
    /// Topics carry auto-generated names
    Named,
    /// Topic names rewritten by a generative model
    Refined,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fitted => "fitted",
            Self::Clustered => "clustered",
            Self::Ranked => "ranked",
            Self::Named => "named",
            Self::Refined => "refined",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub language: Language,
    pub docs: Vec<Document>,
    /// Corpus term table from fit time (every n-gram size)
    pub terms: TermTable,
    pub topics: Vec<Topic>,
    pub stage: Stage,
    /// Requested vs produced clusters from the last clustering
    pub clustering: Option<ClusterSummary>,
    /// Parameters of the last topic run
    pub params: Option<ResolvedTopicParams>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PipelineState {
    /// A freshly fitted state.
    pub fn fitted(language: Language, docs: Vec<Document>, terms: TermTable) -> Self {
        let now = Utc::now();
        Self {
            language,
            docs,
            terms,
            topics: Vec::new(),
            stage: Stage::Fitted,
            clustering: None,
            params: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fail unless the pipeline has reached at least `stage`.
    pub fn require(&self, stage: Stage, action: &str) -> Result<()> {
        if self.stage < stage {
            anyhow::bail!(
                "Cannot {action}: the pipeline is only {}, it must be {stage} first",
                self.stage
            );
        }
        Ok(())
    }

    /// Parameters of the last topic run, or a precondition error.
    pub fn resolved_params(&self, action: &str) -> Result<&ResolvedTopicParams> {
        self.params
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Cannot {action}: no topic parameters recorded, run clustering first"))
    }

    /// Move to `stage` and bump `updated_at`.
    pub fn advance(mut self, stage: Stage) -> Self {
        debug!(from = %self.stage, to = %stage, "Pipeline stage change");
        self.stage = stage;
        self.updated_at = Utc::now();
        self
    }

    pub fn has_topics(&self) -> bool {
        self.stage >= Stage::Clustered && !self.topics.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let json = serde_json::to_vec(self).context("Failed to serialize pipeline state")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write state file {}", path.display()))?;
        debug!(path = %path.display(), stage = %self.stage, "Saved pipeline state");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "No pipeline state at {}\nRun `topicmap fit <file>` first.",
                path.display()
            );
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("State file {} is not valid", path.display()))
    }
}
