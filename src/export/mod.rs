// Export for the JavaScript topic-map front end.
//
// The front end reads two JSON arrays from its `public/` directory: every
// document record and every topic record, each with its full attribute set.

pub mod serve;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::state::{PipelineState, Stage};

pub const DOCS_FILE: &str = "topicmap_docs.json";
pub const TOPICS_FILE: &str = "topicmap_topics.json";

/// Paths written by `write_web_data`.
#[derive(Debug, Clone, PartialEq)]
pub struct WebData {
    pub docs: PathBuf,
    pub topics: PathBuf,
}

/// Write the document and topic files into `dir`.
///
/// Requires named topics; the front end labels every region by topic name.
pub fn write_web_data(state: &PipelineState, dir: &Path) -> Result<WebData> {
    if !state.has_topics() {
        anyhow::bail!("No topics available. Run `topicmap topics` first.");
    }
    state.require(Stage::Named, "export web data")?;

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let paths = WebData {
        docs: dir.join(DOCS_FILE),
        topics: dir.join(TOPICS_FILE),
    };
    write_json(&paths.docs, &state.docs)?;
    write_json(&paths.topics, &state.topics)?;

    info!(
        docs = state.docs.len(),
        topics = state.topics.len(),
        dir = %dir.display(),
        "Wrote web data"
    );
    Ok(paths)
}

pub fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_vec(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
