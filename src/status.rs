// Status display: state file, pipeline stage, corpus and topic summary,
// model and LLM configuration.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::embeddings::download::embedding_files_present;
use crate::output::terminal::colorize_origin;
use crate::state::PipelineState;

/// Display pipeline status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    let model_status = if embedding_files_present(&config.model_dir, config.language) {
        "downloaded".green()
    } else {
        "missing (run `topicmap download-model`)".yellow()
    };
    println!(
        "Embedding model ({}): {}",
        config.language.embedding_repo(),
        model_status
    );
    println!("LLM: {} at {}", config.llm_model, config.llm_base_url);

    let path = config.state_path.as_path();
    if !path.exists() {
        println!("State: not fitted");
        println!("\nRun `topicmap fit <file>` to embed a corpus.");
        return Ok(());
    }

    let file_size = std::fs::metadata(path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("State: {} ({})", path.display(), file_size);

    let state = PipelineState::load(path)?;
    summarize(&state, path);
    Ok(())
}

fn summarize(state: &PipelineState, path: &Path) {
    println!("Stage: {}", state.stage.to_string().bold());
    println!(
        "Corpus: {} documents, {} candidate terms ({})",
        state.docs.len(),
        state.terms.len(),
        state.language
    );
    println!(
        "Created: {}  Updated: {}",
        state.created_at.format("%Y-%m-%d %H:%M:%S"),
        state.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(params) = &state.params {
        let relaxed = if params.min_count_relaxed {
            format!(" (relaxed from {})", params.requested_min_count_terms)
        } else {
            String::new()
        };
        println!(
            "Last topic run: {} clusters, ngrams {:?}, min term count {}{}",
            params.n_clusters, params.ngrams, params.min_count_terms, relaxed
        );
    }
    if let Some(summary) = &state.clustering {
        println!(
            "Topics: {} produced of {} requested",
            summary.produced, summary.requested
        );
    }

    if state.topics.is_empty() {
        println!("  Run `topicmap topics` to build topics");
        return;
    }
    for topic in &state.topics {
        println!(
            "  {:<6} [{:<6}] {:>5} docs  {}",
            topic.topic_id,
            colorize_origin(topic.name_origin),
            topic.size,
            topic.name
        );
    }
    println!("\n{}", format!("State file: {}", path.display()).dimmed());
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
