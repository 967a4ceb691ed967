// Model download helper for the sentence-embedding models.
//
// English corpora use all-MiniLM-L6-v2 (~90MB); other languages use
// paraphrase-multilingual-MiniLM-L12-v2 (~470MB). Each lives in its own
// subdirectory of a platform data directory
// (~/.local/share/topicmap/models/ on Linux) so it persists across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::Language;

const HF_BASE_URL: &str = "https://huggingface.co";

/// Remote paths inside a HuggingFace repo, and local names.
const REMOTE_MODEL_FILE: &str = "onnx/model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";
const MODEL_FILE: &str = "model.onnx";

/// Returns the default directory for storing model files.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("topicmap")
        .join("models")
}

/// Subdirectory within `base` holding the model for `language`.
pub fn embedding_model_dir(base: &Path, language: Language) -> PathBuf {
    let repo = language.embedding_repo();
    let name = repo.rsplit('/').next().unwrap_or(repo);
    base.join(name)
}

/// Check whether the model and tokenizer for `language` exist.
pub fn embedding_files_present(base: &Path, language: Language) -> bool {
    let dir = embedding_model_dir(base, language);
    dir.join(MODEL_FILE).exists() && dir.join(TOKENIZER_FILE).exists()
}

/// Download the embedding model for `language` into `base`.
///
/// Skips files that already exist; creates directories as needed.
pub async fn download_model(base: &Path, language: Language) -> Result<()> {
    let repo = language.embedding_repo();
    let dir = embedding_model_dir(base, language);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    println!("\nSentence embedding model ({repo}):");

    for (remote, local, large) in [
        (TOKENIZER_FILE, TOKENIZER_FILE, false),
        (REMOTE_MODEL_FILE, MODEL_FILE, true),
    ] {
        let dest = dir.join(local);
        if dest.exists() {
            info!(file = local, "Model file already exists, skipping");
            println!("  {local} (already exists)");
            continue;
        }
        println!("  Downloading {local}...");
        download_file(&format!("{HF_BASE_URL}/{repo}/resolve/main/{remote}"), &dest, large).await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar while streaming.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = show_progress.then(|| match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        }
    });

    // Write to a temp name first so an interrupted download never looks complete
    let partial = dest.with_extension("part");
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.context("Failed to read response body")? {
        bytes.extend_from_slice(&chunk);
        if let Some(pb) = &pb {
            pb.set_position(bytes.len() as u64);
        }
    }

    std::fs::write(&partial, &bytes)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move {} into place", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}
