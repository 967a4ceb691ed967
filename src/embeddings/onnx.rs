// Local sentence embeddings with a MiniLM ONNX export.
//
// Texts are tokenized, run through the transformer, mean-pooled over the
// attention mask and L2-normalized, matching how sentence-transformers
// produces its vectors. Batches are chunked so long corpora don't build one
// giant padded tensor.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::{l2_normalize, Embedder};

/// Texts per inference call.
const CHUNK_SIZE: usize = 32;

/// Sentence embedder backed by a local ONNX model.
///
/// Arc<Mutex<Session>> because inference happens inside spawn_blocking.
pub struct SentenceEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    show_progress: bool,
}

impl SentenceEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        for path in [&model_path, &tokenizer_path] {
            if !path.exists() {
                anyhow::bail!(
                    "Embedding model file not found: {}\nRun `topicmap download-model` to download it.",
                    path.display()
                );
            }
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load embedding model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;

        debug!("Loaded sentence embedding model from {}", model_dir.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            show_progress: false,
        })
    }

    /// Show a progress bar while embedding.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

#[async_trait]
impl Embedder for SentenceEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let pb = if self.show_progress {
            let pb = ProgressBar::new(texts.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  Embedding [{bar:30}] {pos}/{len} ({eta})")
                    .expect("valid template"),
            );
            Some(pb)
        } else {
            None
        };

        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(CHUNK_SIZE) {
            let session = Arc::clone(&self.session);
            let tokenizer = Arc::clone(&self.tokenizer);
            let chunk = chunk.to_vec();

            let vectors = tokio::task::spawn_blocking(move || embed_sync(&session, &tokenizer, &chunk))
                .await
                .context("spawn_blocking panicked")??;

            if let Some(pb) = &pb {
                pb.inc(vectors.len() as u64);
            }
            out.extend(vectors);
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        Ok(out)
    }
}

/// Tokenize, run inference and mean-pool one chunk of texts.
fn embed_sync(
    session: &Arc<Mutex<Session>>,
    tokenizer: &Arc<Tokenizer>,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let encodings = texts
        .iter()
        .map(|t| {
            tokenizer
                .encode(t.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
        })
        .collect::<Result<Vec<_>>>()?;

    let batch_size = encodings.len();
    let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
    if max_len == 0 {
        return Ok(vec![vec![0.0; super::EMBEDDING_DIM]; batch_size]);
    }

    // Pad every sequence to max_len (pad id 0, mask 0)
    let mut input_ids = Vec::with_capacity(batch_size * max_len);
    let mut attention_mask = Vec::with_capacity(batch_size * max_len);
    for enc in &encodings {
        let ids = enc.get_ids();
        let pad = max_len - ids.len();
        input_ids.extend(ids.iter().map(|&id| id as i64));
        input_ids.extend(std::iter::repeat_n(0i64, pad));
        attention_mask.extend(enc.get_attention_mask().iter().map(|&m| m as i64));
        attention_mask.extend(std::iter::repeat_n(0i64, pad));
    }
    let token_type_ids = vec![0i64; batch_size * max_len];

    let shape = [batch_size as i64, max_len as i64];
    let input_ids_tensor =
        Tensor::from_array((shape, input_ids)).context("Failed to create input_ids tensor")?;
    let attention_mask_tensor = Tensor::from_array((shape, attention_mask.clone()))
        .context("Failed to create attention_mask tensor")?;
    let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids))
        .context("Failed to create token_type_ids tensor")?;

    // last_hidden_state: [batch, seq_len, hidden]
    let hidden = {
        let mut session = session
            .lock()
            .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

        let outputs = session
            .run(ort::inputs! {
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            })
            .context("Embedding ONNX inference failed")?;

        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract embedding output tensor")?;
        data.to_vec()
    };

    let dim = hidden.len() / (batch_size * max_len);
    if dim == 0 || hidden.len() != batch_size * max_len * dim {
        anyhow::bail!(
            "Unexpected embedding output size {} for batch {}x{}",
            hidden.len(),
            batch_size,
            max_len
        );
    }

    Ok(mean_pool(&hidden, &attention_mask, batch_size, max_len, dim))
}

/// Attention-masked mean over tokens, then L2 normalization.
fn mean_pool(hidden: &[f32], mask: &[i64], batch: usize, seq: usize, dim: usize) -> Vec<Vec<f32>> {
    (0..batch)
        .map(|i| {
            let mut sum = vec![0.0f32; dim];
            let mut count = 0.0f32;
            for j in 0..seq {
                if mask[i * seq + j] == 0 {
                    continue;
                }
                count += 1.0;
                let offset = (i * seq + j) * dim;
                for (s, h) in sum.iter_mut().zip(&hidden[offset..offset + dim]) {
                    *s += h;
                }
            }
            if count > 0.0 {
                for s in &mut sum {
                    *s /= count;
                }
            }
            l2_normalize(&mut sum);
            sum
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pool_ignores_padding() {
        // batch 1, seq 3, dim 2; last token is padding
        let hidden = vec![1.0, 0.0, 3.0, 0.0, 100.0, 100.0];
        let mask = vec![1, 1, 0];
        let pooled = mean_pool(&hidden, &mask, 1, 3, 2);
        // mean (2, 0) normalizes to (1, 0)
        assert!((pooled[0][0] - 1.0).abs() < 1e-6);
        assert!(pooled[0][1].abs() < 1e-6);
    }

    #[test]
    fn test_mean_pool_all_masked_is_zero() {
        let pooled = mean_pool(&[5.0, 5.0], &[0], 1, 1, 2);
        assert_eq!(pooled[0], vec![0.0, 0.0]);
    }

    #[test]
    fn test_load_missing_model_fails() {
        let dir = std::env::temp_dir().join("topicmap-test-no-model");
        assert!(SentenceEmbedder::load(&dir).is_err());
    }
}
