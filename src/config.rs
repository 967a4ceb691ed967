use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use stop_words::LANGUAGE;

/// Corpus language. Drives stop-word lists for term extraction and the
/// default sentence-embedding model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    French,
    German,
    Spanish,
    Italian,
    Portuguese,
}

impl Language {
    /// Stop words for this language, lowercased.
    pub fn stop_words(self) -> Vec<String> {
        let lang = match self {
            Self::English => LANGUAGE::English,
            Self::French => LANGUAGE::French,
            Self::German => LANGUAGE::German,
            Self::Spanish => LANGUAGE::Spanish,
            Self::Italian => LANGUAGE::Italian,
            Self::Portuguese => LANGUAGE::Portuguese,
        };
        stop_words::get(lang)
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect()
    }

    /// HuggingFace repository of the default embedding model.
    ///
    /// English gets the small monolingual MiniLM; everything else uses the
    /// multilingual paraphrase model. Both produce 384-dim vectors.
    pub fn embedding_repo(self) -> &'static str {
        match self {
            Self::English => "sentence-transformers/all-MiniLM-L6-v2",
            _ => "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::French => "french",
            Self::German => "german",
            Self::Spanish => "spanish",
            Self::Italian => "italian",
            Self::Portuguese => "portuguese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "french" | "fr" => Ok(Self::French),
            "german" | "de" => Ok(Self::German),
            "spanish" | "es" => Ok(Self::Spanish),
            "italian" | "it" => Ok(Self::Italian),
            "portuguese" | "pt" => Ok(Self::Portuguese),
            other => Err(format!(
                "unsupported language '{other}' (expected english, french, german, spanish, italian or portuguese)"
            )),
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy. Per-run topic parameters
/// are not here; they come from CLI flags into `TopicParams`.
pub struct Config {
    /// Where the pipeline state is persisted between commands
    pub state_path: PathBuf,
    /// Directory containing the ONNX embedding models
    pub model_dir: PathBuf,
    /// Root of the JavaScript front end (`public/` receives the JSON files)
    pub web_dir: PathBuf,
    pub language: Language,
    /// OpenAI-compatible endpoint used for topic naming and RAG answers
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_requests_per_second: f64,
}

impl Config {
    /// Load configuration from environment variables. Everything has a default.
    pub fn load() -> Result<Self> {
        let language = match env::var("TOPICMAP_LANGUAGE") {
            Ok(raw) => raw.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            Err(_) => Language::default(),
        };

        let llm_requests_per_second = match env::var("LLM_REQUESTS_PER_SECOND") {
            Ok(raw) => {
                let rps: f64 = raw.parse().map_err(|_| {
                    anyhow::anyhow!("LLM_REQUESTS_PER_SECOND must be a number, got '{raw}'")
                })?;
                if !rps.is_finite() || rps <= 0.0 {
                    anyhow::bail!("LLM_REQUESTS_PER_SECOND must be positive, got {rps}");
                }
                rps
            }
            Err(_) => 2.0,
        };

        Ok(Self {
            state_path: env::var("TOPICMAP_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./topicmap-state.json")),
            model_dir: env::var("TOPICMAP_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| crate::embeddings::download::default_model_dir()),
            web_dir: env::var("TOPICMAP_WEB_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./web")),
            language,
            llm_base_url: env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:1234/v1".to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "qwen/qwen3-8b".to_string()),
            llm_api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty()),
            llm_requests_per_second,
        })
    }

    /// Check that the LLM endpoint looks usable.
    /// Call this before topic-name cleaning or RAG queries.
    pub fn require_llm(&self) -> Result<()> {
        if self.llm_base_url.trim().is_empty() {
            anyhow::bail!(
                "LLM_BASE_URL is empty. Point it at an OpenAI-compatible endpoint \
                 (e.g. http://localhost:1234/v1) in your .env file."
            );
        }
        if self.llm_model.trim().is_empty() {
            anyhow::bail!("LLM_MODEL is empty. Set it in your .env file.");
        }
        Ok(())
    }

    /// Check that the embedding model for `language` has been downloaded.
    pub fn require_embedding_model(&self, language: Language) -> Result<()> {
        if !crate::embeddings::download::embedding_files_present(&self.model_dir, language) {
            anyhow::bail!(
                "Embedding model for {} not found in {}\n\
                 Run `topicmap download-model --language {}` to download it.",
                language,
                self.model_dir.display(),
                language
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse_aliases() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
        assert_eq!(" french ".parse::<Language>().unwrap(), Language::French);
        assert_eq!("pt".parse::<Language>().unwrap(), Language::Portuguese);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn test_non_english_uses_multilingual_model() {
        assert!(Language::English.embedding_repo().ends_with("all-MiniLM-L6-v2"));
        assert!(Language::German.embedding_repo().contains("multilingual"));
    }

    #[test]
    fn test_english_stop_words_lowercase() {
        let words = Language::English.stop_words();
        assert!(words.iter().any(|w| w == "the"));
        assert!(words.iter().all(|w| *w == w.to_lowercase()));
    }
}
