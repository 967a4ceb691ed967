use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use topicmap::config::{Config, Language};
use topicmap::embeddings::download::embedding_model_dir;
use topicmap::embeddings::onnx::SentenceEmbedder;
use topicmap::llm::client::ChatClient;
use topicmap::output::{markdown, terminal};
use topicmap::pipeline;
use topicmap::projection::PcaProjector;
use topicmap::state::{PipelineState, Stage};
use topicmap::topics::aggregate::{build_tables, topic_repartition};
use topicmap::topics::params::TopicParams;
use topicmap::topics::refine::TopicRefiner;
use topicmap::topics::{cleaning, coherence};

/// topicmap: topic modeling and 2D topic maps for text corpora.
///
/// Embeds documents, lays them out on a 2D map, clusters the map into
/// topics, names and ranks them, and exports everything for a web viewer.
#[derive(Parser)]
#[command(name = "topicmap", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed, project and extract terms from a corpus
    Fit {
        /// Input file (.json, .jsonl, or plain text with one document per line)
        input: PathBuf,

        /// Corpus language (defaults to TOPICMAP_LANGUAGE or english)
        #[arg(long)]
        language: Option<Language>,
    },

    /// Cluster the map into named, ranked topics
    Topics {
        /// Number of topics to ask for
        #[arg(long, default_value = "5")]
        n_clusters: usize,

        /// N-gram sizes used for naming and ranking (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "1,2")]
        ngrams: Vec<usize>,

        /// Terms in an auto-generated topic name
        #[arg(long, default_value = "5")]
        name_length: usize,

        /// Cap on the overall vocabulary
        #[arg(long, default_value = "2000")]
        top_terms_overall: usize,

        /// Minimum occurrences for a term to be considered (relaxed to 1 for small corpora)
        #[arg(long, default_value = "2")]
        min_count_terms: usize,

        /// Top terms kept per topic
        #[arg(long, default_value = "20")]
        ranking_terms: usize,

        /// Representative documents kept per topic
        #[arg(long, default_value = "10")]
        top_docs: usize,

        #[arg(long, default_value = "42")]
        seed: u64,

        /// Documents shown per topic in the terminal
        #[arg(long, default_value = "3")]
        show_docs: usize,
    },

    /// Rename topics with the configured language model
    CleanNames {
        /// Domain of the corpus, used in the prompt
        #[arg(long, default_value = "everything")]
        context: String,

        /// Include representative documents in the prompt
        #[arg(long)]
        use_doc: bool,

        #[arg(long, default_value = "10")]
        top_terms: usize,

        #[arg(long, default_value = "3")]
        top_docs: usize,
    },

    /// Rename topics by hand: `topicmap rename bt-0="Energy policy"`
    Rename {
        /// TOPIC_ID=NAME pairs; an empty name keeps the current one
        #[arg(required = true)]
        renames: Vec<String>,
    },

    /// Keep only the documents of the given topics and write them as JSON
    Filter {
        /// Topic ids to keep (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        keep: Vec<String>,

        #[arg(long, default_value = "topicmap-cleaned.json")]
        output: PathBuf,
    },

    /// Score topic coherence (UMass)
    Coherence {
        /// Top terms per topic to score
        #[arg(long, default_value = "10")]
        top_n: usize,
    },

    /// Answer a question from the most similar documents
    Rag {
        query: String,

        /// Documents retrieved as context
        #[arg(long, default_value = "2")]
        top_doc: usize,
    },

    /// Write a markdown report of the topics
    Report {
        #[arg(long, default_value = "topicmap-report.md")]
        output: PathBuf,

        /// Documents listed per topic
        #[arg(long, default_value = "5")]
        docs: usize,
    },

    /// Write the web viewer's JSON files
    Export {
        /// Target directory (defaults to <TOPICMAP_WEB_DIR>/public)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Export and start the web viewer (`npm start`)
    Serve {
        #[arg(long, default_value = "3000")]
        port: u16,
    },

    /// Show pipeline status
    Status,

    /// Download the sentence embedding model
    DownloadModel {
        /// Language whose model to fetch (defaults to TOPICMAP_LANGUAGE or english)
        #[arg(long)]
        language: Option<Language>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("topicmap=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Fit { input, language } => {
            let language = language.unwrap_or(config.language);
            config.require_embedding_model(language)?;

            let inputs = topicmap::input::load_documents(&input)?;
            println!("Embedding {} documents ({language})...", inputs.len());

            let embedder = load_embedder(&config, language)?;
            let projector = PcaProjector::default();
            let state = pipeline::fit::fit(inputs, language, &embedder, &projector).await?;
            state.save(&config.state_path)?;

            println!(
                "Fitted {} documents, {} candidate terms.",
                state.docs.len(),
                state.terms.len()
            );
            println!("\nNext: run `topicmap topics --n-clusters 5`");
        }

        Commands::Topics {
            n_clusters,
            ngrams,
            name_length,
            top_terms_overall,
            min_count_terms,
            ranking_terms,
            top_docs,
            seed,
            show_docs,
        } => {
            let state = PipelineState::load(&config.state_path)?;
            let params = TopicParams {
                n_clusters,
                ngrams,
                name_length,
                top_terms_overall,
                min_count_terms,
                ranking_terms,
                top_docs,
                seed,
            };

            let state = pipeline::topics::fit_topics(state, &params)?;
            state.save(&config.state_path)?;

            let tables = build_tables(&state.topics, &state.docs);
            terminal::display_topic_table(&tables);
            if let Some(summary) = &state.clustering {
                terminal::display_cluster_summary(summary);
            }
            terminal::display_repartition(&topic_repartition(&tables));
            if show_docs > 0 {
                terminal::display_top_docs(&tables, show_docs);
            }
        }

        Commands::CleanNames {
            context,
            use_doc,
            top_terms,
            top_docs,
        } => {
            config.require_llm()?;
            let state = PipelineState::load(&config.state_path)?;
            let client = ChatClient::from_config(&config)?;
            let refiner = TopicRefiner {
                language: state.language,
                context,
                use_doc,
                top_terms,
                top_docs,
                ..TopicRefiner::default()
            };

            println!(
                "Cleaning {} topic names with {}...",
                state.topics.len(),
                config.llm_model
            );
            let (state, report) = pipeline::topics::refine_stage(state, &refiner, &client).await?;
            state.save(&config.state_path)?;

            terminal::display_refine_report(&report);
            terminal::display_topic_table(&build_tables(&state.topics, &state.docs));
        }

        Commands::Rename { renames } => {
            let mut state = PipelineState::load(&config.state_path)?;
            state.require(Stage::Named, "rename topics")?;

            let renames = parse_renames(&renames)?;
            state.topics = cleaning::rename_topics(std::mem::take(&mut state.topics), &renames)?;
            let stage = state.stage;
            let state = state.advance(stage);
            state.save(&config.state_path)?;

            terminal::display_topic_table(&build_tables(&state.topics, &state.docs));
        }

        Commands::Filter { keep, output } => {
            let state = PipelineState::load(&config.state_path)?;
            state.require(Stage::Clustered, "filter documents by topic")?;

            let cleaned = cleaning::filter_by_topics(&state.docs, &state.topics, &keep);
            topicmap::export::write_json(&output, &cleaned.rows)?;

            terminal::display_cleaned(&cleaned);
            println!("Wrote {}", output.display());
        }

        Commands::Coherence { top_n } => {
            let state = PipelineState::load(&config.state_path)?;
            state.require(Stage::Clustered, "score coherence")?;

            let report = coherence::umass_coherence(&state.topics, &state.docs, top_n);
            terminal::display_coherence(&report);
        }

        Commands::Rag { query, top_doc } => {
            config.require_llm()?;
            let state = PipelineState::load(&config.state_path)?;
            config.require_embedding_model(state.language)?;

            let embedder = load_embedder(&config, state.language)?;
            let client = ChatClient::from_config(&config)?;
            let answer = topicmap::rag::answer(&query, &state, &embedder, &client, top_doc).await?;
            terminal::display_rag_answer(&answer);
        }

        Commands::Report { output, docs } => {
            let state = PipelineState::load(&config.state_path)?;
            state.require(Stage::Named, "write a report")?;

            let tables = build_tables(&state.topics, &state.docs);
            let report = markdown::render_report(&state, &tables, docs);
            markdown::write_report(&output, &report)?;
            println!("Report written to {}", output.display());
        }

        Commands::Export { dir } => {
            let state = PipelineState::load(&config.state_path)?;
            let dir = dir.unwrap_or_else(|| config.web_dir.join("public"));
            let paths = topicmap::export::write_web_data(&state, &dir)?;
            println!("Wrote {} and {}", paths.docs.display(), paths.topics.display());
        }

        Commands::Serve { port } => {
            let state = PipelineState::load(&config.state_path)?;
            topicmap::export::write_web_data(&state, &config.web_dir.join("public"))?;

            let child = topicmap::export::serve::start(&config.web_dir, port)?;
            info!(pid = child.id(), "Web viewer starting");
            println!(
                "{}",
                format!("Web viewer starting on http://localhost:{port}").bold()
            );
        }

        Commands::Status => {
            topicmap::status::show(&config)?;
        }

        Commands::DownloadModel { language } => {
            let language = language.unwrap_or(config.language);
            let model_dir = &config.model_dir;

            println!("Downloading ONNX embedding model...");
            println!("  Destination: {}", model_dir.display());

            topicmap::embeddings::download::download_model(model_dir, language).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `topicmap fit <file>`.");
        }
    }

    Ok(())
}

fn load_embedder(config: &Config, language: Language) -> Result<SentenceEmbedder> {
    let dir = embedding_model_dir(&config.model_dir, language);
    Ok(SentenceEmbedder::load(&dir)?.with_progress(true))
}

/// Parse `TOPIC_ID=NAME` arguments.
fn parse_renames(pairs: &[String]) -> Result<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            let (id, name) = pair
                .split_once('=')
                .with_context(|| format!("Expected TOPIC_ID=NAME, got '{pair}'"))?;
            Ok((id.trim().to_string(), name.to_string()))
        })
        .collect()
}
