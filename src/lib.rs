// topicmap: topic modeling and 2D topic maps for text corpora
//
// This is the library root. Each module corresponds to a stage or an
// external collaborator of the topic pipeline.

pub mod config;
pub mod embeddings;
pub mod export;
pub mod input;
pub mod llm;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod projection;
pub mod rag;
pub mod state;
pub mod status;
pub mod topics;
