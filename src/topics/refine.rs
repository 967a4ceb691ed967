// Topic-name refinement with a generative model.
//
// Auto names are term lists ("solar | grid | power plant"). Refinement asks
// the model for a short label based on the current name, the top terms and,
// optionally, a few representative documents. A topic whose call fails or
// comes back empty keeps its name; the batch always runs to the end.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::Language;
use crate::llm::TextGenerator;
use crate::models::{Document, NameOrigin, Topic, TopicId};
use crate::output::truncate_chars;

/// Longest label accepted from the model, in characters.
const MAX_LABEL_CHARS: usize = 80;

/// Settings for one refinement pass.
#[derive(Debug, Clone)]
pub struct TopicRefiner {
    /// Language the labels should be written in
    pub language: Language,
    /// Domain the corpus belongs to, e.g. "computer science"
    pub context: String,
    /// Include representative document text in the prompt
    pub use_doc: bool,
    pub top_terms: usize,
    pub top_docs: usize,
    /// Per-document character budget in the prompt
    pub max_doc_chars: usize,
}

/// What happened to each topic during refinement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefineReport {
    pub refined: Vec<TopicId>,
    /// Topic id and the reason its name was kept
    pub failed: Vec<(TopicId, String)>,
}

impl Default for TopicRefiner {
    fn default() -> Self {
        Self {
            language: Language::English,
            context: "everything".to_string(),
            use_doc: false,
            top_terms: 10,
            top_docs: 3,
            max_doc_chars: 400,
        }
    }
}

impl TopicRefiner {
    /// Build the naming prompt for one topic.
    pub fn build_prompt(&self, topic: &Topic, docs: &HashMap<&str, &Document>) -> String {
        let terms = topic
            .term_ids
            .iter()
            .take(self.top_terms)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let mut prompt = format!(
            "I have a topic about {context} that is currently called \"{name}\".\n\
             It is described by the following keywords: {terms}.\n",
            context = self.context,
            name = topic.name,
        );

        if self.use_doc {
            let examples: Vec<String> = topic
                .top_doc_ids
                .iter()
                .take(self.top_docs)
                .filter_map(|id| docs.get(id.as_str()))
                .map(|d| format!("- {}", truncate_chars(d.content.trim(), self.max_doc_chars)))
                .collect();
            if !examples.is_empty() {
                prompt.push_str("The topic contains the following documents:\n");
                prompt.push_str(&examples.join("\n"));
                prompt.push('\n');
            }
        }

        prompt.push_str(&format!(
            "Based on the information above, give a short label for this topic \
             (at most five words) in {}. Reply with the label only.",
            self.language
        ));
        prompt
    }

    /// Refine every topic's name, sequentially.
    ///
    /// Never fails as a whole: per-topic failures are logged, recorded in the
    /// report, and the topic keeps its previous name. Only `name` and
    /// `name_origin` are modified.
    pub async fn refine(
        &self,
        generator: &dyn TextGenerator,
        mut topics: Vec<Topic>,
        docs: &[Document],
    ) -> (Vec<Topic>, RefineReport) {
        let by_id: HashMap<&str, &Document> =
            docs.iter().map(|d| (d.doc_id.as_str(), d)).collect();
        let mut report = RefineReport::default();

        for topic in &mut topics {
            let prompt = self.build_prompt(topic, &by_id);

            let outcome = match generator.generate(&prompt).await {
                Ok(reply) => clean_reply(&reply).ok_or_else(|| "empty reply".to_string()),
                Err(e) => Err(format!("{e:#}")),
            };

            match outcome {
                Ok(label) => {
                    info!(topic = %topic.topic_id, from = %topic.name, to = %label, "Refined topic name");
                    topic.name = label;
                    topic.name_origin = NameOrigin::Refined;
                    report.refined.push(topic.topic_id.clone());
                }
                Err(reason) => {
                    warn!(topic = %topic.topic_id, error = %reason, "Topic naming failed, keeping previous name");
                    report.failed.push((topic.topic_id.clone(), reason));
                }
            }
        }

        (topics, report)
    }
}

/// Extract a usable label from a raw model reply.
///
/// Drops reasoning blocks, takes the first non-empty line, strips list
/// markers, "Label:"-style prefixes, quotes and trailing punctuation.
pub fn clean_reply(raw: &str) -> Option<String> {
    let text = match raw.rfind("</think>") {
        Some(end) => &raw[end + "</think>".len()..],
        None => raw,
    };

    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line.trim_start_matches(['-', '*', '#', ' ']);

    let lower = line.to_lowercase();
    let line = ["topic label:", "label:", "topic:", "name:"]
        .iter()
        .find(|p| lower.starts_with(*p))
        .and_then(|p| line.get(p.len()..))
        .unwrap_or(line);

    let label = line
        .trim()
        .trim_end_matches(['.', ';', ':'])
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*' | '\u{201c}' | '\u{201d}'))
        .trim_end_matches(['.', ';', ':'])
        .trim();

    if label.is_empty() {
        None
    } else {
        Some(truncate_chars(label, MAX_LABEL_CHARS))
    }
}
