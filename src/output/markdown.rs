// Markdown report: topic table plus representative documents per topic.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use crate::state::PipelineState;
use crate::topics::aggregate::{topic_repartition, TopicTables};

/// Render the report for `state` and its tables.
pub fn render_report(state: &PipelineState, tables: &TopicTables, docs_per_topic: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Topic Report\n");
    let _ = writeln!(
        out,
        "Generated {} from {} documents ({}), pipeline stage: {}.\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M UTC"),
        state.docs.len(),
        state.language,
        state.stage
    );
    if let Some(summary) = state.clustering.filter(|s| s.is_degenerate()) {
        let _ = writeln!(
            out,
            "> {} topics were requested but only {} could be formed.\n",
            summary.requested, summary.produced
        );
    }

    let _ = writeln!(out, "## Topics\n");
    let _ = writeln!(out, "| Id | Name | Size | Share | Top terms |");
    let _ = writeln!(out, "|---|---|---:|---:|---|");
    let shares = topic_repartition(tables);
    for (row, share) in tables.topics.iter().zip(&shares) {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.1}% | {} |",
            row.topic_id,
            escape_cell(&row.name),
            row.size,
            share.share * 100.0,
            escape_cell(&row.top_terms.iter().take(8).cloned().collect::<Vec<_>>().join(", ")),
        );
    }

    let _ = writeln!(out, "\n## Top documents\n");
    for topic in &tables.topics {
        let _ = writeln!(out, "### {} ({})\n", topic.name, topic.topic_id);
        let docs: Vec<_> = tables
            .top_docs
            .iter()
            .filter(|d| d.topic_id == topic.topic_id)
            .take(docs_per_topic)
            .collect();
        if docs.is_empty() {
            let _ = writeln!(out, "_No documents._\n");
            continue;
        }
        for doc in docs {
            let flat = doc.content.split_whitespace().collect::<Vec<_>>().join(" ");
            let text = super::truncate_chars(&flat, 300);
            let _ = writeln!(out, "{}. {}", doc.rank, text);
        }
        out.push('\n');
    }

    out
}

/// Write the rendered report to `path`.
pub fn write_report(path: &Path, report: &str) -> Result<()> {
    std::fs::write(path, report)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

/// Pipes would break the table layout.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;
    use crate::models::{Document, Topic};
    use crate::topics::aggregate::build_tables;
    use crate::topics::terms::TermTable;

    #[test]
    fn test_report_contains_topics_and_docs() {
        let mut doc = Document::new("a", "Solar panels on every roof");
        doc.topic_id = Some("bt-0".into());
        doc.rank = Some(1);
        let mut topic = Topic::from_cluster("bt-0".into(), (0.0, 0.0), vec!["a".into()]);
        topic.name = "solar | roof".into();
        topic.top_doc_ids = vec!["a".into()];
        topic.term_ids = vec!["solar".into(), "roof".into()];

        let mut state = PipelineState::fitted(Language::English, vec![doc], TermTable::default());
        state.topics = vec![topic];
        let tables = build_tables(&state.topics, &state.docs);

        let report = render_report(&state, &tables, 3);
        assert!(report.contains("# Topic Report"));
        assert!(report.contains("| bt-0 | solar \\| roof | 1 | 100.0% | solar, roof |"));
        assert!(report.contains("1. Solar panels on every roof"));
    }
}
