// Colored terminal output for topic tables, repartition and query results.
//
// This module handles all terminal-specific formatting: colors, tables,
// bars. The main.rs command handlers delegate here.

use colored::Colorize;

use crate::models::NameOrigin;
use crate::rag::RagAnswer;
use crate::topics::aggregate::{Repartition, TopicTables};
use crate::topics::cleaning::CleanedCorpus;
use crate::topics::cluster::ClusterSummary;
use crate::topics::coherence::CoherenceReport;
use crate::topics::refine::RefineReport;

/// Display the topic table.
pub fn display_topic_table(tables: &TopicTables) {
    if tables.topics.is_empty() {
        println!("No topics yet. Run `topicmap topics` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Topics ({}) ===", tables.topics.len()).bold()
    );
    println!();

    println!(
        "  {:<6} {:<48} {:>6}  {:>16}",
        "Id".dimmed(),
        "Name".dimmed(),
        "Size".dimmed(),
        "Centroid".dimmed(),
    );
    println!("  {}", "-".repeat(80).dimmed());

    for row in &tables.topics {
        let name = super::truncate_chars(&row.name, 45);
        let size = if row.size == 0 {
            row.size.to_string().dimmed()
        } else {
            row.size.to_string().normal()
        };
        println!(
            "  {:<6} {:<48} {:>6}  ({:>6.2}, {:>6.2})",
            row.topic_id,
            name.bold(),
            size,
            row.x_centroid,
            row.y_centroid,
        );
        if !row.top_terms.is_empty() {
            let terms: Vec<&str> = row.top_terms.iter().take(8).map(String::as_str).collect();
            println!("         {}", terms.join(", ").dimmed());
        }
    }
    println!();
}

/// Display the top documents of each topic, `per_topic` at most.
pub fn display_top_docs(tables: &TopicTables, per_topic: usize) {
    for topic in &tables.topics {
        let docs: Vec<_> = tables
            .top_docs
            .iter()
            .filter(|d| d.topic_id == topic.topic_id)
            .take(per_topic)
            .collect();

        println!("{}", format!("{} ({})", topic.name, topic.topic_id).bold());
        if docs.is_empty() {
            println!("    {}", "(no documents)".dimmed());
        }
        for doc in docs {
            let preview = super::truncate_chars(doc.content.trim(), 120);
            println!("  {:>3}. {}", doc.rank, preview.dimmed());
        }
        println!();
    }
}

/// Horizontal bar per topic showing its share of the documents.
pub fn display_repartition(rows: &[Repartition]) {
    if rows.is_empty() {
        return;
    }
    println!("{}", "=== Topic Repartition ===".bold());
    println!();

    let bar_width: usize = 30;
    for row in rows {
        let filled = (row.share * bar_width as f64).round() as usize;
        let empty = bar_width.saturating_sub(filled);
        let bar = format!("[{}{}]", "=".repeat(filled), " ".repeat(empty));

        let colored_bar = if row.share >= 0.25 {
            bar.bright_green()
        } else if row.share >= 0.10 {
            bar.bright_yellow()
        } else {
            bar.bright_blue()
        };

        println!(
            "  {:<40} {} {:>5.1}% ({})",
            super::truncate_chars(&row.name, 37),
            colored_bar,
            row.share * 100.0,
            row.size
        );
    }
    println!();
}

/// Note when fewer topics came out than were asked for.
pub fn display_cluster_summary(summary: &ClusterSummary) {
    if summary.is_degenerate() {
        println!(
            "  {} requested {} topics, only {} could be formed (not enough distinct points)",
            "!".yellow(),
            summary.requested,
            summary.produced
        );
    }
}

pub fn display_refine_report(report: &RefineReport) {
    println!(
        "  {} {} topic names cleaned",
        "✓".green(),
        report.refined.len()
    );
    for (topic_id, reason) in &report.failed {
        println!(
            "  {} {} kept its name ({})",
            "!".yellow(),
            topic_id,
            super::truncate_chars(reason, 80).dimmed()
        );
    }
}

pub fn display_coherence(report: &CoherenceReport) {
    println!("\n{}", "=== Topic Coherence (UMass) ===".bold());
    println!();
    for (topic_id, score) in &report.per_topic {
        match score {
            Some(s) => println!("  {:<8} {:>8.3}", topic_id, s),
            None => println!("  {:<8} {:>8}", topic_id, "n/a".dimmed()),
        }
    }
    match report.mean {
        Some(mean) => println!("\n  Mean coherence: {}", format!("{mean:.3}").bold()),
        None => println!("\n  Mean coherence: {}", "n/a".dimmed()),
    }
}

pub fn display_cleaned(cleaned: &CleanedCorpus) {
    println!(
        "  Kept {} documents ({}% of the corpus)",
        cleaned.rows.len(),
        cleaned.percent_kept
    );
}

pub fn display_rag_answer(answer: &RagAnswer) {
    println!("\n{}", "Answer:".bold());
    println!("{}", answer.answer);
    println!("\n{}", "Sources:".bold());
    for (i, source) in answer.sources.iter().enumerate() {
        let preview = super::truncate_chars(source.content.trim(), 140);
        println!(
            "  {}. [{} | sim {:.2}] {}",
            i + 1,
            source.doc_id,
            source.similarity,
            preview.dimmed()
        );
    }
}

/// Short tag for where a topic name came from.
pub fn colorize_origin(origin: NameOrigin) -> colored::ColoredString {
    match origin {
        NameOrigin::Auto => "auto".dimmed(),
        NameOrigin::Refined => "llm".cyan(),
        NameOrigin::Manual => "manual".green(),
    }
}
