// Unit tests for document ranking, topic naming and topic tables.
//
// Tests rank_documents ordering and determinism, the top-terms / auto-name
// pair, and build_tables behavior when documents have been filtered out.

use std::collections::HashSet;

use topicmap::models::{Document, NameOrigin, Term, Topic};
use topicmap::topics::aggregate::{build_tables, topic_repartition};
use topicmap::topics::naming::{auto_name, select_top_terms};
use topicmap::topics::ranking::{overlap_score, rank_documents};
use topicmap::topics::terms::TermTable;

fn doc(id: &str, topic: &str, terms: &[&str]) -> Document {
    let mut d = Document::new(id, format!("text of {id}"));
    d.topic_id = Some(topic.to_string());
    d.term_ids = terms.iter().map(|s| s.to_string()).collect();
    d
}

fn topic(id: &str, terms: &[&str]) -> Topic {
    let mut t = Topic::from_cluster(id.into(), (0.0, 0.0), vec![]);
    t.term_ids = terms.iter().map(|s| s.to_string()).collect();
    t
}

fn sample() -> (Vec<Document>, Vec<Topic>) {
    let docs = vec![
        doc("a", "bt-0", &["solar"]),
        doc("b", "bt-0", &["solar", "grid", "wind"]),
        doc("c", "bt-0", &["football"]),
        doc("d", "bt-0", &["grid", "solar"]),
        doc("e", "bt-1", &["football", "derby"]),
        doc("f", "bt-1", &["derby"]),
    ];
    let topics = vec![
        topic("bt-0", &["solar", "grid", "wind"]),
        topic("bt-1", &["derby", "football"]),
    ];
    (docs, topics)
}

// ============================================================
// rank_documents
// ============================================================

#[test]
fn members_ordered_by_overlap() {
    let (docs, topics) = sample();
    let (_, topics) = rank_documents(docs, topics, 10);
    assert_eq!(topics[0].member_ids, vec!["b", "d", "a", "c"]);
    assert_eq!(topics[1].member_ids, vec!["e", "f"]);
}

#[test]
fn ties_keep_corpus_order() {
    let docs = vec![
        doc("x", "bt-0", &["solar"]),
        doc("y", "bt-0", &["grid"]),
        doc("z", "bt-0", &["wind"]),
    ];
    let (_, topics) = rank_documents(docs, vec![topic("bt-0", &["solar", "grid", "wind"])], 10);
    assert_eq!(topics[0].member_ids, vec!["x", "y", "z"]);
}

#[test]
fn ranking_is_deterministic() {
    let (docs, topics) = sample();
    let first = rank_documents(docs.clone(), topics.clone(), 2);
    let second = rank_documents(docs, topics, 2);
    assert_eq!(first, second);
}

#[test]
fn top_docs_are_a_prefix_of_members() {
    let (docs, topics) = sample();
    let (_, topics) = rank_documents(docs, topics, 2);
    for t in &topics {
        assert!(t.top_doc_ids.len() <= 2);
        assert_eq!(t.top_doc_ids[..], t.member_ids[..t.top_doc_ids.len()]);
    }
}

#[test]
fn documents_get_rank_and_relevance() {
    let (docs, topics) = sample();
    let (docs, _) = rank_documents(docs, topics, 10);
    let b = docs.iter().find(|d| d.doc_id == "b").unwrap();
    assert_eq!(b.rank, Some(1));
    assert_eq!(b.relevance, Some(3.0));
    let c = docs.iter().find(|d| d.doc_id == "c").unwrap();
    assert_eq!(c.rank, Some(4));
    assert_eq!(c.relevance, Some(0.0));
}

#[test]
fn sizes_match_membership() {
    let (docs, topics) = sample();
    let total = docs.len();
    let (_, topics) = rank_documents(docs, topics, 1);
    assert_eq!(topics.iter().map(|t| t.size).sum::<usize>(), total);
    for t in &topics {
        assert_eq!(t.size, t.member_ids.len());
    }
}

#[test]
fn overlap_counts_shared_terms() {
    let terms: HashSet<&str> = ["solar", "grid"].into_iter().collect();
    let doc_terms = vec!["grid".to_string(), "wind".to_string(), "solar".to_string()];
    assert_eq!(overlap_score(&doc_terms, &terms), 2.0);
    assert_eq!(overlap_score(&[], &terms), 0.0);
}

// ============================================================
// select_top_terms + auto_name
// ============================================================

#[test]
fn auto_names_from_member_terms() {
    let (docs, _) = sample();
    let vocab = TermTable::from_terms(
        [("solar", 3), ("grid", 2), ("wind", 1), ("football", 2), ("derby", 2)]
            .into_iter()
            .map(|(t, c)| Term {
                term_id: t.to_string(),
                ngram: 1,
                count: c,
            })
            .collect(),
    );
    let topics = vec![topic("bt-0", &[]), topic("bt-1", &[])];

    let topics = select_top_terms(topics, &docs, &vocab, 20);
    let topics = auto_name(topics, 2);

    assert_eq!(topics[0].term_ids[..2], ["solar", "grid"]);
    assert_eq!(topics[0].name, "solar | grid");
    assert_eq!(topics[1].name, "derby | football");
    assert!(topics.iter().all(|t| t.name_origin == NameOrigin::Auto));
}

#[test]
fn topic_without_terms_named_after_id() {
    let topics = auto_name(vec![topic("bt-3", &[])], 5);
    assert_eq!(topics[0].name, "Topic bt-3");
}

// ============================================================
// build_tables: filtered corpora
// ============================================================

#[test]
fn tables_tolerate_empty_topics() {
    let (docs, topics) = sample();
    let (docs, topics) = rank_documents(docs, topics, 2);

    // Drop every bt-1 document
    let remaining: Vec<Document> = docs
        .into_iter()
        .filter(|d| d.topic_id.as_deref() != Some("bt-1"))
        .collect();
    let tables = build_tables(&topics, &remaining);

    assert_eq!(tables.topics.len(), 2);
    let empty = tables.topics.iter().find(|r| r.topic_id == "bt-1").unwrap();
    assert_eq!(empty.size, 0);
    assert!(tables.top_docs.iter().all(|r| r.topic_id != "bt-1"));

    let shares = topic_repartition(&tables);
    let total: f64 = shares.iter().map(|s| s.share).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn top_doc_rows_follow_rank() {
    let (docs, topics) = sample();
    let (docs, topics) = rank_documents(docs, topics, 3);
    let tables = build_tables(&topics, &docs);

    let bt0: Vec<(&str, usize)> = tables
        .top_docs
        .iter()
        .filter(|r| r.topic_id == "bt-0")
        .map(|r| (r.doc_id.as_str(), r.rank))
        .collect();
    assert_eq!(bt0, vec![("b", 1), ("d", 2), ("a", 3)]);
}
