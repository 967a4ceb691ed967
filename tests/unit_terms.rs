// Unit tests for term extraction and vocabulary selection.
//
// Tests TermExtractor::extract invariants (idempotence, per-document term
// lists, counts) and how TermTable::vocabulary reacts to resolved topic
// parameters, including the small-corpus minimum-count relaxation.

use std::collections::HashSet;

use topicmap::config::Language;
use topicmap::topics::params::{TopicParams, SMALL_CORPUS_THRESHOLD};
use topicmap::topics::terms::TermExtractor;

fn corpus() -> (Vec<String>, Vec<String>) {
    let texts = [
        "Solar panels cut household energy bills.",
        "Wind farms and solar panels feed the grid.",
        "The grid needs storage for wind energy.",
        "Football season opens with a derby.",
        "The derby ended in a late football upset.",
    ];
    let ids = (0..texts.len()).map(|i| format!("d{i}")).collect();
    (ids, texts.iter().map(|s| s.to_string()).collect())
}

/// Fixed stop words so the assertions don't depend on a bundled list.
fn extractor() -> TermExtractor {
    TermExtractor::with_stop_words(
        ["the", "and", "a", "for", "with", "in"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
}

// ============================================================
// TermExtractor::extract: invariants
// ============================================================

#[test]
fn extraction_is_idempotent() {
    let (ids, texts) = corpus();
    let extractor = TermExtractor::new(Language::English);
    let first = extractor.extract(&ids, &texts).unwrap();
    let second = extractor.extract(&ids, &texts).unwrap();
    assert_eq!(first, second);
}

#[test]
fn every_document_gets_a_term_list() {
    let (ids, texts) = corpus();
    let extraction = extractor().extract(&ids, &texts).unwrap();
    for id in &ids {
        let terms = &extraction.doc_terms[id];
        assert!(!terms.is_empty(), "{id} has no terms");
        let unique: HashSet<&String> = terms.iter().collect();
        assert_eq!(unique.len(), terms.len(), "{id} has repeated terms");
    }
}

#[test]
fn document_terms_reference_the_table() {
    let (ids, texts) = corpus();
    let extraction = extractor().extract(&ids, &texts).unwrap();
    for terms in extraction.doc_terms.values() {
        for term in terms {
            assert!(extraction.terms.get(term).is_some(), "{term} missing from table");
        }
    }
}

#[test]
fn counts_span_documents() {
    let (ids, texts) = corpus();
    let extraction = extractor().extract(&ids, &texts).unwrap();
    assert_eq!(extraction.terms.get("solar panels").unwrap().count, 2);
    assert_eq!(extraction.terms.get("football").unwrap().count, 2);
    assert_eq!(extraction.terms.get("solar panels").unwrap().ngram, 2);
}

#[test]
fn table_ordered_by_count_then_lexically() {
    let (ids, texts) = corpus();
    let extraction = extractor().extract(&ids, &texts).unwrap();
    for pair in extraction.terms.terms().windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.count > b.count || (a.count == b.count && a.term_id < b.term_id),
            "{a:?} before {b:?}"
        );
    }
}

#[test]
fn mismatched_ids_and_texts_fail() {
    let result = extractor()
        .extract(&["a".to_string()], &["one".to_string(), "two".to_string()]);
    assert!(result.is_err());
}

#[test]
fn empty_text_yields_no_terms() {
    let extraction = extractor()
        .extract(&["a".to_string()], &["  ".to_string()])
        .unwrap();
    assert!(extraction.terms.is_empty());
    assert!(extraction.doc_terms["a"].is_empty());
}

// ============================================================
// TermTable::vocabulary: parameters and relaxation
// ============================================================

#[test]
fn relaxation_produces_superset_of_strict_vocabulary() {
    let (ids, texts) = corpus();
    let table = extractor()
        .extract(&ids, &texts)
        .unwrap()
        .terms;

    let params = TopicParams::default();
    let relaxed = params.resolve(ids.len()).unwrap();
    let strict = params.resolve(SMALL_CORPUS_THRESHOLD + 1).unwrap();
    assert!(relaxed.min_count_relaxed);
    assert!(!strict.min_count_relaxed);

    let relaxed_vocab: HashSet<String> = table
        .vocabulary(&relaxed)
        .terms()
        .iter()
        .map(|t| t.term_id.clone())
        .collect();
    let strict_vocab = table.vocabulary(&strict);

    assert!(!strict_vocab.is_empty());
    assert!(strict_vocab.terms().iter().all(|t| t.count >= 2));
    for term in strict_vocab.terms() {
        assert!(relaxed_vocab.contains(&term.term_id));
    }
    assert!(relaxed_vocab.len() > strict_vocab.len());
}

#[test]
fn vocabulary_respects_ngram_sizes_and_cap() {
    let (ids, texts) = corpus();
    let table = extractor()
        .extract(&ids, &texts)
        .unwrap()
        .terms;

    let params = TopicParams {
        ngrams: vec![2],
        top_terms_overall: 3,
        ..TopicParams::default()
    }
    .resolve(ids.len())
    .unwrap();

    let vocab = table.vocabulary(&params);
    assert_eq!(vocab.len(), 3);
    assert!(vocab.terms().iter().all(|t| t.ngram == 2));
    assert_eq!(vocab.terms()[0].term_id, "solar panels");
}

#[test]
fn min_count_one_is_never_flagged_as_relaxed() {
    let params = TopicParams {
        min_count_terms: 1,
        ..TopicParams::default()
    }
    .resolve(10)
    .unwrap();
    assert_eq!(params.min_count_terms, 1);
    assert!(!params.min_count_relaxed);
}

// ============================================================
// TermExtractor::extract: non-English text
// ============================================================

#[test]
fn french_elided_articles_do_not_split_terms() {
    let ids: Vec<String> = (0..3).map(|i| format!("fr{i}")).collect();
    let texts: Vec<String> = [
        "Le prix de l'énergie augmente.",
        "La facture d’énergie grimpe encore.",
        "L'énergie solaire progresse.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let extraction = TermExtractor::new(Language::French)
        .extract(&ids, &texts)
        .unwrap();

    assert_eq!(extraction.terms.get("énergie").unwrap().count, 3);
    assert!(extraction.terms.get("l'énergie").is_none());
    assert!(extraction.terms.get("énergie solaire").is_some());
    for term in extraction.terms.terms() {
        assert!(!term.term_id.starts_with("l'"), "{} kept an article", term.term_id);
        assert!(!term.term_id.starts_with("d'"), "{} kept an article", term.term_id);
    }
    for id in &ids {
        assert!(extraction.doc_terms[id].contains(&"énergie".to_string()));
    }
}

#[test]
fn italian_articulated_elision_is_split() {
    let terms: Vec<String> = extractor()
        .document_terms("Il costo dell'energia")
        .into_iter()
        .map(|(t, _)| t)
        .collect();
    assert!(terms.contains(&"energia".to_string()));
    assert!(terms.contains(&"costo dell'energia".to_string()));
    assert!(!terms.iter().any(|t| t.starts_with("dell") || t.ends_with('\'')));
}

#[test]
fn english_contractions_stay_whole() {
    let terms: Vec<String> = extractor()
        .document_terms("Solar isn't cheap")
        .into_iter()
        .map(|(t, _)| t)
        .collect();
    assert!(terms.contains(&"isn't".to_string()));
}

#[test]
fn dotted_capital_i_keeps_the_whole_word() {
    let terms: Vec<String> = extractor()
        .document_terms("İstanbul traffic")
        .into_iter()
        .map(|(t, _)| t)
        .collect();
    assert!(terms.contains(&"istanbul".to_string()));
    assert!(terms.contains(&"istanbul traffic".to_string()));
    assert!(!terms.iter().any(|t| t.contains("stanbul") && !t.contains("istanbul")));
}
