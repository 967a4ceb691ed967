// Term extraction: candidate n-grams per document and a corpus term table.
//
// Text is lowercased, URLs and e-mail addresses are removed, and the rest is
// split into phrases at punctuation. Inside a phrase, every window of 1..=3
// tokens whose first and last token are not stop words becomes a candidate
// term ("bill of rights" survives, "of the" does not). Numbers and single
// characters break phrases the same way punctuation does. Elided articles
// ("l'", "d'", "qu'", Italian "dell'") become tokens of their own that act as
// stop words, so "l'énergie" and "énergie" count as the same term.
//
// Extraction runs once at fit time over all n-gram sizes. Restricting the
// table to a run's n-gram sizes, minimum count and vocabulary cap happens
// later in `TermTable::vocabulary`, so changing topic parameters never needs
// a re-extraction.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use anyhow::Result;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::params::{ResolvedTopicParams, MAX_NGRAM};
use crate::config::Language;
use crate::models::{DocId, Term};

/// Multi-letter elision prefixes; any single letter before an apostrophe is
/// one as well.
const ELISIONS: &[&str] = &[
    "qu", "jusqu", "lorsqu", "puisqu", "quoiqu", "all", "dall", "dell", "nell", "sull", "coll",
    "quell", "quest", "un",
];

static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://|www\.)\S+|\S+@\S+\.\S+").expect("valid noise pattern")
});

/// Extracts candidate n-gram terms from raw text.
pub struct TermExtractor {
    /// N-gram sizes to produce (each in 1..=3)
    pub ngrams: Vec<usize>,
    stop_words: HashSet<String>,
}

/// Output of a term extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct TermExtraction {
    pub terms: TermTable,
    /// Unique terms per document, in order of first appearance
    pub doc_terms: HashMap<DocId, Vec<String>>,
}

/// Corpus-level term table, ordered by count descending then lexically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermTable {
    terms: Vec<Term>,
}

impl TermExtractor {
    /// Extractor for `language` producing every n-gram size up to 3.
    pub fn new(language: Language) -> Self {
        Self::with_stop_words(language.stop_words())
    }

    /// Extractor with an explicit stop-word list.
    pub fn with_stop_words(stop_words: Vec<String>) -> Self {
        Self {
            ngrams: (1..=MAX_NGRAM).collect(),
            stop_words: stop_words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Restrict the n-gram sizes produced.
    pub fn ngrams(mut self, ngrams: &[usize]) -> Self {
        let mut sizes: Vec<usize> = ngrams
            .iter()
            .copied()
            .filter(|n| (1..=MAX_NGRAM).contains(n))
            .collect();
        sizes.sort_unstable();
        sizes.dedup();
        self.ngrams = sizes;
        self
    }

    /// Extract terms from a set of documents.
    ///
    /// `ids` and `texts` are parallel; ids must be unique.
    pub fn extract(&self, ids: &[DocId], texts: &[String]) -> Result<TermExtraction> {
        if ids.len() != texts.len() {
            anyhow::bail!(
                "Got {} document ids for {} texts; they must line up one to one",
                ids.len(),
                texts.len()
            );
        }

        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut doc_terms = HashMap::with_capacity(ids.len());

        for (id, text) in ids.iter().zip(texts) {
            let occurrences = self.document_terms(text);

            let mut seen = HashSet::new();
            let mut unique = Vec::new();
            for (term, ngram) in occurrences {
                let entry = counts.entry(term.clone()).or_insert((ngram, 0));
                entry.1 += 1;
                if seen.insert(term.clone()) {
                    unique.push(term);
                }
            }

            if doc_terms.insert(id.clone(), unique).is_some() {
                anyhow::bail!("Duplicate document id '{id}' in term extraction");
            }
        }

        let terms = TermTable::from_terms(
            counts
                .into_iter()
                .map(|(term_id, (ngram, count))| Term {
                    term_id,
                    ngram,
                    count,
                })
                .collect(),
        );

        info!(
            documents = ids.len(),
            terms = terms.len(),
            "Extracted candidate terms"
        );

        Ok(TermExtraction { terms, doc_terms })
    }

    /// Every term occurrence in `text`, with its n-gram size, in text order.
    pub fn document_terms(&self, text: &str) -> Vec<(String, usize)> {
        let mut out = Vec::new();
        for phrase in phrases(text) {
            for &n in &self.ngrams {
                if n > phrase.len() {
                    continue;
                }
                for window in phrase.windows(n) {
                    if self.is_stop(&window[0]) || self.is_stop(&window[n - 1]) {
                        continue;
                    }
                    out.push((join_window(window), n));
                }
            }
        }
        out
    }

    fn is_stop(&self, token: &str) -> bool {
        token.ends_with('\'') || self.stop_words.contains(token)
    }
}

/// Split text into phrases of normalized tokens.
fn phrases(text: &str) -> Vec<Vec<String>> {
    let lowered = text.to_lowercase();
    let cleaned = NOISE.replace_all(&lowered, " . ");

    let mut phrases = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut token = String::new();

    for ch in cleaned.chars() {
        if is_combining_mark(ch) {
            // "İ" lowercases to "i" + U+0307
            continue;
        }
        let apostrophe = matches!(ch, '\'' | '\u{2019}');
        if apostrophe && is_elision(&token) {
            token.push('\'');
            current.push(std::mem::take(&mut token));
            continue;
        }

        let joiner = (apostrophe || ch == '-') && !token.is_empty();
        if ch.is_alphanumeric() || joiner {
            token.push(if ch == '\u{2019}' { '\'' } else { ch });
            continue;
        }

        push_token(&mut token, &mut current, &mut phrases);
        if !ch.is_whitespace() {
            end_phrase(&mut current, &mut phrases);
        }
    }
    push_token(&mut token, &mut current, &mut phrases);
    end_phrase(&mut current, &mut phrases);

    phrases
}

fn is_elision(token: &str) -> bool {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.is_alphabetic(),
        _ => ELISIONS.contains(&token),
    }
}

fn is_combining_mark(ch: char) -> bool {
    matches!(
        ch,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{FE20}'..='\u{FE2F}'
    )
}

/// Join a window with spaces, except straight after an elided prefix.
fn join_window(window: &[String]) -> String {
    let mut out = String::new();
    for token in window {
        if !out.is_empty() && !out.ends_with('\'') {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

fn push_token(token: &mut String, current: &mut Vec<String>, phrases: &mut Vec<Vec<String>>) {
    let trimmed = token.trim_end_matches(['\'', '-']);
    if trimmed.is_empty() {
        token.clear();
        return;
    }
    let numeric = trimmed.chars().all(|c| !c.is_alphabetic());
    if numeric || trimmed.chars().count() < 2 {
        // Numbers and stray letters never join an n-gram across them.
        end_phrase(current, phrases);
    } else {
        current.push(trimmed.to_string());
    }
    token.clear();
}

fn end_phrase(current: &mut Vec<String>, phrases: &mut Vec<Vec<String>>) {
    if !current.is_empty() {
        phrases.push(std::mem::take(current));
    }
}

impl TermTable {
    /// Build a table, ordering by count descending and then lexically.
    pub fn from_terms(mut terms: Vec<Term>) -> Self {
        terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term_id.cmp(&b.term_id)));
        Self { terms }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, term_id: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.term_id == term_id)
    }

    /// Term id → corpus count, for lookups in hot loops.
    pub fn counts(&self) -> HashMap<&str, usize> {
        self.terms
            .iter()
            .map(|t| (t.term_id.as_str(), t.count))
            .collect()
    }

    /// Restrict to a run's n-gram sizes and minimum count, capped at the
    /// vocabulary size. Order is preserved, so the cap keeps the most
    /// frequent terms with lexical tie-breaks.
    pub fn vocabulary(&self, params: &ResolvedTopicParams) -> TermTable {
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| params.ngrams.contains(&t.ngram) && t.count >= params.min_count_terms)
            .take(params.top_terms_overall)
            .cloned()
            .collect();

        debug!(
            candidates = self.terms.len(),
            vocabulary = terms.len(),
            min_count = params.min_count_terms,
            "Selected vocabulary"
        );

        TermTable { terms }
    }
}
