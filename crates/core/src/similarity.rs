//! Text similarity between a new document and the historical corpus.
//!
//! Scores are plain token overlap: each query token (repeats included) that
//! appears anywhere in a document adds one point. Ranking keeps the top
//! fraction of the corpus, never less than one document.

use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;

use crate::domain::document::Document;

/// Runs of non-word characters, underscore included.
pub const DEFAULT_SPLIT_PATTERN: &str = r"[\W_]+";
pub const DEFAULT_TOP_THRESHOLD: f64 = 0.05;

#[derive(Clone, Debug)]
pub struct Tokenizer {
    split: Regex,
}

impl Tokenizer {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self { split: Regex::new(pattern)? })
    }

    /// Lowercased, non-empty tokens in input order.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.split
            .split(&lowered)
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn vocabulary(&self, text: &str) -> HashSet<String> {
        self.tokenize(text).into_iter().collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_SPLIT_PATTERN).expect("default split pattern compiles")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResult {
    pub document: Document,
    pub similarity_degree: usize,
}

#[derive(Clone, Debug)]
pub struct SimilarityRanker {
    tokenizer: Tokenizer,
    top_threshold: f64,
}

impl Default for SimilarityRanker {
    fn default() -> Self {
        Self::new(Tokenizer::default(), DEFAULT_TOP_THRESHOLD)
    }
}

impl SimilarityRanker {
    pub fn new(tokenizer: Tokenizer, top_threshold: f64) -> Self {
        Self { tokenizer, top_threshold }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn score(&self, query_tokens: &[String], document_text: &str) -> usize {
        let vocabulary = self.tokenizer.vocabulary(document_text);
        query_tokens.iter().filter(|token| vocabulary.contains(token.as_str())).count()
    }

    /// Number of results kept for a corpus of `corpus_len` documents.
    pub fn top_count(&self, corpus_len: usize) -> usize {
        if corpus_len == 0 {
            return 0;
        }
        let scaled = (corpus_len as f64 * self.top_threshold).floor();
        let kept = if scaled.is_finite() && scaled > 0.0 { scaled as usize } else { 0 };
        kept.clamp(1, corpus_len)
    }

    pub fn rank(&self, query_text: &str, documents: Vec<Document>) -> Vec<SimilarityResult> {
        let query_tokens = self.tokenizer.tokenize(query_text);
        let keep = self.top_count(documents.len());

        let mut results: Vec<SimilarityResult> = documents
            .into_iter()
            .map(|document| {
                let similarity_degree = self.score(&query_tokens, &document.text);
                SimilarityResult { document, similarity_degree }
            })
            .collect();

        // `sort_by` is stable: equal scores keep corpus order.
        results.sort_by(|left, right| right.similarity_degree.cmp(&left.similarity_degree));
        results.truncate(keep);
        results
    }
}

/// Distinct matter names of ranked documents, in rank order.
pub fn matter_names(results: &[SimilarityResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    results
        .iter()
        .map(|result| result.document.matter_name.clone())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
