//! tf-idf document ranking
//!
//! - `tf(t, d) = count(t in d) / total_tokens(d)`
//! - `idf(t) = ln((1 + N) / (1 + df(t))) + 1`
//! - `score(d) = sum over query tokens of tf(t, d) * idf(t)`
//!
//! The smoothed idf stays strictly positive, so a document scores above zero
//! exactly when it contains at least one query token. Zero-score documents are
//! dropped from the ranking.

use crate::utils::tokenizer::{count_tokens, tokenize_query, TokenCounts};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::path::PathBuf;

/// Token frequencies of one file. Built during a search and discarded after
/// scoring.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub tokens: TokenCounts,
}

impl Document {
    pub fn from_text(path: PathBuf, text: &str) -> Self {
        Self {
            path,
            tokens: count_tokens(text),
        }
    }

    /// Term frequency of a (lower-cased) token
    pub fn tf(&self, token: &str) -> f64 {
        if self.tokens.total == 0 {
            return 0.0;
        }
        self.tokens.get(token) as f64 / self.tokens.total as f64
    }
}

/// A document with a positive score
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFile {
    pub path: PathBuf,
    pub score: f64,
}

/// Smoothed inverse document frequency
pub fn idf_weight(doc_count: usize, doc_freq: usize) -> f64 {
    ((1.0 + doc_count as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
}

/// Ranks a corpus of documents against a query
#[derive(Debug, Default)]
pub struct TfIdfRanker {
    documents: Vec<Document>,
}

impl TfIdfRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn add_document(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of documents containing `token` at least once
    pub fn document_frequency(&self, token: &str) -> usize {
        self.documents
            .iter()
            .filter(|d| d.tokens.contains(token))
            .count()
    }

    /// idf for every query token, computed with a single pass over the corpus
    pub fn idf<'q>(&self, query_tokens: &'q [String]) -> FxHashMap<&'q str, f64> {
        let mut doc_freq: FxHashMap<&str, usize> =
            query_tokens.iter().map(|t| (t.as_str(), 0)).collect();

        for doc in &self.documents {
            for (token, df) in doc_freq.iter_mut() {
                if doc.tokens.contains(token) {
                    *df += 1;
                }
            }
        }

        let n = self.documents.len();
        doc_freq
            .into_iter()
            .map(|(token, df)| (token, idf_weight(n, df)))
            .collect()
    }

    /// Score one document with precomputed idf values
    pub fn score(&self, document: &Document, query_tokens: &[String], idf: &FxHashMap<&str, f64>) -> f64 {
        query_tokens
            .iter()
            .map(|t| document.tf(t) * idf.get(t.as_str()).copied().unwrap_or(0.0))
            .sum()
    }

    /// Rank all documents: score descending, ties by path ascending.
    /// Documents without any query token are left out.
    pub fn rank(&self, query: &str) -> Vec<RankedFile> {
        let query_tokens = tokenize_query(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let idf = self.idf(&query_tokens);

        let mut ranked: Vec<RankedFile> = self
            .documents
            .par_iter()
            .filter_map(|doc| {
                let score = self.score(doc, &query_tokens, &idf);
                (score > 0.0).then(|| RankedFile {
                    path: doc.path.clone(),
                    score,
                })
            })
            .collect();

        ranked.sort_by(compare_ranked);
        ranked
    }
}

/// Total order used for ranked output
pub fn compare_ranked(a: &RankedFile, b: &RankedFile) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.path.cmp(&b.path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str, text: &str) -> Document {
        Document::from_text(PathBuf::from(path), text)
    }

    fn paths(ranked: &[RankedFile]) -> Vec<&str> {
        ranked.iter().map(|r| r.path.to_str().unwrap()).collect()
    }

    #[test]
    fn test_only_documents_with_query_token_rank() {
        let ranker = TfIdfRanker::with_documents(vec![
            doc("A.txt", "cat dog cat"),
            doc("B.txt", "dog dog"),
        ]);

        let ranked = ranker.rank("cat");
        assert_eq!(paths(&ranked), vec!["A.txt"]);
        assert!(ranked[0].score > 0.0);
    }

    #[test]
    fn test_score_formula() {
        let ranker = TfIdfRanker::with_documents(vec![
            doc("A.txt", "cat dog cat"),
            doc("B.txt", "dog dog"),
        ]);

        let ranked = ranker.rank("cat");
        let expected = (2.0 / 3.0) * ((3.0f64 / 2.0).ln() + 1.0);
        assert!((ranked[0].score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        let ranker = TfIdfRanker::with_documents(vec![
            doc("common1", "alpha beta"),
            doc("common2", "alpha gamma"),
            doc("rare", "alpha zeta"),
        ]);
        let query_tokens = vec!["alpha".to_string(), "zeta".to_string()];
        let idf = ranker.idf(&query_tokens);
        assert!(idf["zeta"] > idf["alpha"]);

        let ranked = ranker.rank("alpha zeta");
        assert_eq!(ranked[0].path, PathBuf::from("rare"));
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn test_ties_broken_by_path() {
        let ranker = TfIdfRanker::with_documents(vec![
            doc("c.txt", "needle hay"),
            doc("a.txt", "needle hay"),
            doc("b.txt", "needle hay"),
        ]);
        assert_eq!(paths(&ranker.rank("needle")), vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let docs: Vec<Document> = (0..50)
            .map(|i| doc(&format!("f{:02}", i), &format!("word{} shared {}", i % 7, "x ".repeat(i % 5))))
            .collect();
        let ranker = TfIdfRanker::with_documents(docs);

        let first = ranker.rank("shared word3");
        let second = ranker.rank("shared word3");
        assert_eq!(first, second);
        assert_eq!(first.len(), 50);
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let ranker = TfIdfRanker::with_documents(vec![doc("a", "Cat")]);
        assert_eq!(ranker.rank("CAT").len(), 1);
    }

    #[test]
    fn test_empty_query_and_empty_documents() {
        let ranker = TfIdfRanker::with_documents(vec![doc("empty", ""), doc("a", "cat")]);
        assert!(ranker.rank("").is_empty());
        assert!(ranker.rank("!!!").is_empty());
        assert_eq!(paths(&ranker.rank("cat")), vec!["a"]);
        assert_eq!(ranker.document_frequency("cat"), 1);
    }

    #[test]
    fn test_long_cjk_token_ranks() {
        let text = "検索エンジン".repeat(8);
        let ranker = TfIdfRanker::with_documents(vec![doc("ja.txt", &text), doc("other.txt", "hello")]);

        let ranked = ranker.rank(&text);
        assert_eq!(paths(&ranked), vec!["ja.txt"]);
        let expected = idf_weight(2, 1);
        assert!((ranked[0].score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_idf_weight_positive() {
        assert!(idf_weight(1, 1) > 0.0);
        assert!(idf_weight(10, 10) > 0.0);
        assert!(idf_weight(10, 0) > idf_weight(10, 5));
    }
}
