//! TF-IDF vectorizer.
//!
//! # Weighting
//!
//! 1. Lowercase, tokenize on `\b\w\w+\b`, drop stopwords.
//! 2. Vocabulary: every remaining term, capped at `max_features` by
//!    corpus-wide term count (ties broken alphabetically). Column indices
//!    follow alphabetical order.
//! 3. `idf(t) = ln((1 + n) / (1 + df(t))) + 1`, so a term present in every
//!    document weighs less than one present in a few.
//! 4. Row weights are raw counts × idf, L2-normalized. Documents with no
//!    vocabulary terms give an all-zero row.

use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;
use tracing::info;

use crate::config::VectorizerConfig;
use crate::matrix::SparseMatrix;
use crate::stopwords;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    pub max_features: usize,
    pub stop_words: bool,
    pub n_documents: usize,
    /// Term → column index.
    pub vocabulary: BTreeMap<String, usize>,
    /// Indexed by column.
    pub idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Tokenize one document the way both fit and transform see it.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        tokenize(text, self.stop_words)
    }

    pub fn fit<S: AsRef<str>>(corpus: &[S], config: &VectorizerConfig) -> Self {
        let stop_words = config.uses_stop_words();
        info!(
            documents = corpus.len(),
            max_features = config.max_features,
            "fitting tf-idf vectorizer"
        );

        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in corpus {
            let tokens = tokenize(doc.as_ref(), stop_words);
            let mut seen: HashSet<&str> = HashSet::new();
            for token in &tokens {
                *term_counts.entry(token.clone()).or_default() += 1;
                if seen.insert(token) {
                    *doc_freq.entry(token.clone()).or_default() += 1;
                }
            }
        }

        let mut terms: Vec<(String, usize)> = term_counts.into_iter().collect();
        if terms.len() > config.max_features {
            terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            terms.truncate(config.max_features);
        }
        let mut terms: Vec<String> = terms.into_iter().map(|(t, _)| t).collect();
        terms.sort();

        let n = corpus.len() as f64;
        let idf = terms
            .iter()
            .map(|t| {
                let df = doc_freq.get(t).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        let vocabulary = terms.into_iter().enumerate().map(|(i, t)| (t, i)).collect();

        let model = Self {
            max_features: config.max_features,
            stop_words,
            n_documents: corpus.len(),
            vocabulary,
            idf,
        };
        info!(vocabulary = model.len(), "vectorizer fitted");
        model
    }

    /// One weighted row per document, in corpus order.
    pub fn transform<S: AsRef<str> + Sync>(&self, corpus: &[S]) -> SparseMatrix {
        let rows: Vec<Vec<(usize, f64)>> = corpus
            .par_iter()
            .map(|doc| self.weigh(doc.as_ref()))
            .collect();
        SparseMatrix::from_rows(self.len(), rows)
    }

    pub fn fit_transform<S: AsRef<str> + Sync>(
        corpus: &[S],
        config: &VectorizerConfig,
    ) -> (Self, SparseMatrix) {
        let model = Self::fit(corpus, config);
        let matrix = model.transform(corpus);
        (model, matrix)
    }

    fn weigh(&self, doc: &str) -> Vec<(usize, f64)> {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for token in self.tokenize(doc) {
            if let Some(&col) = self.vocabulary.get(&token) {
                *counts.entry(col).or_default() += 1;
            }
        }

        let mut row: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(col, count)| (col, count as f64 * self.idf[col]))
            .collect();
        let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut row {
                *w /= norm;
            }
        }
        row
    }

    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Every vocabulary entry must point at its own idf weight.
    pub fn validate(&self) -> Result<(), String> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(format!(
                "{} vocabulary terms but {} idf weights",
                self.vocabulary.len(),
                self.idf.len()
            ));
        }
        let mut seen = vec![false; self.idf.len()];
        for (term, &i) in &self.vocabulary {
            match seen.get_mut(i) {
                None => return Err(format!("term '{term}' has column {i} out of range")),
                Some(true) => return Err(format!("column {i} is assigned twice")),
                Some(slot) => *slot = true,
            }
        }
        if self.len() > self.max_features {
            return Err(format!(
                "{} terms exceed max_features {}",
                self.len(),
                self.max_features
            ));
        }
        Ok(())
    }

    pub fn idf_of(&self, term: &str) -> Option<f64> {
        self.index_of(term).map(|i| self.idf[i])
    }

    /// Terms in column order.
    pub fn feature_names(&self) -> Vec<&str> {
        let mut names = vec![""; self.len()];
        for (term, &i) in &self.vocabulary {
            names[i] = term.as_str();
        }
        names
    }
}

fn tokenize(text: &str, stop_words: bool) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !stop_words || !stopwords::is_english_stopword(t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_features: usize) -> VectorizerConfig {
        VectorizerConfig {
            max_features,
            stop_words: "english".to_string(),
        }
    }

    #[test]
    fn test_tokenize_lowercases_and_drops_stopwords() {
        let tokens = tokenize("The Rust ENGINEER and a C dev", true);
        assert_eq!(tokens, vec!["rust", "engineer", "dev"]);
        let tokens = tokenize("the rust", false);
        assert_eq!(tokens, vec!["the", "rust"]);
    }

    #[test]
    fn test_vocabulary_alphabetical() {
        let model = TfidfVectorizer::fit(&["zebra apple", "mango"], &config(10));
        assert_eq!(model.feature_names(), vec!["apple", "mango", "zebra"]);
        assert_eq!(model.index_of("zebra"), Some(2));
        assert_eq!(model.index_of("pear"), None);
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let corpus = ["rust rust rust go go python", "rust go java"];
        let model = TfidfVectorizer::fit(&corpus, &config(2));
        assert_eq!(model.len(), 2);
        assert!(model.index_of("rust").is_some());
        assert!(model.index_of("go").is_some());
        assert!(model.index_of("python").is_none());
    }

    #[test]
    fn test_ties_broken_alphabetically() {
        let model = TfidfVectorizer::fit(&["beta alpha gamma"], &config(2));
        assert_eq!(model.feature_names(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_common_term_weighs_less() {
        let corpus = ["rust python", "rust java", "rust golang"];
        let model = TfidfVectorizer::fit(&corpus, &config(100));
        assert_eq!(model.idf_of("rust"), Some(1.0));
        assert!(model.idf_of("python").unwrap() > 1.0);

        let m = model.transform(&corpus);
        let rust = model.index_of("rust").unwrap();
        let python = model.index_of("python").unwrap();
        assert!(m.get(0, rust) < m.get(0, python));
    }

    #[test]
    fn test_rows_are_unit_length() {
        let corpus = ["rust python rust", "java"];
        let (_, m) = TfidfVectorizer::fit_transform(&corpus, &config(100));
        for i in 0..m.rows() {
            let norm: f64 = m.row(i).1.iter().map(|w| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_documents_give_zero_rows() {
        let corpus = ["", "rust", "the and of", "unknownterm"];
        let model = TfidfVectorizer::fit(&corpus[..3], &config(100));
        let m = model.transform(&corpus);
        assert_eq!(m.rows(), 4);
        assert_eq!(m.row(0).0.len(), 0);
        assert_eq!(m.row(2).0.len(), 0);
        assert_eq!(m.row(3).0.len(), 0);
        assert_eq!(m.empty_rows(), 3);
    }

    #[test]
    fn test_empty_corpus() {
        let corpus: [&str; 0] = [];
        let (model, m) = TfidfVectorizer::fit_transform(&corpus, &config(10));
        assert!(model.is_empty());
        assert_eq!(m.rows(), 0);
    }

    #[test]
    fn test_row_order_matches_corpus() {
        let corpus: Vec<String> = (0..200).map(|i| format!("term{} shared", (b'a' + (i % 26) as u8) as char)).collect();
        let (model, m) = TfidfVectorizer::fit_transform(&corpus, &config(1000));
        for (i, doc) in corpus.iter().enumerate() {
            let own = doc.split(' ').next().unwrap();
            let col = model.index_of(own).unwrap();
            assert!(m.get(i, col) > 0.0, "row {} lost its term {}", i, own);
        }
    }

    #[test]
    fn test_serde_preserves_lookup() {
        let model = TfidfVectorizer::fit(&["rust python"], &config(10));
        let json = serde_json::to_string(&model).unwrap();
        let back: TfidfVectorizer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
        assert_eq!(back.index_of("python"), Some(0));
    }

    #[test]
    fn test_validate_catches_inconsistent_model() {
        let model = TfidfVectorizer::fit(&["rust python java"], &config(10));
        assert!(model.validate().is_ok());

        let mut short = model.clone();
        short.idf.pop();
        assert!(short.validate().unwrap_err().contains("idf weights"));

        let mut out_of_range = model.clone();
        out_of_range.vocabulary.insert("rust".to_string(), 9);
        assert!(out_of_range.validate().unwrap_err().contains("out of range"));

        let mut shared = model.clone();
        shared.vocabulary.insert("rust".to_string(), 0);
        assert!(shared.validate().unwrap_err().contains("assigned twice"));

        let mut capped = model;
        capped.max_features = 1;
        assert!(capped.validate().is_err());
    }
}
