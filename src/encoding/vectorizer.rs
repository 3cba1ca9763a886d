//! TF-IDF feature encoding over report text.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{RecommendError, RecommendResult};

/// Word tokens: lowercased runs of two or more word characters.
const TOKEN_PATTERN: &str = r"\b\w\w+\b";

static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> RecommendResult<&'static Regex> {
    if let Some(regex) = TOKEN_REGEX.get() {
        return Ok(regex);
    }

    let regex = Regex::new(TOKEN_PATTERN)
        .map_err(|err| RecommendError::InvalidConfig(format!("invalid token pattern: {err}")))?;
    Ok(TOKEN_REGEX.get_or_init(|| regex))
}

fn tokenize(text: &str) -> RecommendResult<Vec<String>> {
    let regex = token_regex()?;
    let lowered = text.to_lowercase();
    Ok(regex
        .find_iter(&lowered)
        .map(|token| token.as_str().to_string())
        .collect())
}

/// Sparse feature vector in a fitted vocabulary space.
///
/// Entries are `(dimension, weight)` pairs sorted by dimension and scaled
/// to unit L2 norm at construction; the zero vector stays empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TfidfVector {
    entries: Vec<(usize, f64)>,
}

impl TfidfVector {
    fn from_weights(mut entries: Vec<(usize, f64)>) -> Self {
        entries.retain(|(_, weight)| *weight != 0.0);
        entries.sort_unstable_by_key(|(dimension, _)| *dimension);

        let norm = entries
            .iter()
            .map(|(_, weight)| weight * weight)
            .sum::<f64>()
            .sqrt();
        if norm > 0.0 {
            for entry in &mut entries {
                entry.1 /= norm;
            }
        }

        Self { entries }
    }

    /// True if no dimension carries weight.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-zero dimensions.
    #[must_use]
    pub fn non_zero_len(&self) -> usize {
        self.entries.len()
    }

    /// Dot product over the shared dimensions.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        let mut sum = 0.0;
        let (mut i, mut j) = (0, 0);
        while i < self.entries.len() && j < other.entries.len() {
            match self.entries[i].0.cmp(&other.entries[j].0) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += self.entries[i].1 * other.entries[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity.
    ///
    /// Vectors are unit length by construction, so this is the dot product;
    /// a zero-norm operand on either side yields `0.0` rather than an error.
    #[must_use]
    pub fn cosine(&self, other: &Self) -> f64 {
        self.dot(other)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct FittedVocabulary {
    /// Term to dimension index; dimensions follow sorted term order.
    vocabulary: HashMap<String, usize>,
    /// Smoothed inverse document frequency per dimension.
    idf: Vec<f64>,
}

/// Term-weighting feature encoder.
///
/// `fit` learns the vocabulary and IDF weights from the corpus texts;
/// `transform` embeds arbitrary text into the learned space. The fitted
/// state is immutable between fits and serializes with the model bundle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    fitted: Option<FittedVocabulary>,
}

impl TfidfVectorizer {
    /// Create an unfitted vectorizer.
    #[must_use]
    pub const fn new() -> Self {
        Self { fitted: None }
    }

    /// True once `fit` has run.
    #[must_use]
    pub const fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Number of learned vocabulary dimensions.
    #[must_use]
    pub fn vocabulary_len(&self) -> usize {
        self.fitted.as_ref().map_or(0, |state| state.idf.len())
    }

    /// Fit the vocabulary and IDF weights over the given texts.
    ///
    /// Deterministic for identical input order and content: the vocabulary
    /// is the sorted set of distinct tokens (no stop-word removal) and
    /// `idf = ln((1 + n) / (1 + df)) + 1`.
    ///
    /// # Errors
    /// Returns an error if tokenization cannot be initialized.
    #[allow(clippy::cast_precision_loss)] // document counts stay far below 2^52
    pub fn fit(&mut self, texts: &[&str]) -> RecommendResult<()> {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for text in texts {
            let tokens = tokenize(text)?;
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *document_frequency.entry(term.to_string()).or_insert(0) += 1;
            }
        }

        let total_docs = texts.len() as f64;
        let mut vocabulary = HashMap::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        // BTreeMap iteration yields terms sorted, so dimension assignment is
        // stable across fits of the same corpus.
        for (dimension, (term, df)) in document_frequency.into_iter().enumerate() {
            vocabulary.insert(term, dimension);
            idf.push(((1.0 + total_docs) / (1.0 + df as f64)).ln() + 1.0);
        }

        self.fitted = Some(FittedVocabulary { vocabulary, idf });
        Ok(())
    }

    /// Embed text into the fitted space.
    ///
    /// Out-of-vocabulary tokens contribute nothing; text with no known
    /// tokens embeds to the zero vector.
    ///
    /// # Errors
    /// Returns `NotFitted` if called before `fit`.
    pub fn transform(&self, text: &str) -> RecommendResult<TfidfVector> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or(RecommendError::NotFitted("vectorizer"))?;

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(text)? {
            if let Some(&dimension) = fitted.vocabulary.get(token.as_str()) {
                *counts.entry(dimension).or_insert(0.0) += 1.0;
            }
        }

        let entries = counts
            .into_iter()
            .map(|(dimension, count)| (dimension, count * fitted.idf[dimension]))
            .collect();
        Ok(TfidfVector::from_weights(entries))
    }

    /// Fit over the texts and return their vectors in input order.
    ///
    /// # Errors
    /// Returns an error if fitting or embedding fails.
    pub fn fit_transform(&mut self, texts: &[&str]) -> RecommendResult<Vec<TfidfVector>> {
        self.fit(texts)?;
        texts.iter().map(|text| self.transform(text)).collect()
    }
}
