use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{Level, span, debug};

use super::error::RecommendError;

pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// Kept sorted; the tokenizer binary-searches this list.
const STOP_WORDS: &[&str] = &[
  "a", "about", "after", "again", "all", "am", "an", "and", "any", "are",
  "as", "at", "be", "because", "been", "before", "being", "between", "both",
  "but", "by", "can", "could", "did", "do", "does", "down", "during", "each",
  "few", "for", "from", "further", "had", "has", "have", "having", "he",
  "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into", "is",
  "it", "its", "just", "me", "more", "most", "my", "no", "nor", "not", "now",
  "of", "off", "on", "once", "only", "or", "other", "our", "out", "over",
  "own", "same", "she", "should", "so", "some", "such", "than", "that",
  "the", "their", "them", "then", "there", "these", "they", "this", "those",
  "through", "to", "too", "under", "until", "up", "very", "was", "we",
  "were", "what", "when", "where", "which", "while", "who", "why", "will",
  "with", "would", "you", "your"
];

/// Extracts unigrams and bigrams from a text blob. Input is lowercased and
/// split on non-alphanumeric characters; stop words and single-character
/// tokens are removed before n-gram construction.
pub fn tokenize(text: &str) -> Vec<String> {
  let lowered = text.to_lowercase();
  let base: Vec<&str> = lowered
    .split(|c: char| !c.is_alphanumeric())
    .filter(|token| token.chars().nth(1).is_some())
    .filter(|token| STOP_WORDS.binary_search(token).is_err())
    .collect();
  let mut terms: Vec<String> = base.iter().map(|t| t.to_string()).collect();
  terms.extend(base.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
  terms
}

/// Sparse L2-normalized document vector: `(vocabulary index, weight)` pairs
/// sorted by index. Documents matching no vocabulary term stay empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocVector(pub Vec<(usize, f32)>);

impl DocVector {
  pub fn is_zero(&self) -> bool {
    self.0.is_empty()
  }

  /// Merge-join dot product over the sorted index pairs.
  pub fn dot(&self, other: &DocVector) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut acc = 0f32;
    while i < self.0.len() && j < other.0.len() {
      let (left, left_weight) = self.0[i];
      let (right, right_weight) = other.0[j];
      match left.cmp(&right) {
        Ordering::Less => i += 1,
        Ordering::Greater => j += 1,
        Ordering::Equal => {
          acc += left_weight * right_weight;
          i += 1;
          j += 1;
        }
      }
    }
    acc
  }
}

/// Bag-of-terms model with smoothed inverse-document-frequency weights.
///
/// Fit once over the whole corpus; the vocabulary and idf weights are
/// immutable afterwards, and transforming unseen text ignores any term
/// outside the learned vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
  vocabulary: HashMap<String, usize>,
  idf: Vec<f32>,
  n_documents: usize,
}

impl TfIdfVectorizer {
  /// Learns the vocabulary and idf weights from the corpus. At most
  /// `max_features` terms are retained, ranked by aggregate corpus-wide
  /// tf-idf weight with ties broken by first-encountered order.
  pub fn fit(documents: &[&str], max_features: usize) -> Result<Self, RecommendError> {
    let span = span!(Level::DEBUG, "tfidf-fit");
    let _guard = span.enter();
    if documents.is_empty() {
      return Err(RecommendError::EmptyCorpus);
    }
    let tokenized: Vec<Vec<String>> = documents.iter()
      .map(|doc| tokenize(doc))
      .collect();

    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut document_frequency: HashMap<String, usize> = HashMap::new();
    let mut total_count: HashMap<String, usize> = HashMap::new();
    for tokens in &tokenized {
      let mut seen_here: HashSet<&str> = HashSet::new();
      for token in tokens {
        *total_count.entry(token.clone()).or_insert(0) += 1;
        if !first_seen.contains_key(token) {
          first_seen.insert(token.clone(), order.len());
          order.push(token.clone());
        }
        if seen_here.insert(token.as_str()) {
          *document_frequency.entry(token.clone()).or_insert(0) += 1;
        }
      }
    }
    if order.is_empty() {
      return Err(RecommendError::EmptyCorpus);
    }

    let n_documents = documents.len();
    let idf_of = |df: usize| {
      ((1 + n_documents) as f64 / (1 + df) as f64).ln() + 1.0
    };
    let mut ranked: Vec<&String> = order.iter().collect();
    ranked.sort_by(|a, b| {
      let weight_a = total_count[*a] as f64 * idf_of(document_frequency[*a]);
      let weight_b = total_count[*b] as f64 * idf_of(document_frequency[*b]);
      weight_b.partial_cmp(&weight_a)
        .unwrap_or(Ordering::Equal)
        .then_with(|| first_seen[*a].cmp(&first_seen[*b]))
    });
    ranked.truncate(max_features);
    // Column order follows first encounter so vectors are reproducible
    // regardless of how the ranking shuffled the terms.
    ranked.sort_by_key(|term| first_seen[*term]);

    let mut vocabulary = HashMap::with_capacity(ranked.len());
    let mut idf = Vec::with_capacity(ranked.len());
    for term in ranked {
      idf.push(idf_of(document_frequency[term]) as f32);
      let index = vocabulary.len();
      vocabulary.insert(term.clone(), index);
    }
    debug!("Fitted {} terms over {} documents", vocabulary.len(), n_documents);
    Ok(Self { vocabulary, idf, n_documents })
  }

  /// Transforms a document into an L2-normalized sparse tf-idf vector.
  /// Out-of-vocabulary terms are ignored; a document matching nothing
  /// yields the zero vector.
  pub fn transform(&self, document: &str) -> DocVector {
    let mut counts: HashMap<usize, f32> = HashMap::new();
    for token in tokenize(document) {
      if let Some(&index) = self.vocabulary.get(&token) {
        *counts.entry(index).or_insert(0.0) += 1.0;
      }
    }
    let mut weights: Vec<(usize, f32)> = counts.into_iter()
      .map(|(index, tf)| (index, tf * self.idf[index]))
      .collect();
    weights.sort_by_key(|(index, _)| *index);
    let norm = weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
      for (_, weight) in &mut weights {
        *weight /= norm;
      }
    }
    DocVector(weights)
  }

  pub fn vocabulary_len(&self) -> usize {
    self.vocabulary.len()
  }

  pub fn n_documents(&self) -> usize {
    self.n_documents
  }

  pub fn idf(&self) -> &[f32] {
    &self.idf
  }

  pub fn vocabulary(&self) -> &HashMap<String, usize> {
    &self.vocabulary
  }
}
