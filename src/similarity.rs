use ndarray::{Array2, ArrayView1, Axis};
use ndarray::parallel::prelude::*;
use tracing::{Level, span, debug};

use super::error::RecommendError;
use super::vectorizer::DocVector;

/// Dense symmetric matrix of pairwise cosine similarities.
///
/// Since the document vectors are L2-normalized, each entry is a plain dot
/// product. The diagonal is 1.0, except for zero vectors where similarity
/// is undefined and pinned to 0.0. Built once per catalog snapshot and
/// read-only afterwards.
#[derive(Debug)]
pub struct SimilarityMatrix {
  scores: Array2<f32>,
}

impl SimilarityMatrix {
  /// Computes the full matrix: the upper triangle is filled with sparse dot
  /// products (rows sharded across the rayon pool, each worker owning a
  /// disjoint row), then mirrored into the lower triangle.
  pub fn build(vectors: &[DocVector]) -> Self {
    let span = span!(Level::DEBUG, "similarity-build");
    let _guard = span.enter();
    let n = vectors.len();
    debug!("Computing {}x{} similarity matrix", n, n);
    let mut scores = Array2::<f32>::zeros((n, n));
    scores.axis_iter_mut(Axis(0))
      .into_par_iter()
      .enumerate()
      .for_each(|(i, mut row)| {
        row[i] = if vectors[i].is_zero() { 0.0 } else { 1.0 };
        for j in (i + 1)..n {
          row[j] = vectors[i].dot(&vectors[j]);
        }
      });
    for i in 1..n {
      for j in 0..i {
        scores[[i, j]] = scores[[j, i]];
      }
    }
    Self { scores }
  }

  /// Similarities of one item against the whole corpus without building the
  /// full matrix; the O(N)-per-query alternative for catalogs too large for
  /// a dense N×N allocation.
  pub fn query_row(vectors: &[DocVector], index: usize) -> Vec<f32> {
    let subject = &vectors[index];
    vectors.iter()
      .enumerate()
      .map(|(j, other)| {
        if j == index {
          if subject.is_zero() { 0.0 } else { 1.0 }
        } else {
          subject.dot(other)
        }
      })
      .collect()
  }

  pub fn len(&self) -> usize {
    self.scores.nrows()
  }

  pub fn is_empty(&self) -> bool {
    self.scores.nrows() == 0
  }

  pub fn get(&self, i: usize, j: usize) -> f32 {
    self.scores[[i, j]]
  }

  pub fn row(&self, index: usize) -> ArrayView1<f32> {
    self.scores.row(index)
  }

  /// Row-major copy of the matrix for the persisted-artifact format.
  pub fn to_dense(&self) -> (usize, Vec<f32>) {
    (self.scores.nrows(), self.scores.iter().copied().collect())
  }

  pub fn from_dense(rows: usize, values: Vec<f32>) -> Result<Self, RecommendError> {
    let found = values.len();
    let scores = Array2::from_shape_vec((rows, rows), values)
      .map_err(|_| RecommendError::CorpusMismatch {
        expected: rows * rows,
        found,
      })?;
    Ok(Self { scores })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vectorizer::{TfIdfVectorizer, DEFAULT_MAX_FEATURES};

  fn toy_vectors() -> Vec<DocVector> {
    let blobs = [
      "action fantasy tv giant creatures wall",
      "action fantasy tv soldiers creatures wall",
      "comedy slice life movie cooking pastries",
      "", // zero vector: nothing survives tokenization
    ];
    let model = TfIdfVectorizer::fit(
      &blobs[..3].iter().copied().collect::<Vec<_>>(), DEFAULT_MAX_FEATURES
    ).unwrap();
    blobs.iter().map(|b| model.transform(b)).collect()
  }

  #[test]
  fn matrix_is_symmetric() {
    let matrix = SimilarityMatrix::build(&toy_vectors());
    for i in 0..matrix.len() {
      for j in 0..matrix.len() {
        assert_eq!(matrix.get(i, j), matrix.get(j, i));
      }
    }
  }

  #[test]
  fn diagonal_is_one_for_nonzero_vectors() {
    let matrix = SimilarityMatrix::build(&toy_vectors());
    for i in 0..3 {
      assert!((matrix.get(i, i) - 1.0).abs() < 1e-6);
    }
  }

  #[test]
  fn zero_vector_diagonal_is_zero() {
    let matrix = SimilarityMatrix::build(&toy_vectors());
    assert_eq!(matrix.get(3, 3), 0.0);
  }

  #[test]
  fn related_items_score_higher_than_unrelated() {
    let matrix = SimilarityMatrix::build(&toy_vectors());
    assert!(matrix.get(0, 1) > matrix.get(0, 2));
  }

  #[test]
  fn entries_stay_within_unit_interval() {
    let matrix = SimilarityMatrix::build(&toy_vectors());
    for i in 0..matrix.len() {
      for j in 0..matrix.len() {
        let value = matrix.get(i, j);
        assert!((-1e-6..=1.0 + 1e-6).contains(&value));
      }
    }
  }

  #[test]
  fn query_row_matches_full_matrix_row() {
    let vectors = toy_vectors();
    let matrix = SimilarityMatrix::build(&vectors);
    for index in 0..vectors.len() {
      let row = SimilarityMatrix::query_row(&vectors, index);
      for (j, value) in row.iter().enumerate() {
        assert!((value - matrix.get(index, j)).abs() < 1e-6);
      }
    }
  }

  #[test]
  fn dense_round_trip_preserves_entries() {
    let matrix = SimilarityMatrix::build(&toy_vectors());
    let (rows, values) = matrix.to_dense();
    let restored = SimilarityMatrix::from_dense(rows, values).unwrap();
    for i in 0..matrix.len() {
      for j in 0..matrix.len() {
        assert_eq!(matrix.get(i, j), restored.get(i, j));
      }
    }
  }

  #[test]
  fn from_dense_rejects_truncated_payload() {
    let result = SimilarityMatrix::from_dense(2, vec![1.0, 0.0, 0.0]);
    assert!(result.is_err());
  }
}
