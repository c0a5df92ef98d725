use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{Level, span, debug};

use super::error::RecommendError;
use super::similarity::SimilarityMatrix;
use super::vectorizer::TfIdfVectorizer;

/// Row-major dense matrix payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct DenseMatrix {
  pub rows: usize,
  pub values: Vec<f32>,
}

/// Serializable snapshot of the fitted vector-space model and similarity
/// matrix, so a catalog can be served across process runs without refitting.
///
/// The artifact is keyed to corpus order and size at fit time; restoring it
/// against a catalog of a different size fails with `CorpusMismatch`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FittedModel {
  pub vectorizer: TfIdfVectorizer,
  pub matrix: DenseMatrix,
}

impl FittedModel {
  pub fn snapshot(vectorizer: &TfIdfVectorizer, similarity: &SimilarityMatrix) -> Self {
    let (rows, values) = similarity.to_dense();
    Self {
      vectorizer: vectorizer.clone(),
      matrix: DenseMatrix { rows, values },
    }
  }

  /// Validates the artifact against the current catalog size and rebuilds
  /// the in-memory structures.
  pub fn restore(self, catalog_len: usize)
      -> Result<(TfIdfVectorizer, SimilarityMatrix), RecommendError> {
    if self.matrix.rows != catalog_len {
      return Err(RecommendError::CorpusMismatch {
        expected: catalog_len,
        found: self.matrix.rows,
      });
    }
    if self.vectorizer.n_documents() != catalog_len {
      return Err(RecommendError::CorpusMismatch {
        expected: catalog_len,
        found: self.vectorizer.n_documents(),
      });
    }
    let similarity = SimilarityMatrix::from_dense(self.matrix.rows, self.matrix.values)?;
    Ok((self.vectorizer, similarity))
  }

  pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RecommendError> {
    let span = span!(Level::DEBUG, "artifact-save");
    let _guard = span.enter();
    debug!("Writing fitted model artifact");
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), self)?;
    Ok(())
  }

  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RecommendError> {
    let span = span!(Level::DEBUG, "artifact-load");
    let _guard = span.enter();
    debug!("Reading fitted model artifact");
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
  }
}
