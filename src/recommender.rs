use derive_builder::UninitializedFieldError;
use tracing::{Level, span, debug, trace};

use super::{
  Recommender,
  RecommendError,
  RecommendationList
};
use super::catalog::Catalog;
use super::similarity::SimilarityMatrix;
use super::vectorizer::{TfIdfVectorizer, DEFAULT_MAX_FEATURES};

/// Content-based recommender over a fixed catalog snapshot.
///
/// Construction runs the whole batch pipeline (normalize, fit, similarity)
/// to completion; lookups afterwards are pure reads of immutable state.
#[derive(Debug)]
pub struct ContentRecommender {
  catalog: Catalog,
  vectorizer: TfIdfVectorizer,
  similarity: SimilarityMatrix,
}

impl ContentRecommender {
  pub fn builder() -> ContentRecommenderBuilder {
    ContentRecommenderBuilder::default()
  }

  /// Reassembles a recommender from a catalog and previously fitted
  /// artifacts. Fails if the artifacts were built against a corpus of a
  /// different size.
  pub fn from_parts(
    catalog: Catalog,
    vectorizer: TfIdfVectorizer,
    similarity: SimilarityMatrix
  ) -> Result<Self, RecommendError> {
    if similarity.len() != catalog.len() {
      return Err(RecommendError::CorpusMismatch {
        expected: catalog.len(),
        found: similarity.len(),
      });
    }
    if vectorizer.n_documents() != catalog.len() {
      return Err(RecommendError::CorpusMismatch {
        expected: catalog.len(),
        found: vectorizer.n_documents(),
      });
    }
    Ok(Self { catalog, vectorizer, similarity })
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  pub fn vectorizer(&self) -> &TfIdfVectorizer {
    &self.vectorizer
  }

  pub fn similarity(&self) -> &SimilarityMatrix {
    &self.similarity
  }
}

impl Recommender<str> for ContentRecommender {
  /// Ranks every other catalog item by similarity to the query title and
  /// returns the top `n_items`. The result never contains the query item,
  /// its length is `min(n_items, |catalog| - 1)`, and scores are
  /// non-increasing; equal scores keep corpus order.
  fn recommend(&self, title: &str, n_items: u16)
      -> Result<RecommendationList, RecommendError> {
    let span = span!(Level::DEBUG, "content-recommend");
    let _guard = span.enter();
    debug!("Looking up query title");
    let subject = self.catalog.index_of_title(title)
      .ok_or(RecommendError::NotFound)?;
    trace!("Ranking similarity row {}", subject);
    let row = self.similarity.row(subject);
    let recs = RecommendationList::from_iter_with_sort(
      row.iter()
        .enumerate()
        .filter(|(index, _)| *index != subject)
        .map(|(index, &similarity)| (&self.catalog.items()[index], similarity))
    ).truncated(n_items as usize);
    trace!("Returning {} recommendations", recs.len());
    Ok(recs)
  }
}

#[derive(Builder)]
#[builder(name = "ContentRecommenderBuilder", pattern = "owned", public, build_fn(skip))]
#[allow(dead_code)]
pub struct ContentRecommenderArguments {
  catalog: Catalog,
  max_features: usize,
}

impl ContentRecommenderBuilder {
  /// Runs normalization output through the vectorizer fit and the pairwise
  /// similarity pass. Setup failures (empty corpus, no vocabulary) abort
  /// construction; no partial model is returned.
  pub fn build(self) -> Result<ContentRecommender, RecommendError> {
    let span = span!(Level::DEBUG, "recommender-init");
    let _guard = span.enter();
    let catalog = self.catalog
      .ok_or_else(|| UninitializedFieldError::new("catalog"))?;
    let max_features = self.max_features.unwrap_or(DEFAULT_MAX_FEATURES);
    debug!("Fitting vector space model over {} items", catalog.len());
    let blobs = catalog.content_features();
    let vectorizer = TfIdfVectorizer::fit(&blobs, max_features)?;
    let vectors = blobs.iter()
      .map(|blob| vectorizer.transform(blob))
      .collect::<Vec<_>>();
    let similarity = SimilarityMatrix::build(&vectors);
    Ok(ContentRecommender { catalog, vectorizer, similarity })
  }
}
