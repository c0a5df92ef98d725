use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommendError {
  #[error("corpus is empty or produced no vocabulary")]
  EmptyCorpus,
  #[error("title not found in catalog")]
  NotFound,
  #[error("artifact was fitted on {found} items but catalog has {expected}")]
  CorpusMismatch { expected: usize, found: usize },
  #[error("recommender misconfigured")]
  Uninitialized(#[from] derive_builder::UninitializedFieldError),
  #[error("could not read catalog")]
  Csv(#[from] csv::Error),
  #[error("could not encode or decode artifact")]
  Json(#[from] serde_json::Error),
  #[error("artifact unreachable")]
  Io(#[from] std::io::Error),
}
