pub mod catalog;
pub mod error;
pub mod evaluator;
pub mod list;
pub mod persist;
pub mod recommender;
pub mod similarity;
pub mod types;
pub mod vectorizer;

#[macro_use]
extern crate derive_builder;

pub use catalog::{Catalog, Item, RawItem};
pub use error::RecommendError;
pub use evaluator::{precision_at_k, DEFAULT_GENRE_THRESHOLD};
pub use list::RecommendationList;
pub use persist::FittedModel;
pub use recommender::ContentRecommender;
pub use similarity::SimilarityMatrix;
pub use types::Recommendation;
pub use vectorizer::{DocVector, TfIdfVectorizer};

pub trait Recommender<K: ?Sized> {
  fn recommend(&self, item_id: &K, n_items: u16)
      -> Result<RecommendationList, RecommendError>;
}
