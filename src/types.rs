use serde::Serialize;

use super::catalog::Item;

/// A single ranked entry in a recommendation response.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
  pub title: String,
  pub genres: Vec<String>,
  pub score: Option<f32>,
  pub kind: String,
  pub similarity: f32
}

impl Recommendation {
  pub fn new(
    title: String, genres: Vec<String>, score: Option<f32>,
    kind: String, similarity: f32
  ) -> Self {
    Self { title, genres, score, kind, similarity }
  }
}

impl From<(&Item, f32)> for Recommendation {
  fn from((item, similarity): (&Item, f32)) -> Self {
    Recommendation::new(
      item.title.clone(),
      item.genres.clone(),
      item.score,
      item.kind.clone(),
      similarity
    )
  }
}
