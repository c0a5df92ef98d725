use serde::Serialize;

use super::Recommendation;

#[derive(Debug, Serialize)]
pub struct RecommendationList(pub Vec<Recommendation>);

impl RecommendationList {

  /// Sorts descending by similarity. The sort is stable, so entries with
  /// equal scores keep the order they were supplied in.
  pub fn new_with_sort(mut recs: Vec<Recommendation>) -> Self {
    recs.sort_by(|this, other| {
        other.similarity.partial_cmp(&this.similarity)
          .unwrap_or(std::cmp::Ordering::Equal)
      }
    );
    Self(recs)
  }

  pub fn from_iter_with_sort<I>(value: I) -> Self
    where I: IntoIterator,
          I::Item: Into<Recommendation> {
    let recs = value.into_iter()
      .map(|item| item.into())
      .collect::<Vec<Recommendation>>();
    Self::new_with_sort(recs)
  }

  pub fn truncated(mut self, n_items: usize) -> Self {
    self.0.truncate(n_items);
    self
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
    self.0.iter()
  }
}

impl From<RecommendationList> for Vec<Recommendation> {
  fn from(value: RecommendationList) -> Self {
    value.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rec(title: &str, similarity: f32) -> Recommendation {
    Recommendation::new(title.into(), vec![], None, "tv".into(), similarity)
  }

  #[test]
  fn sorts_descending_by_similarity() {
    let list = RecommendationList::new_with_sort(vec![
      rec("low", 0.1), rec("high", 0.9), rec("mid", 0.5)
    ]);
    let titles: Vec<&str> = list.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["high", "mid", "low"]);
  }

  #[test]
  fn ties_keep_input_order() {
    let list = RecommendationList::new_with_sort(vec![
      rec("first", 0.5), rec("second", 0.5), rec("third", 0.5)
    ]);
    let titles: Vec<&str> = list.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
  }

  #[test]
  fn truncates_to_requested_length() {
    let list = RecommendationList::new_with_sort(vec![
      rec("a", 0.3), rec("b", 0.2), rec("c", 0.1)
    ]).truncated(2);
    assert_eq!(list.len(), 2);
  }
}
