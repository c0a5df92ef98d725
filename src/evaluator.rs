use std::collections::HashSet;

use tracing::{Level, span, trace};

use super::RecommendationList;
use super::catalog::Catalog;

pub const DEFAULT_GENRE_THRESHOLD: f32 = 0.6;

/// Precision@K with genre overlap as the relevance criterion.
///
/// A recommended item counts as relevant when at least `genre_threshold` of
/// the query's genres appear in its own genre-set. The result is always in
/// [0, 1] and deterministic for identical inputs.
///
/// By convention the metric is 0.0 rather than an error when no signal is
/// available: the query title is absent from the catalog, or either side
/// carries only the `unknown` genre sentinel (candidates in that state are
/// skipped, not counted).
pub fn precision_at_k(
  catalog: &Catalog,
  query_title: &str,
  recommendations: &RecommendationList,
  k: usize,
  genre_threshold: f32
) -> f32 {
  let span = span!(Level::TRACE, "precision-at-k");
  let _guard = span.enter();
  if k == 0 {
    return 0.0;
  }
  let query = match catalog.find_by_title(query_title) {
    Some(item) => item,
    None => return 0.0,
  };
  if !query.has_genre_signal() {
    return 0.0;
  }
  let query_genres: HashSet<&str> = query.genres.iter()
    .map(String::as_str)
    .collect();
  let mut matches = 0usize;
  for rec in recommendations.iter().take(k) {
    let candidate = match catalog.find_by_title(&rec.title) {
      Some(item) => item,
      None => continue,
    };
    if !candidate.has_genre_signal() {
      continue;
    }
    let shared = candidate.genres.iter()
      .filter(|genre| query_genres.contains(genre.as_str()))
      .count();
    let overlap = shared as f32 / query_genres.len() as f32;
    trace!("Candidate {} overlap {}", candidate.index, overlap);
    if overlap >= genre_threshold {
      matches += 1;
    }
  }
  matches as f32 / k as f32
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Recommendation;
  use crate::catalog::RawItem;

  fn raw(title: &str, genres: &str) -> RawItem {
    RawItem {
      title: Some(title.to_string()),
      genres: Some(genres.to_string()),
      kind: Some("TV".to_string()),
      description: Some("a story".to_string()),
      score: None,
      demographic: None,
      source: None,
      synonyms: None,
      broadcast: None,
    }
  }

  fn recs_for(titles: &[&str]) -> RecommendationList {
    RecommendationList(
      titles.iter()
        .map(|t| Recommendation::new(t.to_string(), vec![], None, "TV".into(), 0.5))
        .collect()
    )
  }

  fn toy_catalog() -> Catalog {
    Catalog::from_raw(vec![
      raw("Query", "action, fantasy"),
      raw("Close Match", "action, fantasy, adventure"),
      raw("Half Match", "action, romance"),
      raw("No Match", "comedy"),
      raw("No Genres", ""),
    ])
  }

  #[test]
  fn counts_candidates_above_threshold() {
    let catalog = toy_catalog();
    let recs = recs_for(&["Close Match", "Half Match", "No Match"]);
    // Close Match overlaps 2/2, Half Match 1/2, No Match 0/2.
    let precision = precision_at_k(&catalog, "Query", &recs, 3, 0.6);
    assert!((precision - 1.0 / 3.0).abs() < 1e-6);
  }

  #[test]
  fn threshold_is_inclusive() {
    let catalog = toy_catalog();
    let recs = recs_for(&["Half Match"]);
    let precision = precision_at_k(&catalog, "Query", &recs, 1, 0.5);
    assert!((precision - 1.0).abs() < 1e-6);
  }

  #[test]
  fn unknown_genre_query_scores_zero() {
    let catalog = toy_catalog();
    let recs = recs_for(&["Close Match", "Half Match"]);
    assert_eq!(precision_at_k(&catalog, "No Genres", &recs, 2, 0.6), 0.0);
  }

  #[test]
  fn missing_query_title_scores_zero_without_error() {
    let catalog = toy_catalog();
    let recs = recs_for(&["Close Match"]);
    assert_eq!(precision_at_k(&catalog, "Not In Catalog", &recs, 1, 0.6), 0.0);
  }

  #[test]
  fn sentinel_genre_candidates_are_skipped() {
    let catalog = toy_catalog();
    let recs = recs_for(&["No Genres", "Close Match"]);
    let precision = precision_at_k(&catalog, "Query", &recs, 2, 0.6);
    assert!((precision - 0.5).abs() < 1e-6);
  }

  #[test]
  fn unresolvable_candidate_titles_are_skipped() {
    let catalog = toy_catalog();
    let recs = recs_for(&["Ghost Title", "Close Match"]);
    let precision = precision_at_k(&catalog, "Query", &recs, 2, 0.6);
    assert!((precision - 0.5).abs() < 1e-6);
  }

  #[test]
  fn result_is_bounded_for_any_inputs() {
    let catalog = toy_catalog();
    let recs = recs_for(&["Close Match", "Half Match", "No Match", "Ghost"]);
    for k in 1..=6 {
      for threshold in [0.0, 0.25, 0.6, 1.0] {
        let precision = precision_at_k(&catalog, "Query", &recs, k, threshold);
        assert!((0.0..=1.0).contains(&precision));
      }
    }
  }

  #[test]
  fn zero_k_scores_zero() {
    let catalog = toy_catalog();
    assert_eq!(precision_at_k(&catalog, "Query", &recs_for(&[]), 0, 0.6), 0.0);
  }
}
